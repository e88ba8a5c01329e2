use std::any::Any;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use kpanel_core::{PanelError, PanelResult};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A type the registry can construct and cache under a stable key.
pub trait Registered: Send + Sync + Sized + 'static {
    const KEY: &'static str;

    /// Build the instance. Dependencies are resolved through `registry`.
    fn create(registry: &Registry) -> PanelResult<Self>;
}

type Entry = Arc<dyn Any + Send + Sync>;
type Building = FxHashSet<(ThreadId, &'static str)>;

/// Keyed lazy-singleton cache.
///
/// One registry is built at startup and passed around explicitly; it is not a
/// process global. Entries are never evicted.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<FxHashMap<&'static str, Entry>>,
    /// Keys under construction, per thread. Only a re-entrant request from the
    /// same thread is a cycle.
    building: Mutex<Building>,
    construction: ConstructionLock,
}

/// Re-entrant lock serialising construction: the owning thread may nest
/// `get` calls, other threads wait until it is done.
#[derive(Default)]
struct ConstructionLock {
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl ConstructionLock {
    fn acquire(&self) -> ConstructionGuard<'_> {
        let me = thread::current().id();
        let mut owner = lock(&self.owner);
        loop {
            let free = match *owner {
                None => true,
                Some((id, _)) => id == me,
            };
            if free {
                break;
            }
            owner = self.released.wait(owner).unwrap_or_else(PoisonError::into_inner);
        }
        *owner = Some(match *owner {
            Some((id, depth)) if id == me => (id, depth + 1),
            _ => (me, 1),
        });
        ConstructionGuard { lock: self }
    }
}

struct ConstructionGuard<'a> {
    lock: &'a ConstructionLock,
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        let mut owner = lock(&self.lock.owner);
        if let Some((id, depth)) = *owner {
            *owner = if depth > 1 { Some((id, depth - 1)) } else { None };
        }
        if owner.is_none() {
            self.lock.released.notify_all();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its key from the in-progress set on drop, panics included.
struct BuildGuard<'a> {
    building: &'a Mutex<Building>,
    key: (ThreadId, &'static str),
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        lock(self.building).remove(&self.key);
    }
}

fn downcast<T: Registered>(entry: Entry) -> PanelResult<Arc<T>> {
    entry.downcast::<T>().map_err(|_| PanelError::Registry {
        key: T::KEY.to_string(),
        message: "key already registered for another type".to_string(),
    })
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// Return the instance for `T`, constructing it on first access.
    ///
    /// Construction runs without the entry lock held so `create` may call
    /// `get` for its own dependencies. A failed construction caches nothing.
    /// Threads racing on a first access wait for one construction and share
    /// its instance.
    pub fn get<T: Registered>(&self) -> PanelResult<Arc<T>> {
        if let Some(entry) = lock(&self.entries).get(T::KEY).cloned() {
            return downcast(entry);
        }
        let _construction = self.construction.acquire();
        if let Some(entry) = lock(&self.entries).get(T::KEY).cloned() {
            return downcast(entry);
        }
        let key = (thread::current().id(), T::KEY);
        if !lock(&self.building).insert(key) {
            return Err(PanelError::Registry {
                key: T::KEY.to_string(),
                message: "dependency cycle during construction".to_string(),
            });
        }
        let guard = BuildGuard { building: &self.building, key };
        debug!(key = T::KEY, "registry: constructing");
        let built = T::create(self);
        drop(guard);
        let instance: Entry = match built {
            Ok(v) => Arc::new(v),
            Err(e @ PanelError::Registry { .. }) => return Err(e),
            Err(e) => return Err(PanelError::Registry { key: T::KEY.to_string(), message: e.to_string() }),
        };
        let entry = Arc::clone(lock(&self.entries).entry(T::KEY).or_insert(instance));
        downcast(entry)
    }

    pub fn contains<T: Registered>(&self) -> bool {
        lock(&self.entries).contains_key(T::KEY)
    }

    pub fn len(&self) -> usize { lock(&self.entries).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
