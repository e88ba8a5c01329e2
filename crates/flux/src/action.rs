use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Action::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Typed single-event broadcast channel.
///
/// `invoke` calls every handler subscribed at the time of the call, once, in
/// subscription order, on the calling thread. The same closure subscribed
/// twice gets two ids and is called twice; there is no de-duplication.
pub struct Action<T> {
    name: &'static str,
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Action<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, next_id: AtomicU64::new(1), handlers: Mutex::new(Vec::new()) }
    }

    pub fn name(&self) -> &'static str { self.name }

    fn handlers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Handler<T>)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers().push((id, Arc::new(handler)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.handlers().iter().any(|(h, _)| *h == id)
    }

    pub fn subscriber_count(&self) -> usize { self.handlers().len() }

    /// Fire-and-forget broadcast. No lock is held while handlers run, so a
    /// handler may subscribe, unsubscribe or invoke re-entrantly. Handlers
    /// removed mid-invoke are skipped; handlers added mid-invoke wait for the
    /// next one.
    pub fn invoke(&self, payload: &T) {
        let snapshot: Vec<(SubscriptionId, Handler<T>)> = self.handlers().clone();
        trace!(action = self.name, subscribers = snapshot.len(), "invoke");
        for (id, handler) in snapshot {
            if self.is_subscribed(id) {
                handler(payload);
            }
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
