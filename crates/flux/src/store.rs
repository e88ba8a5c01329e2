use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use crate::{Action, SubscriptionId};

/// State holder shared by every store: an atomically swapped snapshot plus
/// the store's own change action.
///
/// Readers get immutable `Arc` snapshots. State only changes through reducers
/// bound to an upstream action with [`StoreCore::on`]; there is no public
/// setter.
///
/// ```compile_fail
/// use kpanel_flux::StoreCore;
/// let core = StoreCore::new("counter", 0u32);
/// core.update(|n| n + 1);
/// ```
pub struct StoreCore<S> {
    name: &'static str,
    state: ArcSwap<S>,
    changed: Action<()>,
}

impl<S> StoreCore<S> {
    pub fn new(name: &'static str, initial: S) -> Self {
        Self { name, state: ArcSwap::from_pointee(initial), changed: Action::new(name) }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn state(&self) -> Arc<S> { self.state.load_full() }

    /// Replace the state with `f(current)` and signal listeners (no payload).
    fn update<F>(&self, mut f: F)
    where
        F: FnMut(&S) -> S,
    {
        self.state.rcu(|cur| f(cur));
        trace!(store = self.name, "state changed");
        self.changed.invoke(&());
    }

    /// Run `reducer` on every `action` payload and publish the result.
    pub fn on<P, F>(self: &Arc<Self>, action: &Action<P>, reducer: F) -> SubscriptionId
    where
        S: Send + Sync + 'static,
        P: 'static,
        F: Fn(&S, &P) -> S + Send + Sync + 'static,
    {
        let core = Arc::clone(self);
        action.subscribe(move |payload| core.update(|s| reducer(s, payload)))
    }

    pub fn add_listener<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.changed.subscribe(listener)
    }

    pub fn remove_listener(&self, id: SubscriptionId) -> bool { self.changed.unsubscribe(id) }

    pub fn listener_count(&self) -> usize { self.changed.subscriber_count() }
}

/// Sole owner of one feature's state.
pub trait Store: Send + Sync {
    type State;

    fn core(&self) -> &StoreCore<Self::State>;

    fn state(&self) -> Arc<Self::State> { self.core().state() }

    fn add_listener<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&()) + Send + Sync + 'static,
        Self: Sized,
    {
        self.core().add_listener(listener)
    }

    fn remove_listener(&self, id: SubscriptionId) -> bool { self.core().remove_listener(id) }

    fn listener_count(&self) -> usize { self.core().listener_count() }
}
