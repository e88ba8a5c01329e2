//! kpanel flux: a small unidirectional data flow engine.
//!
//! Actions broadcast payloads to subscribers synchronously, stores own state
//! and re-broadcast a change signal, the registry hands out one instance per
//! hub/store/creator type.

#![forbid(unsafe_code)]

mod action;
mod liveness;
mod registry;
mod store;

pub use action::{Action, Handler, SubscriptionId};
pub use liveness::{FetchToken, Liveness};
pub use registry::{Registered, Registry};
pub use store::{Store, StoreCore};

/// A fixed bundle of actions for one feature. Holds no business state.
pub trait ActionsHub: Registered {
    /// Names of the actions this hub exposes, in declaration order.
    fn action_names(&self) -> &'static [&'static str];
}

pub mod prelude {
    pub use super::{Action, ActionsHub, FetchToken, Liveness, Registered, Registry, Store, StoreCore, SubscriptionId};
}
