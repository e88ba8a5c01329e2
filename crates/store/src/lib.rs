//! kpanel store: per-feature action hubs, action creators and stores.
//!
//! Each feature follows the same shape: a hub of actions, a creator that is
//! the only caller of the async collaborators, and a store that owns state
//! and mutates it only inside hub action handlers.

#![forbid(unsafe_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use kpanel_core::{FetchFailure, KubeResourceType, PanelResult, ResourceList};
use kpanel_flux::{Action, FetchToken, Registry};
use tracing::{debug, info, warn};

pub mod images;
pub mod pods;
pub mod selection;
pub mod services;
pub mod workloads;

pub use images::{ImageDetailsActions, ImageDetailsActionsCreator, ImageDetailsState, ImageDetailsStore};
pub use pods::{PodsActions, PodsActionsCreator, PodsState, PodsStore};
pub use selection::{SelectionActions, SelectionActionsCreator, SelectionStore};
pub use services::{ServicesActions, ServicesActionsCreator, ServicesState, ServicesStore};
pub use workloads::{WorkloadsActions, WorkloadsActionsCreator, WorkloadsState, WorkloadsStore};

/// What happened to one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { items: usize },
    Failed,
    /// Completed after its consumer detached; nothing was dispatched.
    Stale,
}

/// Await `fetch` and turn the result into exactly one action (or none when the
/// token went stale).
pub(crate) async fn run_fetch<T, F>(
    kind: KubeResourceType,
    token: &FetchToken,
    fetch: F,
    fetched: &Action<ResourceList<T>>,
    failed: &Action<FetchFailure>,
) -> FetchOutcome
where
    F: Future<Output = PanelResult<ResourceList<T>>>,
{
    let t0 = Instant::now();
    let res = fetch.await;
    if !token.is_current() {
        debug!(kind = %kind, "fetch completed after consumer detached; dropped");
        metrics::counter!("kpanel_fetch_total", 1u64, "kind" => kind.as_str(), "outcome" => "stale");
        return FetchOutcome::Stale;
    }
    match res {
        Ok(list) => {
            let items = list.items.len();
            info!(kind = %kind, items, took_ms = %t0.elapsed().as_millis(), "fetch ok");
            metrics::counter!("kpanel_fetch_total", 1u64, "kind" => kind.as_str(), "outcome" => "ok");
            fetched.invoke(&list);
            FetchOutcome::Applied { items }
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, "fetch failed");
            metrics::counter!("kpanel_fetch_total", 1u64, "kind" => kind.as_str(), "outcome" => "failed");
            failed.invoke(&FetchFailure { kind, message: e.to_string() });
            FetchOutcome::Failed
        }
    }
}

/// Every creator and store of the panel, resolved once from a registry and
/// passed to views explicitly.
#[derive(Clone)]
pub struct PanelContext {
    pub workloads_creator: Arc<WorkloadsActionsCreator>,
    pub workloads_store: Arc<WorkloadsStore>,
    pub pods_creator: Arc<PodsActionsCreator>,
    pub pods_store: Arc<PodsStore>,
    pub services_creator: Arc<ServicesActionsCreator>,
    pub services_store: Arc<ServicesStore>,
    pub selection_creator: Arc<SelectionActionsCreator>,
    pub selection_store: Arc<SelectionStore>,
    pub images_creator: Arc<ImageDetailsActionsCreator>,
    pub images_store: Arc<ImageDetailsStore>,
}

impl PanelContext {
    pub fn new(registry: &Registry) -> PanelResult<Self> {
        let ctx = Self {
            workloads_creator: registry.get()?,
            workloads_store: registry.get()?,
            pods_creator: registry.get()?,
            pods_store: registry.get()?,
            services_creator: registry.get()?,
            services_store: registry.get()?,
            selection_creator: registry.get()?,
            selection_store: registry.get()?,
            images_creator: registry.get()?,
            images_store: registry.get()?,
        };
        debug!(entries = registry.len(), "panel context ready");
        Ok(ctx)
    }
}
