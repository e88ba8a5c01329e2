//! Pod list, read by the row builder to resolve running image digests.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kpanel_core::{FetchFailure, KubeResourceType, PanelResult, ResourceList, Slice};
use kpanel_flux::{Action, ActionsHub, FetchToken, Registered, Registry, Store, StoreCore};
use kpanel_kubehub::KubeService;

use crate::{run_fetch, FetchOutcome};

pub struct PodsActions {
    pub pods_fetched: Action<ResourceList<Pod>>,
    pub fetch_failed: Action<FetchFailure>,
}

impl Registered for PodsActions {
    const KEY: &'static str = "pods-actions";

    fn create(_: &Registry) -> PanelResult<Self> {
        Ok(Self { pods_fetched: Action::new("pods-fetched"), fetch_failed: Action::new("pods-fetch-failed") })
    }
}

impl ActionsHub for PodsActions {
    fn action_names(&self) -> &'static [&'static str] { &["pods-fetched", "pods-fetch-failed"] }
}

pub struct PodsActionsCreator {
    actions: Arc<PodsActions>,
}

impl Registered for PodsActionsCreator {
    const KEY: &'static str = "pods-actionscreator";

    fn create(registry: &Registry) -> PanelResult<Self> {
        Ok(Self { actions: registry.get()? })
    }
}

impl PodsActionsCreator {
    pub async fn get_pods(&self, kube: &dyn KubeService, token: &FetchToken) -> FetchOutcome {
        let a = &self.actions;
        run_fetch(KubeResourceType::Pods, token, kube.get_pods(), &a.pods_fetched, &a.fetch_failed).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct PodsState {
    pub pods: Arc<Slice<Pod>>,
}

pub struct PodsStore {
    core: Arc<StoreCore<PodsState>>,
}

impl Registered for PodsStore {
    const KEY: &'static str = "pods-store";

    fn create(registry: &Registry) -> PanelResult<Self> {
        let actions: Arc<PodsActions> = registry.get()?;
        let core = Arc::new(StoreCore::new("pods-store", PodsState::default()));
        core.on(&actions.pods_fetched, |_, list| PodsState { pods: Arc::new(Slice::Loaded(list.clone())) });
        core.on(&actions.fetch_failed, |_, failure| PodsState { pods: Arc::new(Slice::Failed(failure.clone())) });
        Ok(Self { core })
    }
}

impl Store for PodsStore {
    type State = PodsState;

    fn core(&self) -> &StoreCore<PodsState> { &self.core }
}
