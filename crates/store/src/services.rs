use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use kpanel_core::{FetchFailure, KubeResourceType, PanelResult, ResourceList, Slice};
use kpanel_flux::{Action, ActionsHub, FetchToken, Registered, Registry, Store, StoreCore};
use kpanel_kubehub::KubeService;

use crate::{run_fetch, FetchOutcome};

pub struct ServicesActions {
    pub services_fetched: Action<ResourceList<Service>>,
    pub fetch_failed: Action<FetchFailure>,
}

impl Registered for ServicesActions {
    const KEY: &'static str = "services-actions";

    fn create(_: &Registry) -> PanelResult<Self> {
        Ok(Self {
            services_fetched: Action::new("services-fetched"),
            fetch_failed: Action::new("services-fetch-failed"),
        })
    }
}

impl ActionsHub for ServicesActions {
    fn action_names(&self) -> &'static [&'static str] { &["services-fetched", "services-fetch-failed"] }
}

pub struct ServicesActionsCreator {
    actions: Arc<ServicesActions>,
}

impl Registered for ServicesActionsCreator {
    const KEY: &'static str = "services-actionscreator";

    fn create(registry: &Registry) -> PanelResult<Self> {
        Ok(Self { actions: registry.get()? })
    }
}

impl ServicesActionsCreator {
    pub async fn get_services(&self, kube: &dyn KubeService, token: &FetchToken) -> FetchOutcome {
        let a = &self.actions;
        run_fetch(KubeResourceType::Services, token, kube.get_services(), &a.services_fetched, &a.fetch_failed).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServicesState {
    pub services: Arc<Slice<Service>>,
}

pub struct ServicesStore {
    core: Arc<StoreCore<ServicesState>>,
}

impl Registered for ServicesStore {
    const KEY: &'static str = "services-store";

    fn create(registry: &Registry) -> PanelResult<Self> {
        let actions: Arc<ServicesActions> = registry.get()?;
        let core = Arc::new(StoreCore::new("services-store", ServicesState::default()));
        core.on(&actions.services_fetched, |_, list| ServicesState {
            services: Arc::new(Slice::Loaded(list.clone())),
        });
        core.on(&actions.fetch_failed, |_, failure| ServicesState {
            services: Arc::new(Slice::Failed(failure.clone())),
        });
        Ok(Self { core })
    }
}

impl Store for ServicesStore {
    type State = ServicesState;

    fn core(&self) -> &StoreCore<ServicesState> { &self.core }
}
