//! StatefulSets, DaemonSets and ReplicaSets.

use std::sync::Arc;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use kpanel_core::{FetchFailure, KubeResourceType, PanelResult, ResourceList, Slice};
use kpanel_flux::{Action, ActionsHub, FetchToken, Registered, Registry, Store, StoreCore};
use kpanel_kubehub::KubeService;
use tracing::debug;

use crate::{run_fetch, FetchOutcome};

pub struct WorkloadsActions {
    pub stateful_sets_fetched: Action<ResourceList<StatefulSet>>,
    pub daemon_sets_fetched: Action<ResourceList<DaemonSet>>,
    pub replica_sets_fetched: Action<ResourceList<ReplicaSet>>,
    pub fetch_failed: Action<FetchFailure>,
}

impl Registered for WorkloadsActions {
    const KEY: &'static str = "workloads-actions";

    fn create(_: &Registry) -> PanelResult<Self> {
        Ok(Self {
            stateful_sets_fetched: Action::new("stateful-sets-fetched"),
            daemon_sets_fetched: Action::new("daemon-sets-fetched"),
            replica_sets_fetched: Action::new("replica-sets-fetched"),
            fetch_failed: Action::new("workloads-fetch-failed"),
        })
    }
}

impl ActionsHub for WorkloadsActions {
    fn action_names(&self) -> &'static [&'static str] {
        &["stateful-sets-fetched", "daemon-sets-fetched", "replica-sets-fetched", "workloads-fetch-failed"]
    }
}

pub struct WorkloadsActionsCreator {
    actions: Arc<WorkloadsActions>,
}

impl Registered for WorkloadsActionsCreator {
    const KEY: &'static str = "workloads-actionscreator";

    fn create(registry: &Registry) -> PanelResult<Self> {
        Ok(Self { actions: registry.get()? })
    }
}

impl WorkloadsActionsCreator {
    pub async fn get_stateful_sets(&self, kube: &dyn KubeService, token: &FetchToken) -> FetchOutcome {
        let a = &self.actions;
        run_fetch(KubeResourceType::StatefulSets, token, kube.get_stateful_sets(), &a.stateful_sets_fetched, &a.fetch_failed).await
    }

    pub async fn get_daemon_sets(&self, kube: &dyn KubeService, token: &FetchToken) -> FetchOutcome {
        let a = &self.actions;
        run_fetch(KubeResourceType::DaemonSets, token, kube.get_daemon_sets(), &a.daemon_sets_fetched, &a.fetch_failed).await
    }

    pub async fn get_replica_sets(&self, kube: &dyn KubeService, token: &FetchToken) -> FetchOutcome {
        let a = &self.actions;
        run_fetch(KubeResourceType::ReplicaSets, token, kube.get_replica_sets(), &a.replica_sets_fetched, &a.fetch_failed).await
    }
}

/// Three independent slices; each starts `NotFetched`.
#[derive(Debug, Clone, Default)]
pub struct WorkloadsState {
    pub stateful_sets: Arc<Slice<StatefulSet>>,
    pub daemon_sets: Arc<Slice<DaemonSet>>,
    pub replica_sets: Arc<Slice<ReplicaSet>>,
}

impl WorkloadsState {
    /// Failures recorded for any slice, in fixed kind order.
    pub fn failures(&self) -> Vec<&FetchFailure> {
        [self.stateful_sets.failure(), self.daemon_sets.failure(), self.replica_sets.failure()]
            .into_iter()
            .flatten()
            .collect()
    }
}

pub struct WorkloadsStore {
    core: Arc<StoreCore<WorkloadsState>>,
}

impl Registered for WorkloadsStore {
    const KEY: &'static str = "workloads-store";

    fn create(registry: &Registry) -> PanelResult<Self> {
        let actions: Arc<WorkloadsActions> = registry.get()?;
        let core = Arc::new(StoreCore::new("workloads-store", WorkloadsState::default()));

        core.on(&actions.stateful_sets_fetched, |s, list| WorkloadsState {
            stateful_sets: Arc::new(Slice::Loaded(list.clone())),
            ..s.clone()
        });
        core.on(&actions.daemon_sets_fetched, |s, list| WorkloadsState {
            daemon_sets: Arc::new(Slice::Loaded(list.clone())),
            ..s.clone()
        });
        core.on(&actions.replica_sets_fetched, |s, list| WorkloadsState {
            replica_sets: Arc::new(Slice::Loaded(list.clone())),
            ..s.clone()
        });
        // The latest outcome wins: a failed refetch replaces earlier data.
        core.on(&actions.fetch_failed, |s, failure| {
            let mut next = s.clone();
            match failure.kind {
                KubeResourceType::StatefulSets => next.stateful_sets = Arc::new(Slice::Failed(failure.clone())),
                KubeResourceType::DaemonSets => next.daemon_sets = Arc::new(Slice::Failed(failure.clone())),
                KubeResourceType::ReplicaSets => next.replica_sets = Arc::new(Slice::Failed(failure.clone())),
                other => debug!(kind = %other, "workloads store: ignoring failure for foreign kind"),
            }
            next
        });

        Ok(Self { core })
    }
}

impl Store for WorkloadsStore {
    type State = WorkloadsState;

    fn core(&self) -> &StoreCore<WorkloadsState> { &self.core }
}
