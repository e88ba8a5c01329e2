//! In-memory collaborators for tests and demos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Pod, Service};
use kpanel_core::{ImageDetails, KubeResourceType, PanelError, PanelResult, ResourceList};
use rustc_hash::FxHashMap;

use crate::{ImageService, KubeService};

/// Canned lists, per-kind failures and per-kind delays.
#[derive(Default)]
pub struct MockKubeService {
    pub services: Vec<Service>,
    pub stateful_sets: Vec<StatefulSet>,
    pub daemon_sets: Vec<DaemonSet>,
    pub replica_sets: Vec<ReplicaSet>,
    pub pods: Vec<Pod>,
    pub failures: FxHashMap<KubeResourceType, String>,
    pub delays: FxHashMap<KubeResourceType, Duration>,
    calls: Mutex<Vec<KubeResourceType>>,
}

impl MockKubeService {
    pub fn new() -> Self { Self::default() }

    pub fn with_services(mut self, items: Vec<Service>) -> Self {
        self.services = items;
        self
    }

    pub fn with_stateful_sets(mut self, items: Vec<StatefulSet>) -> Self {
        self.stateful_sets = items;
        self
    }

    pub fn with_daemon_sets(mut self, items: Vec<DaemonSet>) -> Self {
        self.daemon_sets = items;
        self
    }

    pub fn with_replica_sets(mut self, items: Vec<ReplicaSet>) -> Self {
        self.replica_sets = items;
        self
    }

    pub fn with_pods(mut self, items: Vec<Pod>) -> Self {
        self.pods = items;
        self
    }

    pub fn fail(mut self, kind: KubeResourceType, message: &str) -> Self {
        self.failures.insert(kind, message.to_string());
        self
    }

    pub fn delay(mut self, kind: KubeResourceType, by: Duration) -> Self {
        self.delays.insert(kind, by);
        self
    }

    /// Kinds requested so far, in call order.
    pub fn calls(&self) -> Vec<KubeResourceType> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn answer<T: Clone + Send + Sync>(&self, kind: KubeResourceType, items: &[T]) -> PanelResult<ResourceList<T>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(kind);
        }
        if let Some(d) = self.delays.get(&kind) {
            tokio::time::sleep(*d).await;
        }
        if let Some(message) = self.failures.get(&kind) {
            return Err(PanelError::Fetch { kind, message: message.clone() });
        }
        Ok(ResourceList { items: items.to_vec() })
    }
}

#[async_trait::async_trait]
impl KubeService for MockKubeService {
    async fn get_services(&self) -> PanelResult<ResourceList<Service>> {
        self.answer(KubeResourceType::Services, &self.services).await
    }

    async fn get_stateful_sets(&self) -> PanelResult<ResourceList<StatefulSet>> {
        self.answer(KubeResourceType::StatefulSets, &self.stateful_sets).await
    }

    async fn get_daemon_sets(&self) -> PanelResult<ResourceList<DaemonSet>> {
        self.answer(KubeResourceType::DaemonSets, &self.daemon_sets).await
    }

    async fn get_replica_sets(&self) -> PanelResult<ResourceList<ReplicaSet>> {
        self.answer(KubeResourceType::ReplicaSets, &self.replica_sets).await
    }

    async fn get_pods(&self) -> PanelResult<ResourceList<Pod>> {
        self.answer(KubeResourceType::Pods, &self.pods).await
    }
}

/// Image service answering from a fixed map.
#[derive(Default)]
pub struct MockImageService {
    pub details: FxHashMap<String, ImageDetails>,
    pub fail_with: Option<String>,
    lookups: AtomicUsize,
}

impl MockImageService {
    pub fn with_details(details: Vec<ImageDetails>) -> Self {
        Self {
            details: details.into_iter().map(|d| (d.image_id.clone(), d)).collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize { self.lookups.load(Ordering::SeqCst) }
}

#[async_trait::async_trait]
impl ImageService for MockImageService {
    async fn has_image_details(&self, image_ids: &[String]) -> PanelResult<FxHashMap<String, bool>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(m) = &self.fail_with {
            return Err(PanelError::Image(m.clone()));
        }
        Ok(image_ids.iter().map(|id| (id.clone(), self.details.contains_key(id))).collect())
    }

    async fn get_image_details(&self, image_id: &str) -> PanelResult<Option<ImageDetails>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(m) = &self.fail_with {
            return Err(PanelError::Image(m.clone()));
        }
        Ok(self.details.get(image_id).cloned())
    }
}
