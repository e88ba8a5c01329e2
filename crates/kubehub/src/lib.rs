//! kpanel kubehub: the asynchronous collaborators the action creators call.
//!
//! `KubeService` lists resources, `ImageService` answers image-detail
//! questions. `KubeClientService` and `DigestImageService` are the live
//! implementations; `mock` holds in-memory ones for tests.

#![forbid(unsafe_code)]

use std::fmt::Debug;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kpanel_core::{ImageDetails, KubeResourceType, PanelConfig, PanelError, PanelResult, ResourceList};
use kube::{
    api::{Api, ListParams},
    Client, Resource, ResourceExt,
};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub mod mock;

/// Lists the resource kinds the panel displays.
#[async_trait::async_trait]
pub trait KubeService: Send + Sync {
    async fn get_services(&self) -> PanelResult<ResourceList<Service>>;
    async fn get_stateful_sets(&self) -> PanelResult<ResourceList<StatefulSet>>;
    async fn get_daemon_sets(&self) -> PanelResult<ResourceList<DaemonSet>>;
    async fn get_replica_sets(&self) -> PanelResult<ResourceList<ReplicaSet>>;
    async fn get_pods(&self) -> PanelResult<ResourceList<Pod>>;
}

/// Optional image metadata backend.
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// For each id, whether details can be shown.
    async fn has_image_details(&self, image_ids: &[String]) -> PanelResult<FxHashMap<String, bool>>;

    async fn get_image_details(&self, image_id: &str) -> PanelResult<Option<ImageDetails>>;
}

// ----------------- kube-rs implementation -----------------

/// `KubeService` backed by a kube-rs client.
#[derive(Clone)]
pub struct KubeClientService {
    client: Client,
    namespace: Option<String>,
    timeout: Duration,
}

impl KubeClientService {
    pub fn new(client: Client, namespace: Option<String>, timeout: Duration) -> Self {
        Self { client, namespace, timeout }
    }

    /// Connect using the ambient kubeconfig / in-cluster config.
    pub async fn try_default(cfg: &PanelConfig) -> Result<Self> {
        let client = Client::try_default().await.context("building kube client")?;
        info!(ns = %cfg.namespace.as_deref().unwrap_or("(all)"), timeout_secs = cfg.fetch_timeout.as_secs(), "kube client ready");
        Ok(Self::new(client, cfg.namespace.clone(), cfg.fetch_timeout))
    }

    pub fn namespace(&self) -> Option<&str> { self.namespace.as_deref() }

    fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        match self.namespace.as_deref() {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    async fn list<K>(&self, kind: KubeResourceType) -> PanelResult<ResourceList<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + 'static,
    {
        let t0 = Instant::now();
        let api = self.api::<K>();
        let list = match tokio::time::timeout(self.timeout, api.list(&ListParams::default())).await {
            Ok(Ok(list)) => list,
            Ok(Err(e)) => {
                warn!(kind = %kind, error = %e, "kube: list failed");
                return Err(PanelError::Fetch { kind, message: e.to_string() });
            }
            Err(_) => {
                warn!(kind = %kind, timeout_secs = self.timeout.as_secs(), "kube: list timed out");
                return Err(PanelError::Timeout { kind, secs: self.timeout.as_secs() });
            }
        };
        let mut items = list.items;
        for item in items.iter_mut() {
            strip_managed_fields(item);
        }
        info!(kind = %kind, count = items.len(), took_ms = %t0.elapsed().as_millis(), "kube: list ok");
        Ok(ResourceList { items })
    }
}

fn strip_managed_fields<K: Resource>(obj: &mut K) {
    obj.meta_mut().managed_fields = None;
}

#[async_trait::async_trait]
impl KubeService for KubeClientService {
    async fn get_services(&self) -> PanelResult<ResourceList<Service>> {
        self.list(KubeResourceType::Services).await
    }

    async fn get_stateful_sets(&self) -> PanelResult<ResourceList<StatefulSet>> {
        self.list(KubeResourceType::StatefulSets).await
    }

    async fn get_daemon_sets(&self) -> PanelResult<ResourceList<DaemonSet>> {
        self.list(KubeResourceType::DaemonSets).await
    }

    async fn get_replica_sets(&self) -> PanelResult<ResourceList<ReplicaSet>> {
        let list = self.list::<ReplicaSet>(KubeResourceType::ReplicaSets).await?;
        let owned = list.items.iter().filter(|rs| !rs.owner_references().is_empty()).count();
        debug!(total = list.items.len(), owned, "kube: replicasets listed");
        Ok(list)
    }

    async fn get_pods(&self) -> PanelResult<ResourceList<Pod>> {
        self.list(KubeResourceType::Pods).await
    }
}

// ----------------- image reference parsing -----------------

/// Split an image id such as `reg.io/team/app@sha256:..` or `app:1.2` into
/// details. Registry is the first path segment when it looks like a host.
pub fn parse_image_reference(image_id: &str) -> ImageDetails {
    let (name_part, digest) = match image_id.split_once('@') {
        Some((n, d)) => (n, Some(d)),
        None => (image_id, None),
    };
    // a ':' after the last '/' is a tag, before it a registry port
    let last_slash = name_part.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (repo, tag) = match name_part[last_slash..].rfind(':') {
        Some(i) => (&name_part[..last_slash + i], Some(&name_part[last_slash + i + 1..])),
        None => (name_part, None),
    };
    let (registry, image_name) = match repo.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            (Some(first.to_string()), rest.to_string())
        }
        _ => (None, repo.to_string()),
    };
    let mut tags = Vec::new();
    if let Some(t) = tag.filter(|t| !t.is_empty()) {
        tags.push(t.to_string());
    }
    if let Some(d) = digest.filter(|d| !d.is_empty()) {
        tags.push(d.to_string());
    }
    ImageDetails { image_id: image_id.to_string(), image_name, registry, tags }
}

/// Image service that derives details from the image reference alone. Only
/// digest-pinned ids (resolved from running pods) report details.
#[derive(Debug, Clone, Default)]
pub struct DigestImageService;

impl DigestImageService {
    pub fn new() -> Self { Self }

    fn is_pinned(image_id: &str) -> bool { image_id.contains("@sha256:") }
}

#[async_trait::async_trait]
impl ImageService for DigestImageService {
    async fn has_image_details(&self, image_ids: &[String]) -> PanelResult<FxHashMap<String, bool>> {
        Ok(image_ids.iter().map(|id| (id.clone(), Self::is_pinned(id))).collect())
    }

    async fn get_image_details(&self, image_id: &str) -> PanelResult<Option<ImageDetails>> {
        if !Self::is_pinned(image_id) {
            return Ok(None);
        }
        Ok(Some(parse_image_reference(image_id)))
    }
}
