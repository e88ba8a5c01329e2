//! kpanel core types: resource kinds, fetched lists, view rows and selections.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod image;

pub use config::PanelConfig;
pub use error::{PanelError, PanelResult};

pub mod prelude {
    pub use super::{
        FetchFailure, ImageDetails, KubeResourceType, ResourceList, SelectedItem, SelectedItemKind,
        SelectionPayload, Slice, ViewRow, WorkloadKind, WorkloadPayload,
    };
    pub use super::error::{PanelError, PanelResult};
}

/// Resource kinds the panel knows how to fetch and filter on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KubeResourceType {
    StatefulSets,
    DaemonSets,
    ReplicaSets,
    Pods,
    Services,
}

impl KubeResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatefulSets => "statefulsets",
            Self::DaemonSets => "daemonsets",
            Self::ReplicaSets => "replicasets",
            Self::Pods => "pods",
            Self::Services => "services",
        }
    }
}

impl fmt::Display for KubeResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KubeResourceType {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "statefulsets" | "statefulset" | "sts" => Ok(Self::StatefulSets),
            "daemonsets" | "daemonset" | "ds" => Ok(Self::DaemonSets),
            "replicasets" | "replicaset" | "rs" => Ok(Self::ReplicaSets),
            "pods" | "pod" | "po" => Ok(Self::Pods),
            "services" | "service" | "svc" => Ok(Self::Services),
            other => Err(PanelError::Config(format!("unknown resource type: {}", other))),
        }
    }
}

/// Discriminant of a row in the other-workloads table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    StatefulSet,
    DaemonSet,
    ReplicaSet,
}

impl WorkloadKind {
    /// Fixed grouping order of rows.
    pub const ORDER: [WorkloadKind; 3] = [Self::StatefulSet, Self::DaemonSet, Self::ReplicaSet];

    pub fn resource_type(self) -> KubeResourceType {
        match self {
            Self::StatefulSet => KubeResourceType::StatefulSets,
            Self::DaemonSet => KubeResourceType::DaemonSets,
            Self::ReplicaSet => KubeResourceType::ReplicaSets,
        }
    }

    pub fn selected_kind(self) -> SelectedItemKind {
        match self {
            Self::StatefulSet => SelectedItemKind::StatefulSet,
            Self::DaemonSet => SelectedItemKind::DaemonSet,
            Self::ReplicaSet => SelectedItemKind::ReplicaSet,
        }
    }

    /// Human label shown under the row name.
    pub fn label(self) -> &'static str {
        match self {
            Self::StatefulSet => "Stateful set",
            Self::DaemonSet => "Daemon set",
            Self::ReplicaSet => "Replica set",
        }
    }
}

/// What the selection sink is being asked to show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SelectedItemKind {
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    ImageDetails,
}

impl SelectedItemKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::StatefulSet => "statefulset-key",
            Self::DaemonSet => "daemonset-key",
            Self::ReplicaSet => "replicaset-key",
            Self::ImageDetails => "image-details-key",
        }
    }
}

/// Result of one list call for a resource kind. Arrives whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceList<T> {
    pub items: Vec<T>,
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self { Self { items: Vec::new() } }
}

impl<T> From<Vec<T>> for ResourceList<T> {
    fn from(items: Vec<T>) -> Self { Self { items } }
}

impl<T> ResourceList<T> {
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// A fetch that did not produce a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: KubeResourceType,
    pub message: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.kind, self.message)
    }
}

/// Per-kind store slot. Keeps "never fetched", "fetched" and "failed" apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice<T> {
    NotFetched,
    Loaded(ResourceList<T>),
    Failed(FetchFailure),
}

impl<T> Default for Slice<T> {
    fn default() -> Self { Self::NotFetched }
}

impl<T> Slice<T> {
    /// Items of a loaded slice; empty otherwise.
    pub fn items(&self) -> &[T] {
        match self {
            Self::Loaded(list) => &list.items,
            _ => &[],
        }
    }

    pub fn is_loaded(&self) -> bool { matches!(self, Self::Loaded(_)) }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Raw source object of a row, kept for selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "object")]
pub enum WorkloadPayload {
    StatefulSet(Box<StatefulSet>),
    DaemonSet(Box<DaemonSet>),
    ReplicaSet(Box<ReplicaSet>),
}

impl WorkloadPayload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Self::StatefulSet(_) => WorkloadKind::StatefulSet,
            Self::DaemonSet(_) => WorkloadKind::DaemonSet,
            Self::ReplicaSet(_) => WorkloadKind::ReplicaSet,
        }
    }
}

/// Render-ready record unifying the workload kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewRow {
    pub name: String,
    pub uid: String,
    pub kind: WorkloadKind,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub image_id: String,
    pub image_display_text: String,
    pub image_tooltip: Option<String>,
    pub desired_count: i32,
    pub current_count: i32,
    pub payload: WorkloadPayload,
}

/// Detail payload returned by an image service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImageDetails {
    pub image_id: String,
    pub image_name: String,
    pub registry: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SelectedItem {
    Workload(WorkloadPayload),
    ImageDetails(ImageDetails),
}

/// The single current selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionPayload {
    /// None for image-details stubs when no image service answered.
    pub item: Option<SelectedItem>,
    pub item_uid: String,
    pub show_selected_item: bool,
    pub selected_item_type: SelectedItemKind,
}

impl SelectionPayload {
    pub fn for_row(row: &ViewRow) -> Self {
        Self {
            item: Some(SelectedItem::Workload(row.payload.clone())),
            item_uid: row.uid.clone(),
            show_selected_item: true,
            selected_item_type: row.kind.selected_kind(),
        }
    }

    pub fn for_image(item_uid: &str, details: Option<ImageDetails>) -> Self {
        Self {
            item: details.map(SelectedItem::ImageDetails),
            item_uid: item_uid.to_string(),
            show_selected_item: true,
            selected_item_type: SelectedItemKind::ImageDetails,
        }
    }
}
