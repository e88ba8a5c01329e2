//! Merge workload lists into one ordered list of rows.
//!
//! Rows are grouped by kind in [`WorkloadKind::ORDER`] and keep source order
//! within a kind. Nothing here holds state: identical inputs give identical
//! output.

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kpanel_core::image::{first_image_name, image_id, image_text};
use kpanel_core::{KubeResourceType, ViewRow, WorkloadKind, WorkloadPayload};
use kpanel_store::{PodsState, WorkloadsState};

/// Snapshot borrowed from the stores for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregationInput<'a> {
    pub stateful_sets: &'a [StatefulSet],
    pub daemon_sets: &'a [DaemonSet],
    pub replica_sets: &'a [ReplicaSet],
    pub pods: &'a [Pod],
    /// Empty shows every kind.
    pub type_filter: &'a [KubeResourceType],
}

impl<'a> AggregationInput<'a> {
    pub fn from_states(workloads: &'a WorkloadsState, pods: &'a PodsState, type_filter: &'a [KubeResourceType]) -> Self {
        Self {
            stateful_sets: workloads.stateful_sets.items(),
            daemon_sets: workloads.daemon_sets.items(),
            replica_sets: workloads.replica_sets.items(),
            pods: pods.pods.items(),
            type_filter,
        }
    }
}

/// Rows of one pass plus the image ids they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<ViewRow>,
    /// First-seen order, unique ignoring ASCII case, empty ids left out.
    pub image_ids: Vec<String>,
}

pub fn show_kind(type_filter: &[KubeResourceType], kind: WorkloadKind) -> bool {
    type_filter.is_empty() || type_filter.contains(&kind.resource_type())
}

/// A ReplicaSet with no owning controller. A missing owner list counts as empty.
pub fn is_standalone(rs: &ReplicaSet) -> bool {
    rs.metadata.owner_references.as_ref().map_or(true, |o| o.is_empty())
}

/// Fields every kind contributes to a row.
struct RowSource<'a> {
    kind: WorkloadKind,
    meta: &'a ObjectMeta,
    template: Option<&'a PodTemplateSpec>,
    desired: i32,
    current: i32,
    payload: WorkloadPayload,
}

fn make_row(src: RowSource<'_>, pods: &[Pod]) -> ViewRow {
    let spec = src.template.and_then(|t| t.spec.as_ref());
    let image_name = first_image_name(spec);
    let text = image_text(spec);
    ViewRow {
        name: src.meta.name.clone().unwrap_or_default(),
        uid: src.meta.uid.clone().unwrap_or_default(),
        kind: src.kind,
        creation_timestamp: src.meta.creation_timestamp.as_ref().map(|t| t.0),
        image_id: image_id(&image_name, src.template.and_then(|t| t.metadata.as_ref()), pods),
        image_display_text: text.text,
        image_tooltip: text.tooltip,
        desired_count: src.desired,
        current_count: src.current,
        payload: src.payload,
    }
}

fn stateful_set_row(set: &StatefulSet, pods: &[Pod]) -> ViewRow {
    let status = set.status.as_ref();
    make_row(
        RowSource {
            kind: WorkloadKind::StatefulSet,
            meta: &set.metadata,
            template: set.spec.as_ref().map(|s| &s.template),
            desired: status.map_or(0, |s| s.replicas),
            current: status.and_then(|s| s.current_replicas).unwrap_or(0),
            payload: WorkloadPayload::StatefulSet(Box::new(set.clone())),
        },
        pods,
    )
}

fn daemon_set_row(set: &DaemonSet, pods: &[Pod]) -> ViewRow {
    let status = set.status.as_ref();
    make_row(
        RowSource {
            kind: WorkloadKind::DaemonSet,
            meta: &set.metadata,
            template: set.spec.as_ref().map(|s| &s.template),
            desired: status.map_or(0, |s| s.desired_number_scheduled),
            current: status.map_or(0, |s| s.current_number_scheduled),
            payload: WorkloadPayload::DaemonSet(Box::new(set.clone())),
        },
        pods,
    )
}

fn replica_set_row(set: &ReplicaSet, pods: &[Pod]) -> ViewRow {
    let status = set.status.as_ref();
    make_row(
        RowSource {
            kind: WorkloadKind::ReplicaSet,
            meta: &set.metadata,
            template: set.spec.as_ref().and_then(|s| s.template.as_ref()),
            desired: status.map_or(0, |s| s.replicas),
            current: status.and_then(|s| s.available_replicas).unwrap_or(0),
            payload: WorkloadPayload::ReplicaSet(Box::new(set.clone())),
        },
        pods,
    )
}

fn track_image(ids: &mut Vec<String>, id: &str) {
    if id.is_empty() || ids.iter().any(|seen| seen.eq_ignore_ascii_case(id)) {
        return;
    }
    ids.push(id.to_string());
}

pub fn build_rows(input: &AggregationInput<'_>) -> Aggregation {
    let mut rows = Vec::new();
    for kind in WorkloadKind::ORDER {
        if !show_kind(input.type_filter, kind) {
            continue;
        }
        match kind {
            WorkloadKind::StatefulSet => rows.extend(input.stateful_sets.iter().map(|s| stateful_set_row(s, input.pods))),
            WorkloadKind::DaemonSet => rows.extend(input.daemon_sets.iter().map(|s| daemon_set_row(s, input.pods))),
            WorkloadKind::ReplicaSet => rows.extend(
                input.replica_sets.iter().filter(|s| is_standalone(s)).map(|s| replica_set_row(s, input.pods)),
            ),
        }
    }
    let mut image_ids = Vec::new();
    for row in &rows {
        track_image(&mut image_ids, &row.image_id);
    }
    Aggregation { rows, image_ids }
}

/// Case-insensitive substring match on the row name; no filter keeps all.
pub fn matches_name(name: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => name.to_lowercase().contains(&f.to_lowercase()),
        None => true,
    }
}

pub fn filter_by_name(rows: Vec<ViewRow>, filter: Option<&str>) -> Vec<ViewRow> {
    rows.into_iter().filter(|r| matches_name(&r.name, filter)).collect()
}
