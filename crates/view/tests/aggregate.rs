mod fixtures;

use fixtures::{ds, pod, rs, sts};
use k8s_openapi::api::apps::v1::ReplicaSet;
use kpanel_core::{KubeResourceType, WorkloadKind, WorkloadPayload};
use kpanel_view::{build_rows, filter_by_name, is_standalone, AggregationInput};

fn input<'a>(
    stateful_sets: &'a [k8s_openapi::api::apps::v1::StatefulSet],
    daemon_sets: &'a [k8s_openapi::api::apps::v1::DaemonSet],
    replica_sets: &'a [ReplicaSet],
    pods: &'a [k8s_openapi::api::core::v1::Pod],
    type_filter: &'a [KubeResourceType],
) -> AggregationInput<'a> {
    AggregationInput { stateful_sets, daemon_sets, replica_sets, pods, type_filter }
}

#[test]
fn empty_state_yields_no_rows() {
    let agg = build_rows(&input(&[], &[], &[], &[], &[]));
    assert!(agg.rows.is_empty());
    assert!(agg.image_ids.is_empty());
}

#[test]
fn rows_grouped_by_kind_in_fixed_order_keeping_arrival_order() {
    let s = vec![sts("zeta", "z:1", 1, 1), sts("alpha", "a:1", 1, 1)];
    let d = vec![ds("logs", "fluent:1", 3, 3)];
    let r = vec![rs("solo", "solo:1", 1, 1, false)];
    let agg = build_rows(&input(&s, &d, &r, &[], &[]));
    let got: Vec<(&str, WorkloadKind)> = agg.rows.iter().map(|r| (r.name.as_str(), r.kind)).collect();
    assert_eq!(
        got,
        vec![
            ("zeta", WorkloadKind::StatefulSet),
            ("alpha", WorkloadKind::StatefulSet),
            ("logs", WorkloadKind::DaemonSet),
            ("solo", WorkloadKind::ReplicaSet),
        ]
    );
}

#[test]
fn only_standalone_replica_sets_are_shown() {
    let r = vec![rs("rs-a", "a:1", 1, 1, false), rs("rs-b", "b:1", 1, 1, true)];
    assert!(is_standalone(&r[0]));
    assert!(!is_standalone(&r[1]));
    let agg = build_rows(&input(&[], &[], &r, &[], &[]));
    let names: Vec<&str> = agg.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["rs-a"]);
}

#[test]
fn replica_set_without_owner_list_is_standalone() {
    let bare: ReplicaSet = serde_json::from_value(serde_json::json!({ "metadata": { "name": "bare" } })).unwrap();
    assert!(is_standalone(&bare));
    let agg = build_rows(&input(&[], &[], std::slice::from_ref(&bare), &[], &[]));
    assert_eq!(agg.rows.len(), 1);
    // malformed item: no spec/status still yields a row with safe defaults
    let row = &agg.rows[0];
    assert_eq!(row.desired_count, 0);
    assert_eq!(row.current_count, 0);
    assert_eq!(row.image_display_text, "");
    assert_eq!(row.image_id, "");
    assert_eq!(row.uid, "");
}

#[test]
fn type_filter_excludes_other_kinds() {
    let s = vec![sts("db", "pg:16", 1, 1)];
    let d = vec![ds("agent", "agent:1", 2, 2)];
    let r = vec![rs("solo", "solo:1", 1, 1, false)];
    let agg = build_rows(&input(&s, &d, &r, &[], &[KubeResourceType::DaemonSets]));
    assert_eq!(agg.rows.len(), 1);
    assert!(agg.rows.iter().all(|r| r.kind == WorkloadKind::DaemonSet));
    assert_eq!(agg.image_ids, vec!["agent:1".to_string()]);
}

#[test]
fn counts_map_per_kind() {
    let s = vec![sts("db", "pg", 3, 2)];
    let d = vec![ds("agent", "agent", 5, 5)];
    let r = vec![rs("solo", "solo", 2, 0, false)];
    let agg = build_rows(&input(&s, &d, &r, &[], &[]));
    let counts: Vec<(i32, i32)> = agg.rows.iter().map(|r| (r.desired_count, r.current_count)).collect();
    assert_eq!(counts, vec![(3, 2), (5, 5), (2, 0)]);
}

#[test]
fn aggregation_is_idempotent() {
    let s = vec![sts("db", "pg:16", 3, 2)];
    let d = vec![ds("agent", "agent:1", 2, 2)];
    let r = vec![rs("solo", "solo:1", 1, 1, false), rs("owned", "o:1", 1, 1, true)];
    let p = vec![pod("db", "pg:16", "docker-pullable://pg@sha256:01")];
    let first = build_rows(&input(&s, &d, &r, &p, &[]));
    let second = build_rows(&input(&s, &d, &r, &p, &[]));
    assert_eq!(first, second);
}

#[test]
fn image_ids_resolve_through_pods_and_dedupe_per_pass() {
    let s = vec![sts("db", "pg:16", 1, 1), sts("db2", "PG:16", 1, 1)];
    let d = vec![ds("web", "nginx:1", 1, 1)];
    let p = vec![pod("web", "nginx:1", "docker-pullable://nginx@sha256:ff")];
    let agg = build_rows(&input(&s, &d, &[], &p, &[]));
    assert_eq!(agg.rows[2].image_id, "nginx@sha256:ff");
    assert_eq!(agg.rows[0].image_id, "pg:16");
    assert_eq!(agg.image_ids, vec!["pg:16".to_string(), "nginx@sha256:ff".to_string()]);

    // a later pass over fewer workloads does not carry earlier ids
    let agg2 = build_rows(&input(&[], &d, &[], &p, &[]));
    assert_eq!(agg2.image_ids, vec!["nginx@sha256:ff".to_string()]);
}

#[test]
fn row_carries_identity_and_payload() {
    let s = vec![sts("db", "pg:16", 1, 1)];
    let agg = build_rows(&input(&s, &[], &[], &[], &[]));
    let row = &agg.rows[0];
    assert_eq!(row.uid, "sts-db");
    assert_eq!(row.image_display_text, "pg:16");
    assert!(row.creation_timestamp.is_some());
    assert!(matches!(&row.payload, WorkloadPayload::StatefulSet(s) if s.metadata.name.as_deref() == Some("db")));
}

#[test]
fn name_filter_applies_after_aggregation() {
    let s = vec![sts("Frontend", "a", 1, 1), sts("backend", "b", 1, 1), sts("db", "c", 1, 1)];
    let rows = build_rows(&input(&s, &[], &[], &[], &[])).rows;
    let names: Vec<String> = filter_by_name(rows, Some("END")).into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Frontend".to_string(), "backend".to_string()]);
}
