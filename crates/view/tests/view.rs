mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fixtures::{ds, pod, rs, sts};
use kpanel_core::{ImageDetails, KubeResourceType, SelectedItem, SelectedItemKind};
use kpanel_flux::{Registry, Store};
use kpanel_kubehub::mock::{MockImageService, MockKubeService};
use kpanel_kubehub::{ImageService, KubeService};
use kpanel_store::{FetchOutcome, PanelContext};
use kpanel_view::{OtherWorkloadsView, PodsStatus, ViewProps};

fn cluster() -> MockKubeService {
    MockKubeService::new()
        .with_stateful_sets(vec![sts("db", "pg:16", 3, 2)])
        .with_daemon_sets(vec![ds("agent", "agent:1", 5, 5)])
        .with_replica_sets(vec![rs("solo", "solo:1", 2, 0, false), rs("owned", "o:1", 1, 1, true)])
        .with_pods(vec![pod("agent", "agent:1", "docker://agent@sha256:aa")])
}

fn view_with(kube: MockKubeService, images: Option<Arc<dyn ImageService>>, props: ViewProps) -> (PanelContext, OtherWorkloadsView) {
    let ctx = PanelContext::new(&Registry::new()).unwrap();
    let kube: Arc<dyn KubeService> = Arc::new(kube);
    let view = OtherWorkloadsView::new(ctx.clone(), kube, images, props);
    (ctx, view)
}

#[tokio::test]
async fn mount_load_render() {
    let (_ctx, view) = view_with(cluster(), None, ViewProps::default());
    assert!(view.rows().is_empty(), "nothing fetched yet renders empty");
    view.mount();
    let report = view.load().await;
    assert_eq!(report.stateful_sets, FetchOutcome::Applied { items: 1 });
    assert_eq!(report.replica_sets, FetchOutcome::Applied { items: 2 });

    let table = view.table();
    let names: Vec<&str> = table.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["db", "agent", "solo"]);
    assert_eq!(table[0].pods, "3/2");
    assert_eq!(table[0].pods_status, Some(PodsStatus::InProgress));
    assert_eq!(table[1].kind_label, "Daemon set");
    assert_eq!(table[1].image_id, "agent@sha256:aa");
    assert_eq!(table[2].pods, "2/0");
    assert!(view.notices().is_empty());
    assert!(view.revision() >= 4, "one change per fetched slice");
    assert_eq!(view.image_ids().len(), 3);
}

#[tokio::test]
async fn change_hook_fires_per_store_change_until_unmount() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let ctx = PanelContext::new(&Registry::new()).unwrap();
    let kube: Arc<dyn KubeService> = Arc::new(cluster());
    let view = OtherWorkloadsView::new(ctx.clone(), kube, None, ViewProps::default())
        .with_change_hook(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
    view.mount();
    view.mount();
    view.load().await;
    assert_eq!(hits.load(Ordering::SeqCst), 4);

    view.unmount();
    assert_eq!(ctx.workloads_store.listener_count(), 0);
    assert_eq!(ctx.pods_store.listener_count(), 0);
}

#[tokio::test]
async fn unmount_during_fetch_discards_late_results() {
    let kube = cluster().delay(KubeResourceType::StatefulSets, Duration::from_millis(30));
    let (ctx, view) = view_with(kube, None, ViewProps::default());
    let view = Arc::new(view);
    view.mount();
    let v = Arc::clone(&view);
    let load = tokio::spawn(async move { v.load().await });
    tokio::time::sleep(Duration::from_millis(5)).await;
    view.unmount();
    let report = load.await.unwrap();
    assert_eq!(report.stateful_sets, FetchOutcome::Stale);
    assert!(ctx.workloads_store.state().stateful_sets.items().is_empty());
}

#[tokio::test]
async fn load_outside_mount_fetches_nothing() {
    let kube = Arc::new(cluster());
    let ctx = PanelContext::new(&Registry::new()).unwrap();
    let view = OtherWorkloadsView::new(ctx.clone(), kube.clone(), None, ViewProps::default());

    let report = view.load().await;
    assert_eq!(report.stateful_sets, FetchOutcome::Stale);
    assert_eq!(report.pods, FetchOutcome::Stale);
    assert!(kube.calls().is_empty());

    view.mount();
    view.load().await;
    let calls = kube.calls().len();
    assert_eq!(calls, 4);
    view.unmount();
    assert_eq!(view.load().await.replica_sets, FetchOutcome::Stale);
    assert_eq!(kube.calls().len(), calls);
    assert!(ctx.workloads_store.state().stateful_sets.is_loaded());
}

#[tokio::test]
async fn type_and_name_filters_apply() {
    let props = ViewProps { name_filter: Some("AG".into()), type_filter: vec![KubeResourceType::DaemonSets] };
    let (_ctx, view) = view_with(cluster(), None, props);
    view.mount();
    view.load().await;
    let rows = view.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "agent");
}

#[tokio::test]
async fn failed_kind_renders_empty_with_notice() {
    let kube = cluster().fail(KubeResourceType::StatefulSets, "503 service unavailable");
    let (_ctx, view) = view_with(kube, None, ViewProps::default());
    view.mount();
    let report = view.load().await;
    assert_eq!(report.stateful_sets, FetchOutcome::Failed);
    let names: Vec<String> = view.rows().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["agent".to_string(), "solo".to_string()]);
    let notices = view.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("statefulsets"));
}

#[tokio::test]
async fn notices_skip_kinds_hidden_by_filter() {
    let kube = cluster().fail(KubeResourceType::StatefulSets, "boom");
    let props = ViewProps { name_filter: None, type_filter: vec![KubeResourceType::ReplicaSets] };
    let (_ctx, view) = view_with(kube, None, props);
    view.mount();
    view.load().await;
    assert!(view.notices().is_empty());
}

#[tokio::test]
async fn activating_rows_overwrites_selection() {
    let (ctx, view) = view_with(cluster(), None, ViewProps::default());
    view.mount();
    view.load().await;
    assert!(view.activate_index(0));
    assert!(view.activate_index(2));
    assert!(!view.activate_index(99));
    let sel = ctx.selection_store.selected().unwrap();
    assert_eq!(sel.item_uid, "rs-solo");
    assert_eq!(sel.selected_item_type, SelectedItemKind::ReplicaSet);
    assert!(sel.show_selected_item);
    assert!(matches!(sel.item, Some(SelectedItem::Workload(_))));
}

#[tokio::test]
async fn image_click_without_service_is_a_stub() {
    let (ctx, view) = view_with(cluster(), None, ViewProps::default());
    view.mount();
    view.load().await;
    let row = view.rows().into_iter().next().unwrap();
    view.open_image(&row).await;
    let sel = ctx.selection_store.selected().unwrap();
    assert_eq!(sel.selected_item_type, SelectedItemKind::ImageDetails);
    assert_eq!(sel.item_uid, row.uid);
    assert!(sel.item.is_none());
    assert_eq!(view.refresh_image_details().await, None);
}

#[tokio::test]
async fn image_details_flow_through_the_image_store() {
    let svc = Arc::new(MockImageService::with_details(vec![ImageDetails {
        image_id: "agent@sha256:aa".into(),
        image_name: "agent".into(),
        registry: None,
        tags: vec!["sha256:aa".into()],
    }]));
    let images: Arc<dyn ImageService> = svc.clone();
    let (ctx, view) = view_with(cluster(), Some(images), ViewProps::default());
    view.mount();
    view.load().await;
    let table = view.table();
    assert!(table.iter().all(|r| !r.image_has_details));

    assert_eq!(view.refresh_image_details().await, Some(FetchOutcome::Applied { items: 3 }));
    let table = view.table();
    let agent = table.iter().find(|r| r.name == "agent").unwrap();
    assert!(agent.image_has_details);

    let row = view.rows().into_iter().find(|r| r.name == "agent").unwrap();
    view.open_image(&row).await;
    let sel = ctx.selection_store.selected().unwrap();
    assert!(matches!(sel.item, Some(SelectedItem::ImageDetails(ref d)) if d.image_name == "agent"));
}
