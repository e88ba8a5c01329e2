//! Controller for the other-workloads table.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use kpanel_core::{KubeResourceType, SelectionPayload, ViewRow, WorkloadKind};
use kpanel_flux::{Liveness, Store, SubscriptionId};
use kpanel_kubehub::{ImageService, KubeService};
use kpanel_store::{FetchOutcome, PanelContext};
use tracing::{debug, info};

use crate::builder::{build_rows, filter_by_name, show_kind, Aggregation, AggregationInput};
use crate::table::{table_row, TableRow};

/// Caller-supplied filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewProps {
    pub name_filter: Option<String>,
    pub type_filter: Vec<KubeResourceType>,
}

/// Outcomes of the fetches issued by [`OtherWorkloadsView::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub stateful_sets: FetchOutcome,
    pub daemon_sets: FetchOutcome,
    pub replica_sets: FetchOutcome,
    pub pods: FetchOutcome,
}

impl LoadReport {
    fn stale() -> Self {
        Self {
            stateful_sets: FetchOutcome::Stale,
            daemon_sets: FetchOutcome::Stale,
            replica_sets: FetchOutcome::Stale,
            pods: FetchOutcome::Stale,
        }
    }
}

type ChangeHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    workloads: Option<SubscriptionId>,
    pods: Option<SubscriptionId>,
    images: Option<SubscriptionId>,
}

pub struct OtherWorkloadsView {
    ctx: PanelContext,
    kube: Arc<dyn KubeService>,
    images: Option<Arc<dyn ImageService>>,
    props: ViewProps,
    liveness: Liveness,
    mounted: AtomicBool,
    revision: Arc<AtomicU64>,
    on_change: Option<ChangeHook>,
    listeners: Mutex<Listeners>,
    last_image_ids: Mutex<Vec<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OtherWorkloadsView {
    pub fn new(
        ctx: PanelContext,
        kube: Arc<dyn KubeService>,
        images: Option<Arc<dyn ImageService>>,
        props: ViewProps,
    ) -> Self {
        Self {
            ctx,
            kube,
            images,
            props,
            liveness: Liveness::new(),
            mounted: AtomicBool::new(false),
            revision: Arc::new(AtomicU64::new(0)),
            on_change: None,
            listeners: Mutex::new(Listeners::default()),
            last_image_ids: Mutex::new(Vec::new()),
        }
    }

    /// Called after every store change while mounted; typically schedules a re-render.
    pub fn with_change_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(hook));
        self
    }

    pub fn props(&self) -> &ViewProps { &self.props }

    pub fn is_mounted(&self) -> bool { self.mounted.load(Ordering::Acquire) }

    /// Number of store changes observed while mounted.
    pub fn revision(&self) -> u64 { self.revision.load(Ordering::Acquire) }

    fn listener(&self) -> impl Fn(&()) + Send + Sync + 'static {
        let revision = Arc::clone(&self.revision);
        let hook = self.on_change.clone();
        move |_| {
            revision.fetch_add(1, Ordering::AcqRel);
            if let Some(h) = &hook {
                h();
            }
        }
    }

    /// Subscribe to store changes. Mounting twice is a no-op.
    pub fn mount(&self) {
        if self.mounted.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut l = lock(&self.listeners);
        l.workloads = Some(self.ctx.workloads_store.add_listener(self.listener()));
        l.pods = Some(self.ctx.pods_store.add_listener(self.listener()));
        l.images = Some(self.ctx.images_store.add_listener(self.listener()));
        debug!(types = ?self.props.type_filter, "other workloads: mounted");
    }

    /// Issue the workload and pod fetches concurrently on the current task.
    /// Results landing after `unmount` are dropped; an unmounted view fetches
    /// nothing.
    pub async fn load(&self) -> LoadReport {
        if !self.is_mounted() {
            debug!("other workloads: load skipped, view not mounted");
            return LoadReport::stale();
        }
        let token = self.liveness.token();
        let kube = self.kube.as_ref();
        let (stateful_sets, daemon_sets, replica_sets, pods) = tokio::join!(
            self.ctx.workloads_creator.get_stateful_sets(kube, &token),
            self.ctx.workloads_creator.get_daemon_sets(kube, &token),
            self.ctx.workloads_creator.get_replica_sets(kube, &token),
            self.ctx.pods_creator.get_pods(kube, &token),
        );
        LoadReport { stateful_sets, daemon_sets, replica_sets, pods }
    }

    /// Drop listeners and make in-flight fetches no-ops.
    pub fn unmount(&self) {
        if !self.mounted.swap(false, Ordering::AcqRel) {
            return;
        }
        self.liveness.invalidate();
        let mut l = lock(&self.listeners);
        if let Some(id) = l.workloads.take() {
            self.ctx.workloads_store.remove_listener(id);
        }
        if let Some(id) = l.pods.take() {
            self.ctx.pods_store.remove_listener(id);
        }
        if let Some(id) = l.images.take() {
            self.ctx.images_store.remove_listener(id);
        }
        debug!("other workloads: unmounted");
    }

    /// Build rows from the current store snapshots, before name filtering.
    pub fn aggregate(&self) -> Aggregation {
        let t0 = Instant::now();
        let workloads = self.ctx.workloads_store.state();
        let pods = self.ctx.pods_store.state();
        let agg = build_rows(&AggregationInput::from_states(&workloads, &pods, &self.props.type_filter));
        *lock(&self.last_image_ids) = agg.image_ids.clone();
        metrics::histogram!("kpanel_aggregate_ms", t0.elapsed().as_secs_f64() * 1_000.0);
        metrics::gauge!("kpanel_rows", agg.rows.len() as f64);
        agg
    }

    /// Rows to render: aggregation followed by the name filter.
    pub fn rows(&self) -> Vec<ViewRow> {
        filter_by_name(self.aggregate().rows, self.props.name_filter.as_deref())
    }

    pub fn table(&self) -> Vec<TableRow> {
        let images = self.ctx.images_store.state();
        let now = Utc::now();
        self.rows().iter().map(|r| table_row(r, |id| images.has_details(id), now)).collect()
    }

    /// Image ids referenced by the last aggregation pass.
    pub fn image_ids(&self) -> Vec<String> { lock(&self.last_image_ids).clone() }

    /// Inline notices for failed fetches of the kinds this view shows.
    pub fn notices(&self) -> Vec<String> {
        let workloads = self.ctx.workloads_store.state();
        let mut out: Vec<String> = workloads
            .failures()
            .into_iter()
            .filter(|f| {
                WorkloadKind::ORDER
                    .iter()
                    .any(|k| k.resource_type() == f.kind && show_kind(&self.props.type_filter, *k))
            })
            .map(|f| f.to_string())
            .collect();
        if let Some(f) = self.ctx.pods_store.state().pods.failure() {
            out.push(format!("{} (image digests unavailable)", f));
        }
        out
    }

    pub fn activate_row(&self, row: &ViewRow) {
        info!(name = %row.name, kind = ?row.kind, "other workloads: row activated");
        self.ctx.selection_creator.select_item(SelectionPayload::for_row(row));
    }

    /// Activate the `index`th rendered row; false when out of range.
    pub fn activate_index(&self, index: usize) -> bool {
        match self.rows().get(index) {
            Some(row) => {
                self.activate_row(row);
                true
            }
            None => false,
        }
    }

    pub async fn open_image(&self, row: &ViewRow) -> FetchOutcome {
        let token = self.liveness.token();
        self.ctx
            .images_creator
            .open_image_details(self.images.as_deref(), &row.image_id, &row.uid, &token)
            .await
    }

    /// Ask the image service about the last pass's image ids. None when no
    /// image service is configured.
    pub async fn refresh_image_details(&self) -> Option<FetchOutcome> {
        let service = self.images.as_deref()?;
        let ids = self.image_ids();
        let token = self.liveness.token();
        Some(self.ctx.images_creator.set_has_image_details(service, &ids, &token).await)
    }
}

impl Drop for OtherWorkloadsView {
    fn drop(&mut self) {
        self.unmount();
    }
}
