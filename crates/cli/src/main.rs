use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use kpanel_core::{KubeResourceType, PanelConfig};
use k8s_openapi::api::core::v1::Service;
use kpanel_flux::{FetchToken, Registry, Store};
use kpanel_kubehub::{DigestImageService, ImageService, KubeClientService, KubeService};
use kpanel_store::PanelContext;
use kpanel_view::{OtherWorkloadsView, TableRow, ViewProps};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kpanelctl", version, about = "Other-workloads panel (StatefulSets, DaemonSets, standalone ReplicaSets)")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubernetes namespace (default: all namespaces)
    #[arg(long = "ns", global = true, env = "KPANEL_NAMESPACE")]
    namespace: Option<String>,

    /// Per-list timeout in seconds
    #[arg(long = "timeout", global = true)]
    timeout_secs: Option<u64>,

    /// Only show these kinds, e.g. `--type sts,ds`
    #[arg(long = "type", global = true, value_delimiter = ',')]
    types: Vec<KubeResourceType>,

    /// Case-insensitive name substring
    #[arg(long = "name", global = true)]
    name: Option<String>,

    /// Resolve image details from pinned digests
    #[arg(long = "image-details", global = true, action = ArgAction::SetTrue)]
    image_details: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the other-workloads table
    Workloads {
        /// Keep refreshing until Ctrl-C
        #[arg(long = "watch", action = ArgAction::SetTrue)]
        watch: bool,
        /// Refresh interval for --watch
        #[arg(long = "interval", default_value_t = 10)]
        interval_secs: u64,
    },
    /// List Services in the namespace
    Services,
    /// Activate the row with the given name and print the selection
    Select {
        name: String,
        /// Select the row's image instead of the workload
        #[arg(long = "image", action = ArgAction::SetTrue)]
        image: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("KPANEL_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("KPANEL_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid KPANEL_METRICS_ADDR; expected host:port");
        }
    }
}

/// Environment first, flags on top.
fn resolve_config(cli: &Cli) -> Result<PanelConfig> {
    let mut cfg = PanelConfig::from_env().context("reading KPANEL_* environment")?;
    if let Some(ns) = cli.namespace.as_ref().filter(|s| !s.is_empty()) {
        cfg.namespace = Some(ns.clone());
    }
    if let Some(secs) = cli.timeout_secs {
        cfg.fetch_timeout = Duration::from_secs(secs.max(1));
    }
    if !cli.types.is_empty() {
        cfg.type_filter = cli.types.clone();
    }
    if cli.name.is_some() {
        cfg.name_filter = cli.name.clone();
    }
    Ok(cfg)
}

/// Left-aligned columns separated by two spaces.
fn render_grid<const N: usize>(headers: [&str; N], rows: &[[&str; N]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }
    let line = |cols: &[&str; N]| -> String {
        let mut s = String::new();
        for (i, (c, w)) in cols.iter().zip(widths.iter()).enumerate() {
            if i + 1 == N {
                s.push_str(c);
            } else {
                s.push_str(&format!("{:<width$}  ", c, width = *w));
            }
        }
        s.trim_end().to_string()
    };
    let mut out = line(&headers);
    for row in rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

fn render_human(rows: &[TableRow]) -> String {
    let cells: Vec<[&str; 5]> = rows
        .iter()
        .map(|r| [r.name.as_str(), r.kind_label, r.image_text.as_str(), r.pods.as_str(), r.age.as_str()])
        .collect();
    render_grid(["NAME", "TYPE", "IMAGE", "PODS", "AGE"], &cells)
}

/// Name, namespace, type, cluster IP and `port/proto` list of a Service.
fn service_cells(svc: &Service) -> [String; 5] {
    let spec = svc.spec.as_ref();
    let ports = spec
        .and_then(|s| s.ports.as_ref())
        .map(|ports| {
            ports
                .iter()
                .map(|p| format!("{}/{}", p.port, p.protocol.as_deref().unwrap_or("TCP")))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    [
        svc.metadata.name.clone().unwrap_or_default(),
        svc.metadata.namespace.clone().unwrap_or_default(),
        spec.and_then(|s| s.type_.clone()).unwrap_or_else(|| "ClusterIP".to_string()),
        spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_else(|| "-".to_string()),
        ports,
    ]
}

fn render_services(services: &[Service]) -> String {
    let owned: Vec<[String; 5]> = services.iter().map(service_cells).collect();
    let cells: Vec<[&str; 5]> = owned.iter().map(|r| r.each_ref().map(String::as_str)).collect();
    render_grid(["NAME", "NAMESPACE", "TYPE", "CLUSTER-IP", "PORTS"], &cells)
}

async fn print_services(ctx: &PanelContext, kube: &dyn KubeService, output: Output) -> Result<()> {
    let outcome = ctx.services_creator.get_services(kube, &FetchToken::detached()).await;
    info!(?outcome, "services loaded");
    let state = ctx.services_store.state();
    if let Some(failure) = state.services.failure() {
        warn!(notice = %failure, "services unavailable");
        eprintln!("! {}", failure);
    }
    let services = state.services.items();
    match output {
        Output::Human if services.is_empty() => println!("No services."),
        Output::Human => println!("{}", render_services(services)),
        Output::Json => println!("{}", serde_json::to_string_pretty(services)?),
    }
    Ok(())
}

fn print_table(view: &OtherWorkloadsView, output: Output) -> Result<()> {
    for notice in view.notices() {
        warn!(notice = %notice, "partial results");
        eprintln!("! {}", notice);
    }
    let table = view.table();
    match output {
        Output::Human => {
            if table.is_empty() {
                println!("No other workloads.");
            } else {
                println!("{}", render_human(&table));
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }
    Ok(())
}

async fn refresh(view: &OtherWorkloadsView) {
    let report = view.load().await;
    info!(?report, "workloads loaded");
    view.aggregate();
    if let Some(outcome) = view.refresh_image_details().await {
        info!(?outcome, "image details refreshed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    let registry = Registry::new();
    let ctx = PanelContext::new(&registry).context("wiring panel stores")?;
    let kube: Arc<dyn KubeService> = Arc::new(KubeClientService::try_default(&cfg).await?);
    let images: Option<Arc<dyn ImageService>> =
        if cli.image_details { Some(Arc::new(DigestImageService::new())) } else { None };
    let props = ViewProps { name_filter: cfg.name_filter.clone(), type_filter: cfg.type_filter.clone() };
    let view = OtherWorkloadsView::new(ctx.clone(), Arc::clone(&kube), images, props);
    view.mount();

    match cli.command {
        Commands::Workloads { watch, interval_secs } => {
            refresh(&view).await;
            print_table(&view, cli.output)?;
            if watch {
                let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
                ticker.tick().await;
                let mut seen = view.revision();
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            refresh(&view).await;
                            let rev = view.revision();
                            if rev != seen {
                                seen = rev;
                                println!();
                                print_table(&view, cli.output)?;
                            }
                        }
                        _ = signal::ctrl_c() => {
                            info!("Ctrl-C received; stopping");
                            break;
                        }
                    }
                }
            }
        }
        Commands::Services => print_services(&ctx, kube.as_ref(), cli.output).await?,
        Commands::Select { name, image } => {
            refresh(&view).await;
            let row = view
                .rows()
                .into_iter()
                .find(|r| r.name == name)
                .ok_or_else(|| anyhow!("no workload named {} in the panel", name))?;
            if image {
                view.open_image(&row).await;
            } else {
                view.activate_row(&row);
            }
            let selected = ctx.selection_store.selected().context("selection store is empty")?;
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
    }
    view.unmount();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpanel_view::PodsStatus;

    fn row(name: &str, image: &str, pods: &str) -> TableRow {
        TableRow {
            uid: format!("uid-{}", name),
            name: name.to_string(),
            kind_label: "Stateful set",
            image_text: image.to_string(),
            image_tooltip: None,
            image_id: image.to_string(),
            image_has_details: false,
            pods: pods.to_string(),
            pods_status: Some(PodsStatus::Ready),
            age: "3d1h".to_string(),
        }
    }

    #[test]
    fn human_table_aligns_columns() {
        let out = render_human(&[row("db", "postgres:16", "1/1"), row("cache-primary", "redis:7", "3/3")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME           TYPE"));
        let image_col = lines[0].find("IMAGE").unwrap();
        assert_eq!(&lines[1][image_col..image_col + 11], "postgres:16");
        assert_eq!(&lines[2][image_col..image_col + 7], "redis:7");
    }

    #[test]
    fn services_render_type_ip_and_ports() {
        let svc: Service = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "web", "namespace": "prod" },
            "spec": {
                "type": "LoadBalancer",
                "clusterIP": "10.0.0.7",
                "ports": [{ "port": 80, "protocol": "TCP" }, { "port": 53, "protocol": "UDP" }]
            }
        }))
        .unwrap();
        let bare: Service = serde_json::from_value(serde_json::json!({ "metadata": { "name": "headless" } })).unwrap();
        assert_eq!(service_cells(&svc), ["web", "prod", "LoadBalancer", "10.0.0.7", "80/TCP,53/UDP"].map(String::from));
        assert_eq!(service_cells(&bare), ["headless", "", "ClusterIP", "-", ""].map(String::from));

        let out = render_services(&[svc, bare]);
        assert!(out.lines().next().unwrap().starts_with("NAME      NAMESPACE"));
        assert_eq!(out.lines().count(), 3);
    }

    #[tokio::test]
    async fn services_subcommand_goes_through_the_services_store() {
        let ctx = PanelContext::new(&Registry::new()).unwrap();
        let svc: Service = serde_json::from_value(serde_json::json!({ "metadata": { "name": "api" } })).unwrap();
        let kube = kpanel_kubehub::mock::MockKubeService::new().with_services(vec![svc]);
        print_services(&ctx, &kube, Output::Json).await.unwrap();
        assert_eq!(ctx.services_store.state().services.items().len(), 1);
        assert!(Cli::try_parse_from(["kpanelctl", "services"]).is_ok());
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from(["kpanelctl", "--ns", "prod", "--type", "sts,ds", "--timeout", "3", "workloads"]);
        let cfg = resolve_config(&cli).unwrap();
        assert_eq!(cfg.namespace.as_deref(), Some("prod"));
        assert_eq!(cfg.type_filter, vec![KubeResourceType::StatefulSets, KubeResourceType::DaemonSets]);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
    }
}
