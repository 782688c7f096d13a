use crate::{
    checks::{Registry as CheckRegistry, ValidationConfig},
    core::{MessageId, Validations},
    watch::{self, Source},
    Engine, EngineMetrics, Reconciler, ValidationStore,
};
use anyhow::{anyhow, bail, Context as _, Result};
use clap::{ArgAction, Parser, ValueEnum};
use prometheus_client::registry::Registry;
use std::{io::Write, path::PathBuf, sync::Arc};
use tokio::{sync::mpsc, time::Duration};
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

// The number of manifest changes to buffer between the poller and the
// reconciler.
const EVENT_QUEUE_SIZE: usize = 1024;

#[derive(Debug, Parser)]
#[clap(
    name = "mesh-validation",
    about = "Validates service mesh configuration across objects"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "mesh_validation=info,warn",
        env = "MESH_VALIDATION_LOG"
    )]
    log_level: String,

    #[clap(long, default_value = "plain")]
    log_format: LogFormat,

    /// The name of the cluster the manifests were read from.
    #[clap(long, default_value = "Kubernetes")]
    cluster: String,

    /// The control plane namespace.
    #[clap(
        long,
        default_value = "istio-system",
        env = "MESH_VALIDATION_ROOT_NAMESPACE"
    )]
    root_namespace: String,

    #[clap(long, default_value = "cluster.local")]
    cluster_domain: String,

    #[clap(long, default_value = "cluster.local")]
    trust_domain: String,

    #[clap(long, default_value = "true", action = ArgAction::Set)]
    auto_mtls: bool,

    /// Whether the mesh outbound traffic policy is ALLOW_ANY.
    #[clap(long, default_value = "true", action = ArgAction::Set)]
    outbound_allow_any: bool,

    /// Gateways only select workloads in their own namespace.
    #[clap(long)]
    gateway_to_namespace: bool,

    #[clap(long, default_value = "istio", value_delimiter = ',')]
    gateway_classes: Vec<String>,

    /// KIA codes to drop from the report.
    #[clap(long, value_delimiter = ',')]
    ignore_checks: Vec<String>,

    /// Manifest files or directories.
    #[clap(long, required = true, num_args = 1..)]
    manifests: Vec<PathBuf>,

    /// A JSON file listing the mesh's registry services.
    #[clap(long)]
    registry_services: Option<PathBuf>,

    #[clap(long, default_value = "summary")]
    output: Output,

    #[clap(long, default_value = "30000")]
    timeout_ms: u64,

    /// Keeps running, re-reading manifests at this interval.
    #[clap(long)]
    watch_interval_secs: Option<u64>,

    /// Exits with an error when any object has an error finding.
    #[clap(long)]
    fail_on_error: bool,

    /// Writes the engine metrics to stderr before exiting.
    #[clap(long)]
    print_metrics: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Json,
    Yaml,
    Summary,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            cluster,
            root_namespace,
            cluster_domain,
            trust_domain,
            auto_mtls,
            outbound_allow_any,
            gateway_to_namespace,
            gateway_classes,
            ignore_checks,
            manifests,
            registry_services,
            output,
            timeout_ms,
            watch_interval_secs,
            fail_on_error,
            print_metrics,
        } = self;

        init_tracing(&log_level, log_format)?;

        for code in &ignore_checks {
            if MessageId::from_code(code).is_none() {
                bail!("unknown check code: {code}");
            }
        }

        let config = Arc::new(ValidationConfig {
            cluster,
            root_namespace,
            cluster_domain,
            trust_domain,
            auto_mtls,
            policy_allow_any: outbound_allow_any,
            gateway_to_namespace,
            gateway_classes,
            ignored_checks: ignore_checks,
        });

        let mut prom = <Registry>::default();
        let metrics = EngineMetrics::register(prom.sub_registry_with_prefix("validation"));
        let engine = Engine::new(CheckRegistry::default(), metrics);

        let source = Source {
            manifests,
            registry: registry_services,
        };
        let loaded = source.load().context("failed to load manifests")?;
        let snapshot = loaded.snapshot();
        info!(
            documents = loaded.documents.len(),
            registry = loaded.registry.len(),
            "Loaded manifests"
        );

        let mut validations = engine
            .evaluate(
                Arc::new(snapshot.clone()),
                config.clone(),
                Some(Duration::from_millis(timeout_ms)),
            )
            .await?;

        if let Some(secs) = watch_interval_secs {
            let store = ValidationStore::default();
            store.reset(validations);

            let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
            let reconciler = Reconciler::new(engine, config.clone(), snapshot, store.clone());
            let reconcile =
                tokio::spawn(reconciler.run(events_rx).instrument(info_span!("reconcile")));
            let poll = tokio::spawn(
                watch::poll(
                    source,
                    loaded,
                    config.cluster.clone(),
                    Duration::from_secs(secs),
                    events_tx,
                )
                .instrument(info_span!("watch")),
            );

            info!(interval = secs, "Watching manifests");
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown")?;
            info!("Shutting down");

            // Dropping the poller closes the event channel and stops the
            // reconciler once it has drained.
            poll.abort();
            if let Err(error) = poll.await {
                if !error.is_cancelled() {
                    warn!(%error, "Watch task failed");
                }
            }
            reconcile.await?;
            validations = store.to_validations();
        }

        write_report(&validations, output)?;

        if print_metrics {
            let mut text = String::new();
            prometheus_client::encoding::text::encode(&mut text, &prom)?;
            eprint!("{text}");
        }

        if fail_on_error {
            let errors = error_count(&validations);
            if errors > 0 {
                bail!("{errors} error findings");
            }
        }
        Ok(())
    }
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level).context("invalid log level")?;
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Plain => fmt.try_init(),
        LogFormat::Json => fmt.json().try_init(),
    }
    .map_err(|error| anyhow!(error))
}

fn write_report(validations: &Validations, output: Output) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match output {
        Output::Json => {
            serde_json::to_writer_pretty(&mut out, validations)?;
            writeln!(out)?;
        }
        Output::Yaml => serde_yaml::to_writer(&mut out, validations)?,
        Output::Summary => {
            writeln!(
                out,
                "{:<16} {:<24} {:>8} {:>8} {:>8}",
                "CLUSTER", "NAMESPACE", "OBJECTS", "ERRORS", "WARNINGS"
            )?;
            for ((cluster, namespace), summary) in validations.summarize() {
                writeln!(
                    out,
                    "{:<16} {:<24} {:>8} {:>8} {:>8}",
                    cluster, namespace, summary.object_count, summary.errors, summary.warnings
                )?;
            }
        }
    }
    Ok(())
}

fn error_count(validations: &Validations) -> usize {
    validations
        .iter()
        .flat_map(|(_, v)| v.checks.iter())
        .filter(|c| c.is_error())
        .count()
}
