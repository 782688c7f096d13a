//! Concurrent evaluation of a snapshot.
//!
//! Every registered kind is evaluated on its own blocking task. Tasks share
//! the snapshot and configuration through `Arc`s and merge their results
//! into a single aggregator as they complete.

use crate::{
    checks::{Context, Registry, Snapshot, ValidationConfig},
    core::{KeyError, ObjectKind, Validations},
    EngineMetrics,
};
use parking_lot::Mutex;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tokio::{
    task::JoinSet,
    time::{self, Duration, Instant},
};
use tracing::{debug, error, info_span, Instrument};

/// Runs registered checkers against snapshots.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    metrics: EngineMetrics,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("snapshot rejected: {0}")]
    Identity(#[from] KeyError),

    #[error("evaluation did not complete within {0:?}")]
    Timeout(Duration),
}

// === impl Engine ===

impl Engine {
    pub fn new(registry: Registry, metrics: EngineMetrics) -> Self {
        Self {
            registry: Arc::new(registry),
            metrics,
        }
    }

    /// Evaluates every registered kind.
    ///
    /// Objects without a name or namespace, or sharing an identity, reject
    /// the whole snapshot before any checker runs. When `deadline` elapses
    /// no partial result is returned.
    pub async fn evaluate(
        &self,
        snapshot: Arc<Snapshot>,
        config: Arc<ValidationConfig>,
        deadline: Option<Duration>,
    ) -> Result<Validations, EngineError> {
        snapshot.check_identities(&config.cluster)?;

        let start = Instant::now();
        let kinds = self.registry.kinds().collect::<Vec<_>>();
        let run = self.run_kinds(kinds, snapshot, config);
        let validations = match deadline {
            Some(timeout) => time::timeout(timeout, run)
                .await
                .map_err(|_| EngineError::Timeout(timeout))?,
            None => run.await,
        };

        self.metrics.evaluated(start.elapsed(), validations.len());
        debug!(objects = validations.len(), elapsed = ?start.elapsed(), "Evaluated snapshot");
        Ok(validations)
    }

    /// Re-runs the checkers registered for a single kind.
    pub async fn evaluate_kind(
        &self,
        kind: ObjectKind,
        snapshot: Arc<Snapshot>,
        config: Arc<ValidationConfig>,
    ) -> Validations {
        self.run_kinds(vec![kind], snapshot, config)
            .instrument(info_span!("evaluate", %kind))
            .await
    }

    async fn run_kinds(
        &self,
        kinds: Vec<ObjectKind>,
        snapshot: Arc<Snapshot>,
        config: Arc<ValidationConfig>,
    ) -> Validations {
        let results = Arc::new(Mutex::new(Validations::new()));

        let mut tasks = JoinSet::new();
        for kind in kinds {
            let registry = self.registry.clone();
            let snapshot = snapshot.clone();
            let config = config.clone();
            let results = results.clone();
            tasks.spawn_blocking(move || {
                let run = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    let ctx = Context::new(&snapshot, &config);
                    registry.run_kind(kind, &ctx)
                }));
                match run {
                    Ok(validations) => {
                        results.lock().merge(validations);
                        (kind, Ok(()))
                    }
                    Err(panic) => (kind, Err(panic_message(panic))),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(()))) => {
                    self.metrics.checker_ran(kind);
                }
                Ok((kind, Err(message))) => {
                    error!(%kind, %message, "Checker panicked");
                    self.metrics.checker_ran(kind);
                    self.metrics.checker_failed(kind);
                }
                Err(error) => {
                    error!(%error, "Checker task failed");
                }
            }
        }

        let mut validations = std::mem::take(&mut *results.lock());
        validations.strip_ignored(&config.ignored_checks);
        validations
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("kinds", &self.registry.kinds().collect::<Vec<_>>())
            .finish()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = panic.downcast_ref::<String>() {
        return msg.clone();
    }
    "unknown panic".to_string()
}
