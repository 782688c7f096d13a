use crate::core::ObjectKind;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram},
    registry::{Registry, Unit},
};
use tokio::time::Duration;

/// Counters and timings recorded by the [`Engine`](crate::Engine).
#[derive(Clone, Debug)]
pub struct EngineMetrics {
    runs: Family<KindLabels, Counter>,
    failures: Family<KindLabels, Counter>,
    duration: Histogram,
    objects: Gauge,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: &'static str,
}

// === impl EngineMetrics ===

impl EngineMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let runs = Family::<KindLabels, Counter>::default();
        reg.register(
            "checker_runs",
            "Total number of checker runs, by object kind",
            runs.clone(),
        );

        let failures = Family::<KindLabels, Counter>::default();
        reg.register(
            "checker_failures",
            "Total number of checker runs that panicked, by object kind",
            failures.clone(),
        );

        // Full evaluations of large meshes take seconds; single-kind runs
        // take microseconds.
        let duration = Histogram::new([0.001, 0.01, 0.1, 1.0, 10.0].into_iter());
        reg.register_with_unit(
            "evaluation_duration",
            "Histogram of the time taken to evaluate a snapshot",
            Unit::Seconds,
            duration.clone(),
        );

        let objects = Gauge::default();
        reg.register(
            "objects",
            "Number of objects with a validation result",
            objects.clone(),
        );

        Self {
            runs,
            failures,
            duration,
            objects,
        }
    }

    pub(crate) fn checker_ran(&self, kind: ObjectKind) {
        self.runs
            .get_or_create(&KindLabels {
                kind: kind.as_str(),
            })
            .inc();
    }

    pub(crate) fn checker_failed(&self, kind: ObjectKind) {
        self.failures
            .get_or_create(&KindLabels {
                kind: kind.as_str(),
            })
            .inc();
    }

    pub(crate) fn evaluated(&self, elapsed: Duration, objects: usize) {
        self.duration.observe(elapsed.as_secs_f64());
        self.objects.set(objects as i64);
    }
}
