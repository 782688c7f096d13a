use crate::{
    checks::Snapshot,
    core::ValidationKey,
    k8s::RegistryService,
    loader::{self, Document, LoadError},
    Event,
};
use std::{collections::BTreeMap, path::PathBuf};
use tokio::{
    sync::mpsc,
    time::{self, Duration, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// Where a snapshot is read from.
#[derive(Clone, Debug)]
pub struct Source {
    pub manifests: Vec<PathBuf>,
    pub registry: Option<PathBuf>,
}

/// Everything read from a [`Source`] at one point in time.
#[derive(Clone, Debug, Default)]
pub struct Loaded {
    pub documents: Vec<Document>,
    pub registry: Vec<RegistryService>,
}

// === impl Source ===

impl Source {
    pub fn load(&self) -> Result<Loaded, LoadError> {
        let documents = loader::load_paths(&self.manifests)?;
        let registry = match &self.registry {
            Some(path) => loader::load_registry(path)?,
            None => Vec::new(),
        };
        Ok(Loaded {
            documents,
            registry,
        })
    }
}

// === impl Loaded ===

impl Loaded {
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self
            .documents
            .iter()
            .map(|doc| doc.object.clone())
            .collect::<Snapshot>();
        snapshot.registry_services = self.registry.clone();
        snapshot
    }
}

/// Polls `source` every `period` and sends the changes since `last` to the
/// reconciler. Returns when the reconciler goes away.
pub async fn poll(
    source: Source,
    mut last: Loaded,
    cluster: String,
    period: Duration,
    events: mpsc::Sender<Event>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        let next = match source.load() {
            Ok(next) => next,
            Err(error) => {
                warn!(%error, "Failed to reload manifests");
                continue;
            }
        };

        let changes = match diff(&last, &next, &cluster) {
            Some(changes) => changes,
            None => {
                info!("Manifests changed; resetting");
                vec![Event::Reset(next.snapshot())]
            }
        };
        if !changes.is_empty() {
            debug!(events = changes.len(), "Manifests changed");
        }
        for event in changes {
            if events.send(event).await.is_err() {
                return;
            }
        }
        last = next;
    }
}

/// Computes the events that turn `prev` into `next`.
///
/// Returns `None` when the change touches something only a full evaluation
/// can account for: namespaces, service accounts, registry services, or
/// objects without a valid identity.
pub fn diff(prev: &Loaded, next: &Loaded, cluster: &str) -> Option<Vec<Event>> {
    if prev.registry != next.registry {
        return None;
    }

    let (prev_keyed, prev_context) = index(&prev.documents, cluster)?;
    let (next_keyed, next_context) = index(&next.documents, cluster)?;
    if prev_context != next_context {
        return None;
    }

    let mut events = Vec::new();
    for key in prev_keyed.keys() {
        if !next_keyed.contains_key(key) {
            events.push(Event::Delete {
                kind: key.kind,
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            });
        }
    }
    for (key, doc) in next_keyed {
        if prev_keyed.get(&key).map(|d| &d.value) != Some(&doc.value) {
            events.push(Event::Apply(doc.object.clone()));
        }
    }
    Some(events)
}

type Indexed<'d> = (
    BTreeMap<ValidationKey, &'d Document>,
    Vec<&'d serde_yaml::Value>,
);

/// Splits documents into validated objects by identity and the context
/// objects (namespaces and service accounts) they are evaluated against.
fn index<'d>(docs: &'d [Document], cluster: &str) -> Option<Indexed<'d>> {
    let mut keyed = BTreeMap::new();
    let mut context = Vec::new();
    for doc in docs {
        match doc.object.key(cluster) {
            None => context.push(&doc.value),
            Some(Ok(key)) => {
                if keyed.insert(key, doc).is_some() {
                    return None;
                }
            }
            Some(Err(_)) => return None,
        }
    }
    Some((keyed, context))
}
