use crate::{
    checks::{Object, Snapshot, ValidationConfig},
    core::{ObjectKind, ValidationKey},
    Engine, EngineError, ValidationStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A change to the mesh configuration.
#[derive(Clone, Debug)]
pub enum Event {
    /// An object was created or updated.
    Apply(Object),

    /// A validated object was deleted.
    Delete {
        kind: ObjectKind,
        namespace: String,
        name: String,
    },

    /// The snapshot changed in a way single-object updates cannot express,
    /// e.g. a namespace or service account went away.
    Reset(Snapshot),
}

/// Keeps a [`ValidationStore`] current as objects change.
///
/// Applying an object re-runs only the checkers registered for its kind and
/// writes back the result for that one object. Results of other objects that
/// correlate with it are refreshed on the next reset.
#[derive(Debug)]
pub struct Reconciler {
    engine: Engine,
    config: Arc<ValidationConfig>,
    snapshot: Arc<Snapshot>,
    store: ValidationStore,
}

// === impl Reconciler ===

impl Reconciler {
    pub fn new(
        engine: Engine,
        config: Arc<ValidationConfig>,
        snapshot: Snapshot,
        store: ValidationStore,
    ) -> Self {
        Self {
            engine,
            config,
            snapshot: Arc::new(snapshot),
            store,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Processes events until the sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            if let Err(error) = self.reconcile(event).await {
                warn!(%error, "Failed to reconcile");
            }
        }
        debug!("Event stream closed");
    }

    pub async fn reconcile(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::Apply(obj) => {
                let key = obj.key(&self.config.cluster).transpose()?;
                Arc::make_mut(&mut self.snapshot).apply(obj);
                if let Some(key) = key {
                    debug!(%key, "Applied");
                    self.revalidate(key).await;
                }
            }

            Event::Delete {
                kind,
                namespace,
                name,
            } => {
                let key = ValidationKey::new(
                    &*self.config.cluster,
                    Some(namespace.as_str()),
                    kind,
                    Some(name.as_str()),
                )?;
                if Arc::make_mut(&mut self.snapshot).remove(kind, &namespace, &name) {
                    debug!(%key, "Deleted");
                }
                self.store.remove(&key);
            }

            Event::Reset(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let validations = self
                    .engine
                    .evaluate(snapshot.clone(), self.config.clone(), None)
                    .await?;
                info!(objects = validations.len(), "Reset");
                self.snapshot = snapshot;
                self.store.reset(validations);
            }
        }
        Ok(())
    }

    async fn revalidate(&self, key: ValidationKey) {
        let mut validations = self
            .engine
            .evaluate_kind(key.kind, self.snapshot.clone(), self.config.clone())
            .await;
        match validations.remove(&key) {
            Some(validation) => self.store.update(key, validation),
            None => {
                self.store.remove(&key);
            }
        }
    }
}
