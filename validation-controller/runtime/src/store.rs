use crate::core::{Summary, Validation, ValidationKey, Validations};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

/// The latest validation results, shared between the reconciler that writes
/// them and whatever serves or reports them.
#[derive(Clone, Debug, Default)]
pub struct ValidationStore(Arc<RwLock<Validations>>);

// === impl ValidationStore ===

impl ValidationStore {
    /// Replaces every result, e.g. after a full evaluation.
    pub fn reset(&self, validations: Validations) {
        *self.0.write() = validations;
    }

    /// Replaces the result for a single object.
    pub fn update(&self, key: ValidationKey, validation: Validation) {
        let mut validations = self.0.write();
        validations.remove(&key);
        validations.insert(key, validation);
    }

    pub fn remove(&self, key: &ValidationKey) -> Option<Validation> {
        self.0.write().remove(key)
    }

    pub fn get(&self, key: &ValidationKey) -> Option<Validation> {
        self.0.read().get(key).cloned()
    }

    pub fn for_namespace(&self, cluster: &str, namespace: &str) -> Validations {
        self.0.read().for_namespace(cluster, namespace)
    }

    pub fn summarize(&self) -> BTreeMap<(String, String), Summary> {
        self.0.read().summarize()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Returns a copy of every result.
    pub fn to_validations(&self) -> Validations {
        self.0.read().clone()
    }
}
