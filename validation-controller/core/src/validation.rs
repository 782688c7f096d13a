use crate::{Check, ObjectKind, Severity, ValidationKey};
use ahash::AHashMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// The result attached to one object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub checks: Vec<Check>,
    pub references: BTreeSet<ValidationKey>,
}

/// Validation results for every object in an evaluation, keyed by identity.
///
/// Inserting a result for a key that is already present merges the two:
/// validity is AND-ed, checks are concatenated and references are unioned.
/// A result never references its own key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validations(AHashMap<ValidationKey, Validation>);

/// Per-namespace counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub object_count: usize,
}

#[derive(Serialize)]
struct Entry<'a> {
    #[serde(flatten)]
    key: &'a ValidationKey,
    #[serde(flatten)]
    validation: &'a Validation,
}

// === impl Validation ===

impl Default for Validation {
    fn default() -> Self {
        Self {
            valid: true,
            checks: Vec::new(),
            references: BTreeSet::new(),
        }
    }
}

impl Validation {
    pub fn new(checks: Vec<Check>, valid: bool) -> Self {
        Self {
            valid,
            checks,
            references: BTreeSet::new(),
        }
    }

    /// Builds a result that is valid unless a check has error severity.
    pub fn from_checks(checks: Vec<Check>) -> Self {
        let valid = !checks.iter().any(Check::is_error);
        Self::new(checks, valid)
    }

    pub fn with_references(mut self, refs: impl IntoIterator<Item = ValidationKey>) -> Self {
        self.references.extend(refs);
        self
    }

    pub fn merge(&mut self, other: Validation) {
        self.valid &= other.valid;
        self.checks.extend(other.checks);
        self.references.extend(other.references);
    }
}

// === impl Validations ===

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ValidationKey, mut validation: Validation) {
        validation.references.remove(&key);
        match self.0.get_mut(&key) {
            Some(existing) => existing.merge(validation),
            None => {
                self.0.insert(key, validation);
            }
        }
    }

    pub fn merge(&mut self, other: Validations) {
        for (key, validation) in other.0 {
            self.insert(key, validation);
        }
    }

    pub fn get(&self, key: &ValidationKey) -> Option<&Validation> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &ValidationKey) -> Option<Validation> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValidationKey, &Validation)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ValidationKey> {
        self.0.keys()
    }

    /// Returns entries ordered by key.
    pub fn sorted(&self) -> Vec<(&ValidationKey, &Validation)> {
        let mut entries = self.0.iter().collect::<Vec<_>>();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Results for objects in the given namespace of the given cluster.
    pub fn for_namespace(&self, cluster: &str, namespace: &str) -> Validations {
        self.0
            .iter()
            .filter(|(k, _)| k.cluster == cluster && k.namespace == namespace)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drops checks whose KIA code is listed. Objects that lost a check have
    /// their validity recomputed from what remains.
    pub fn strip_ignored(&mut self, codes: &[String]) {
        if codes.is_empty() {
            return;
        }
        for validation in self.0.values_mut() {
            let before = validation.checks.len();
            validation
                .checks
                .retain(|c| !codes.iter().any(|code| code == c.message.code()));
            if validation.checks.len() != before {
                validation.valid = !validation.checks.iter().any(Check::is_error);
            }
        }
    }

    /// Counts errors, warnings and objects per (cluster, namespace). Workload
    /// results are not counted.
    pub fn summarize(&self) -> BTreeMap<(String, String), Summary> {
        let mut summaries = BTreeMap::<_, Summary>::new();
        for (key, validation) in self.0.iter() {
            if key.kind == ObjectKind::Workload {
                continue;
            }
            let summary = summaries
                .entry((key.cluster.clone(), key.namespace.clone()))
                .or_default();
            summary.object_count += 1;
            for check in &validation.checks {
                match check.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Unknown => {}
                }
            }
        }
        summaries
    }
}

impl FromIterator<(ValidationKey, Validation)> for Validations {
    fn from_iter<T: IntoIterator<Item = (ValidationKey, Validation)>>(iter: T) -> Self {
        let mut validations = Self::new();
        for (key, validation) in iter {
            validations.insert(key, validation);
        }
        validations
    }
}

impl IntoIterator for Validations {
    type Item = (ValidationKey, Validation);
    type IntoIter = std::collections::hash_map::IntoIter<ValidationKey, Validation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for Validations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.sorted()
                .into_iter()
                .map(|(key, validation)| Entry { key, validation }),
        )
    }
}
