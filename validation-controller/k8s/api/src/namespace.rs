use crate::labels::Labels;

/// Label set on namespaces enrolled in ambient mode.
pub const DATAPLANE_MODE_LABEL: &str = "istio.io/dataplane-mode";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub labels: Labels,
}

// === impl Namespace ===

impl Namespace {
    pub fn new(name: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    pub fn is_ambient(&self) -> bool {
        self.labels.get(DATAPLANE_MODE_LABEL) == Some("ambient")
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::new(name, Labels::default())
    }
}
