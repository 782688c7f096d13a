use serde::{Deserialize, Serialize};

/// An entry of the mesh's internal service registry, as exported by the
/// control plane. Federated services imported from other meshes appear here
/// too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryService {
    pub hostname: String,

    #[serde(default)]
    pub namespace: String,

    /// The cluster whose registry lists this entry. Absent means the local
    /// cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

// === impl RegistryService ===

impl RegistryService {
    pub fn new(hostname: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn exported_to<I, S>(mut self, export_to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export_to = export_to.into_iter().map(Into::into).collect();
        self
    }
}
