use crate::ObjectKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one validation result: (cluster, namespace, kind, name).
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationKey {
    pub cluster: String,
    pub namespace: String,
    #[serde(rename = "objectKind")]
    pub kind: ObjectKind,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("{kind} is missing a name")]
    MissingName { kind: ObjectKind },

    #[error("{kind} {name} is missing a namespace")]
    MissingNamespace { kind: ObjectKind, name: String },

    #[error("duplicate object {0}")]
    Duplicate(ValidationKey),
}

// === impl ValidationKey ===

impl ValidationKey {
    /// Builds a key, rejecting objects without a name or namespace.
    pub fn new(
        cluster: impl Into<String>,
        namespace: Option<&str>,
        kind: ObjectKind,
        name: Option<&str>,
    ) -> Result<Self, KeyError> {
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => return Err(KeyError::MissingName { kind }),
        };
        let namespace = match namespace {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => return Err(KeyError::MissingNamespace { kind, name }),
        };
        Ok(Self {
            cluster: cluster.into(),
            namespace,
            kind,
            name,
        })
    }
}

impl fmt::Display for ValidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cluster, self.namespace, self.kind, self.name
        )
    }
}
