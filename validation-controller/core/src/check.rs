use crate::MessageId;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Unknown,
}

/// A single finding on an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub message: MessageId,
    pub severity: Severity,
    /// Points into the object's structure, e.g. `spec/http[0]/route[0]/destination/host`.
    pub path: String,
}

// === impl Check ===

impl Check {
    pub fn new(message: MessageId, path: impl Into<String>) -> Self {
        Self {
            message,
            severity: message.default_severity(),
            path: path.into(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Serialize for Check {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Check", 5)?;
        s.serialize_field("id", self.message.id())?;
        s.serialize_field("code", self.message.code())?;
        s.serialize_field("message", self.message.text())?;
        s.serialize_field("severity", &self.severity)?;
        s.serialize_field("path", &self.path)?;
        s.end()
    }
}
