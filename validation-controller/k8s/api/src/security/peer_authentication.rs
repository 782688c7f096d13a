use super::PolicySelector;

/// Defines how traffic is tunneled (or not) to a workload's sidecar.
#[derive(
    Clone,
    Debug,
    Default,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "security.istio.io",
    version = "v1",
    kind = "PeerAuthentication",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PeerAuthenticationSpec {
    /// Absent in mesh-wide and namespace-wide policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<PolicySelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtls: Option<PeerMtls>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct PeerMtls {
    #[serde(default)]
    pub mode: MtlsMode,
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MtlsMode {
    /// Inherits from the parent scope.
    #[default]
    Unset,
    Disable,
    Permissive,
    Strict,
}

// === impl PeerAuthenticationSpec ===

impl PeerAuthenticationSpec {
    pub fn mode(&self) -> MtlsMode {
        self.mtls.as_ref().map(|m| m.mode).unwrap_or_default()
    }
}

// === impl MtlsMode ===

impl MtlsMode {
    /// STRICT and PERMISSIVE both accept mutual TLS traffic.
    pub fn enables_mtls(&self) -> bool {
        matches!(self, Self::Strict | Self::Permissive)
    }
}
