/// Allows references from other namespaces into the grant's namespace.
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
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "ReferenceGrant",
    root = "K8sReferenceGrant",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct K8sReferenceGrantSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<ReferenceGrantFrom>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<ReferenceGrantTo>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct ReferenceGrantFrom {
    #[serde(default)]
    pub group: String,
    pub kind: String,
    pub namespace: String,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct ReferenceGrantTo {
    #[serde(default)]
    pub group: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// === impl K8sReferenceGrantSpec ===

impl K8sReferenceGrantSpec {
    /// True if a `from_kind` in `from_ns` may reference the named service in
    /// the grant's namespace.
    pub fn allows_service(&self, from_kind: &str, from_ns: &str, service: &str) -> bool {
        let from = self.from.iter().any(|f| {
            f.group.eq_ignore_ascii_case(super::GROUP)
                && f.kind.eq_ignore_ascii_case(from_kind)
                && f.namespace == from_ns
        });
        let to = self.to.iter().any(|t| {
            (t.group.is_empty() || t.group.eq_ignore_ascii_case("core"))
                && t.kind.eq_ignore_ascii_case("Service")
                && t.name.as_deref().map_or(true, |n| n == service)
        });
        from && to
    }
}
