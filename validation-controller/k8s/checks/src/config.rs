/// Mesh-wide settings every checker reads.
///
/// Built once per process (or per test) and passed by reference; checkers
/// never consult global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationConfig {
    /// The cluster the snapshot was read from.
    pub cluster: String,

    /// The namespace where the control plane is deployed. Policies placed
    /// here without a selector apply mesh-wide.
    pub root_namespace: String,

    /// E.g. "cluster.local"
    pub cluster_domain: String,

    /// The mesh identity trust domain used in principals.
    pub trust_domain: String,

    /// When set, sidecars negotiate mutual TLS on their own and destination
    /// rules are not required to enable it.
    pub auto_mtls: bool,

    /// The mesh outbound traffic policy is `ALLOW_ANY`.
    pub policy_allow_any: bool,

    /// Gateways select workloads in their own namespace only.
    pub gateway_to_namespace: bool,

    /// Gateway API classes served by the mesh.
    pub gateway_classes: Vec<String>,

    /// KIA codes to drop from the final report.
    pub ignored_checks: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cluster: "Kubernetes".to_string(),
            root_namespace: "istio-system".to_string(),
            cluster_domain: "cluster.local".to_string(),
            trust_domain: "cluster.local".to_string(),
            auto_mtls: true,
            policy_allow_any: true,
            gateway_to_namespace: false,
            gateway_classes: vec!["istio".to_string()],
            ignored_checks: Vec::new(),
        }
    }
}

impl ValidationConfig {
    pub(crate) fn service_fqdn(&self, name: &str, ns: &str) -> String {
        format!("{}.{}.svc.{}", name, ns, self.cluster_domain)
    }

    /// Hosts that address every service in the mesh.
    pub(crate) fn is_mesh_wildcard(&self, host: &str) -> bool {
        host == "*"
            || host == "*.local"
            || host
                .strip_prefix("*.")
                .map_or(false, |rest| rest == self.cluster_domain)
    }

    /// Returns the namespace of a `*.<ns>.svc.<domain>` host.
    pub(crate) fn namespace_of_wildcard<'h>(&self, host: &'h str) -> Option<&'h str> {
        let rest = host.strip_prefix("*.")?;
        let ns = rest.strip_suffix(&self.cluster_domain)?.strip_suffix(".svc.")?;
        if ns.is_empty() || ns.contains('.') {
            return None;
        }
        Some(ns)
    }
}
