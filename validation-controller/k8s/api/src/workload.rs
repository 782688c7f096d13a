use crate::labels::Labels;

/// A label-bearing compute unit: a pod, or the pod template of a
/// deployment-like controller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    /// The controller kind the workload was read from, e.g. `Deployment`.
    pub kind: String,
    pub labels: Labels,
    /// Whether the pods run an injected Istio sidecar.
    pub istio_sidecar: bool,
    pub service_account: Option<String>,
    pub ports: Vec<ContainerPort>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerPort {
    pub name: Option<String>,
    pub port: i32,
    pub protocol: String,
}

// === impl Workload ===

impl Workload {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind: "Deployment".to_string(),
            labels,
            ..Default::default()
        }
    }

    pub fn with_sidecar(mut self) -> Self {
        self.istio_sidecar = true;
        self
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = ContainerPort>) -> Self {
        self.ports.extend(ports);
        self
    }

    pub fn with_service_account(mut self, sa: impl Into<String>) -> Self {
        self.service_account = Some(sa.into());
        self
    }
}

// === impl ContainerPort ===

impl ContainerPort {
    pub fn new(name: Option<&str>, port: i32) -> Self {
        Self {
            name: name.map(Into::into),
            port,
            protocol: "TCP".to_string(),
        }
    }
}
