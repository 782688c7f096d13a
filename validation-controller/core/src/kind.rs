use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The closed set of object kinds that carry validation results.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum ObjectKind {
    AuthorizationPolicy,
    DestinationRule,
    Gateway,
    K8sGateway,
    K8sGrpcRoute,
    K8sHttpRoute,
    K8sReferenceGrant,
    PeerAuthentication,
    RequestAuthentication,
    Service,
    ServiceEntry,
    Sidecar,
    VirtualService,
    Workload,
    WorkloadEntry,
    WorkloadGroup,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown object kind: {0}")]
pub struct UnknownKind(pub String);

// === impl ObjectKind ===

impl ObjectKind {
    pub const ALL: [ObjectKind; 16] = [
        ObjectKind::AuthorizationPolicy,
        ObjectKind::DestinationRule,
        ObjectKind::Gateway,
        ObjectKind::K8sGateway,
        ObjectKind::K8sGrpcRoute,
        ObjectKind::K8sHttpRoute,
        ObjectKind::K8sReferenceGrant,
        ObjectKind::PeerAuthentication,
        ObjectKind::RequestAuthentication,
        ObjectKind::Service,
        ObjectKind::ServiceEntry,
        ObjectKind::Sidecar,
        ObjectKind::VirtualService,
        ObjectKind::Workload,
        ObjectKind::WorkloadEntry,
        ObjectKind::WorkloadGroup,
    ];

    /// The API group the kind is served from. Workloads span several
    /// controllers and have no single group.
    pub fn group(&self) -> &'static str {
        match self {
            Self::DestinationRule
            | Self::Gateway
            | Self::ServiceEntry
            | Self::Sidecar
            | Self::VirtualService
            | Self::WorkloadEntry
            | Self::WorkloadGroup => "networking.istio.io",
            Self::AuthorizationPolicy | Self::PeerAuthentication | Self::RequestAuthentication => {
                "security.istio.io"
            }
            Self::K8sGateway | Self::K8sGrpcRoute | Self::K8sHttpRoute | Self::K8sReferenceGrant => {
                "gateway.networking.k8s.io"
            }
            Self::Service | Self::Workload => "",
        }
    }

    /// The Kubernetes `kind` of the resource.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthorizationPolicy => "AuthorizationPolicy",
            Self::DestinationRule => "DestinationRule",
            Self::Gateway | Self::K8sGateway => "Gateway",
            Self::K8sGrpcRoute => "GRPCRoute",
            Self::K8sHttpRoute => "HTTPRoute",
            Self::K8sReferenceGrant => "ReferenceGrant",
            Self::PeerAuthentication => "PeerAuthentication",
            Self::RequestAuthentication => "RequestAuthentication",
            Self::Service => "Service",
            Self::ServiceEntry => "ServiceEntry",
            Self::Sidecar => "Sidecar",
            Self::VirtualService => "VirtualService",
            Self::Workload => "Workload",
            Self::WorkloadEntry => "WorkloadEntry",
            Self::WorkloadGroup => "WorkloadGroup",
        }
    }

    /// A stable, lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationPolicy => "authorizationpolicy",
            Self::DestinationRule => "destinationrule",
            Self::Gateway => "gateway",
            Self::K8sGateway => "k8sgateway",
            Self::K8sGrpcRoute => "k8sgrpcroute",
            Self::K8sHttpRoute => "k8shttproute",
            Self::K8sReferenceGrant => "k8sreferencegrant",
            Self::PeerAuthentication => "peerauthentication",
            Self::RequestAuthentication => "requestauthentication",
            Self::Service => "service",
            Self::ServiceEntry => "serviceentry",
            Self::Sidecar => "sidecar",
            Self::VirtualService => "virtualservice",
            Self::Workload => "workload",
            Self::WorkloadEntry => "workloadentry",
            Self::WorkloadGroup => "workloadgroup",
        }
    }

    /// Resolves a manifest's `apiVersion` group and `kind` to an object kind.
    pub fn from_group_kind(group: &str, kind: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.group() == group && k.kind() == kind)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl From<ObjectKind> for &'static str {
    fn from(kind: ObjectKind) -> Self {
        kind.as_str()
    }
}

impl TryFrom<String> for ObjectKind {
    type Error = UnknownKind;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
