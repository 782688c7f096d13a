//! `gateway.networking.k8s.io` resources.

pub mod grpc_route;
pub mod http_route;
pub mod k8s_gateway;
pub mod reference_grant;

pub use self::{
    grpc_route::{K8sGrpcRoute, K8sGrpcRouteSpec},
    http_route::{K8sHttpRoute, K8sHttpRouteSpec},
    k8s_gateway::{K8sGateway, K8sGatewaySpec},
    reference_grant::{K8sReferenceGrant, K8sReferenceGrantSpec},
};

pub const GROUP: &str = "gateway.networking.k8s.io";

/// Identifies a resource a route attaches to.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Identifies the backend a route forwards to.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

// === impl ParentReference ===

impl ParentReference {
    /// Parent references default to the `Gateway` kind of the gateway API
    /// group.
    pub fn targets_gateway(&self) -> bool {
        let group = self.group.as_deref().unwrap_or(GROUP);
        let kind = self.kind.as_deref().unwrap_or("Gateway");
        group.eq_ignore_ascii_case(GROUP) && kind.eq_ignore_ascii_case("Gateway")
    }
}

// === impl BackendRef ===

impl BackendRef {
    /// Backend references default to a core `Service`.
    pub fn targets_service(&self) -> bool {
        let group = self.group.as_deref().unwrap_or("");
        let kind = self.kind.as_deref().unwrap_or("Service");
        (group.is_empty() || group.eq_ignore_ascii_case("core"))
            && kind.eq_ignore_ascii_case("Service")
    }
}
