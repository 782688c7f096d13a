//! `networking.istio.io` resources.

pub mod destination_rule;
pub mod gateway;
pub mod service_entry;
pub mod sidecar;
pub mod virtual_service;
pub mod workload_entry;
pub mod workload_group;

pub use self::{
    destination_rule::{DestinationRule, DestinationRuleSpec},
    gateway::{Gateway, GatewaySpec},
    service_entry::{ServiceEntry, ServiceEntrySpec},
    sidecar::{Sidecar, SidecarSpec},
    virtual_service::{VirtualService, VirtualServiceSpec},
    workload_entry::{WorkloadEntry, WorkloadEntrySpec},
    workload_group::{WorkloadGroup, WorkloadGroupSpec},
};
use crate::labels::Selector;

/// `workloadSelector: { labels: {...} }` as used by sidecars, destination
/// rules and service entries.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct WorkloadSelector {
    #[serde(default)]
    pub labels: Selector,
}

/// A port as declared on gateways and sidecar listeners.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct Port {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}
