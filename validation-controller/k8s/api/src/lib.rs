#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod gateway;
pub mod labels;
pub mod namespace;
pub mod networking;
pub mod registry;
pub mod security;
pub mod workload;

pub use self::{
    labels::{Labels, Selector},
    namespace::Namespace,
    registry::RegistryService,
    workload::{ContainerPort, Workload},
};
pub use k8s_openapi::api::{
    self,
    apps::v1::{DaemonSet, Deployment, StatefulSet},
    core::v1::{Namespace as K8sNamespace, Pod, PodTemplateSpec, Service, ServiceAccount},
};
pub use kube::core::{ObjectMeta, ResourceExt};

/// Annotation restricting the visibility of a Kubernetes service.
pub const EXPORT_TO_ANNOTATION: &str = "networking.istio.io/exportTo";

#[cfg(test)]
mod tests;
