use crate::Snapshot;
use k8s::{
    gateway::{K8sGateway, K8sGrpcRoute, K8sHttpRoute, K8sReferenceGrant},
    networking::{
        DestinationRule, Gateway, ServiceEntry, Sidecar, VirtualService, WorkloadEntry,
        WorkloadGroup,
    },
    security::{AuthorizationPolicy, PeerAuthentication, RequestAuthentication},
    Service, Workload, EXPORT_TO_ANNOTATION,
};
use kube::Resource;
use mesh_validation_k8s_api as k8s;
use mesh_validation_core::{KeyError, ObjectKind, ValidationKey};

/// A validated object: something with an identity that a snapshot holds a
/// list of.
pub trait ConfigObject: Send + Sync + 'static {
    const KIND: ObjectKind;

    fn list(snapshot: &Snapshot) -> &[Self]
    where
        Self: Sized;

    fn list_mut(snapshot: &mut Snapshot) -> &mut Vec<Self>
    where
        Self: Sized;

    /// Empty when unset.
    fn name(&self) -> &str;

    /// Empty when unset.
    fn namespace(&self) -> &str;

    /// Namespaces the object is exported to. Empty means everywhere.
    fn export_to(&self) -> Vec<&str> {
        Vec::new()
    }

    fn try_key(&self, cluster: &str) -> Result<ValidationKey, KeyError> {
        ValidationKey::new(
            cluster,
            Some(self.namespace()),
            Self::KIND,
            Some(self.name()),
        )
    }

    /// Builds the key of an object whose identity has already been checked.
    fn key(&self, cluster: &str) -> ValidationKey {
        ValidationKey {
            cluster: cluster.to_string(),
            namespace: self.namespace().to_string(),
            kind: Self::KIND,
            name: self.name().to_string(),
        }
    }
}

macro_rules! config_object {
    ($ty:ty => $kind:ident, $list:ident) => {
        impl ConfigObject for $ty {
            const KIND: ObjectKind = ObjectKind::$kind;

            fn list(snapshot: &Snapshot) -> &[Self] {
                &snapshot.$list
            }

            fn list_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
                &mut snapshot.$list
            }

            fn name(&self) -> &str {
                self.meta().name.as_deref().unwrap_or_default()
            }

            fn namespace(&self) -> &str {
                self.meta().namespace.as_deref().unwrap_or_default()
            }
        }
    };

    ($ty:ty => $kind:ident, $list:ident, exported) => {
        impl ConfigObject for $ty {
            const KIND: ObjectKind = ObjectKind::$kind;

            fn list(snapshot: &Snapshot) -> &[Self] {
                &snapshot.$list
            }

            fn list_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
                &mut snapshot.$list
            }

            fn name(&self) -> &str {
                self.meta().name.as_deref().unwrap_or_default()
            }

            fn namespace(&self) -> &str {
                self.meta().namespace.as_deref().unwrap_or_default()
            }

            fn export_to(&self) -> Vec<&str> {
                self.spec.export_to.iter().map(String::as_str).collect()
            }
        }
    };
}

config_object!(VirtualService => VirtualService, virtual_services, exported);
config_object!(DestinationRule => DestinationRule, destination_rules, exported);
config_object!(ServiceEntry => ServiceEntry, service_entries, exported);
config_object!(Gateway => Gateway, gateways);
config_object!(Sidecar => Sidecar, sidecars);
config_object!(WorkloadEntry => WorkloadEntry, workload_entries);
config_object!(WorkloadGroup => WorkloadGroup, workload_groups);
config_object!(PeerAuthentication => PeerAuthentication, peer_authentications);
config_object!(RequestAuthentication => RequestAuthentication, request_authentications);
config_object!(AuthorizationPolicy => AuthorizationPolicy, authorization_policies);
config_object!(K8sGateway => K8sGateway, k8s_gateways);
config_object!(K8sHttpRoute => K8sHttpRoute, k8s_http_routes);
config_object!(K8sGrpcRoute => K8sGrpcRoute, k8s_grpc_routes);
config_object!(K8sReferenceGrant => K8sReferenceGrant, k8s_reference_grants);

impl ConfigObject for Service {
    const KIND: ObjectKind = ObjectKind::Service;

    fn list(snapshot: &Snapshot) -> &[Self] {
        &snapshot.services
    }

    fn list_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.services
    }

    fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or_default()
    }

    /// Services are scoped by annotation rather than by spec.
    fn export_to(&self) -> Vec<&str> {
        self.meta()
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXPORT_TO_ANNOTATION))
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ConfigObject for Workload {
    const KIND: ObjectKind = ObjectKind::Workload;

    fn list(snapshot: &Snapshot) -> &[Self] {
        &snapshot.workloads
    }

    fn list_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.workloads
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
