use crate::ConfigObject;
use ahash::AHashSet;
use k8s::{
    gateway::{K8sGateway, K8sGrpcRoute, K8sHttpRoute, K8sReferenceGrant},
    networking::{
        DestinationRule, Gateway, ServiceEntry, Sidecar, VirtualService, WorkloadEntry,
        WorkloadGroup,
    },
    security::{AuthorizationPolicy, PeerAuthentication, RequestAuthentication},
    Namespace, RegistryService, Service, ServiceAccount, Workload,
};
use kube::Resource;
use mesh_validation_core::{KeyError, ObjectKind, ValidationKey};
use mesh_validation_k8s_api as k8s;

/// An immutable, fully materialized view of the mesh configuration that a
/// single evaluation runs against.
///
/// Every list may be empty.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// The Namespace Set.
    pub namespaces: Vec<Namespace>,
    pub service_accounts: Vec<ServiceAccount>,
    pub services: Vec<Service>,
    pub workloads: Vec<Workload>,
    pub registry_services: Vec<RegistryService>,

    pub virtual_services: Vec<VirtualService>,
    pub destination_rules: Vec<DestinationRule>,
    pub gateways: Vec<Gateway>,
    pub sidecars: Vec<Sidecar>,
    pub service_entries: Vec<ServiceEntry>,
    pub workload_entries: Vec<WorkloadEntry>,
    pub workload_groups: Vec<WorkloadGroup>,

    pub peer_authentications: Vec<PeerAuthentication>,
    pub request_authentications: Vec<RequestAuthentication>,
    pub authorization_policies: Vec<AuthorizationPolicy>,

    pub k8s_gateways: Vec<K8sGateway>,
    pub k8s_http_routes: Vec<K8sHttpRoute>,
    pub k8s_grpc_routes: Vec<K8sGrpcRoute>,
    pub k8s_reference_grants: Vec<K8sReferenceGrant>,
}

/// Any resource a snapshot can hold.
#[derive(Clone, Debug)]
pub enum Object {
    Namespace(Namespace),
    ServiceAccount(ServiceAccount),
    Service(Service),
    Workload(Workload),
    VirtualService(VirtualService),
    DestinationRule(DestinationRule),
    Gateway(Gateway),
    Sidecar(Sidecar),
    ServiceEntry(ServiceEntry),
    WorkloadEntry(WorkloadEntry),
    WorkloadGroup(WorkloadGroup),
    PeerAuthentication(PeerAuthentication),
    RequestAuthentication(RequestAuthentication),
    AuthorizationPolicy(AuthorizationPolicy),
    K8sGateway(K8sGateway),
    K8sHttpRoute(K8sHttpRoute),
    K8sGrpcRoute(K8sGrpcRoute),
    K8sReferenceGrant(K8sReferenceGrant),
}

// === impl Snapshot ===

impl Snapshot {
    /// Rejects objects without a name or namespace, and objects that share
    /// an identity. Nothing is evaluated when this fails.
    pub fn check_identities(&self, cluster: &str) -> Result<(), KeyError> {
        fn visit<T: ConfigObject>(
            objects: &[T],
            cluster: &str,
            seen: &mut AHashSet<ValidationKey>,
        ) -> Result<(), KeyError> {
            for obj in objects {
                let key = obj.try_key(cluster)?;
                if seen.contains(&key) {
                    return Err(KeyError::Duplicate(key));
                }
                seen.insert(key);
            }
            Ok(())
        }

        let mut seen = AHashSet::new();
        visit(&self.services, cluster, &mut seen)?;
        visit(&self.workloads, cluster, &mut seen)?;
        visit(&self.virtual_services, cluster, &mut seen)?;
        visit(&self.destination_rules, cluster, &mut seen)?;
        visit(&self.gateways, cluster, &mut seen)?;
        visit(&self.sidecars, cluster, &mut seen)?;
        visit(&self.service_entries, cluster, &mut seen)?;
        visit(&self.workload_entries, cluster, &mut seen)?;
        visit(&self.workload_groups, cluster, &mut seen)?;
        visit(&self.peer_authentications, cluster, &mut seen)?;
        visit(&self.request_authentications, cluster, &mut seen)?;
        visit(&self.authorization_policies, cluster, &mut seen)?;
        visit(&self.k8s_gateways, cluster, &mut seen)?;
        visit(&self.k8s_http_routes, cluster, &mut seen)?;
        visit(&self.k8s_grpc_routes, cluster, &mut seen)?;
        visit(&self.k8s_reference_grants, cluster, &mut seen)?;
        Ok(())
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.name == name)
    }

    pub fn is_ambient(&self, namespace: &str) -> bool {
        self.namespaces
            .iter()
            .any(|ns| ns.name == namespace && ns.is_ambient())
    }

    pub fn workloads_in<'s>(&'s self, namespace: &'s str) -> impl Iterator<Item = &'s Workload> {
        self.workloads
            .iter()
            .filter(move |w| w.namespace == namespace)
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.namespace() == namespace && s.name() == name)
    }

    /// Service accounts are known either as objects or through the workloads
    /// that run under them.
    pub fn has_service_account(&self, namespace: &str, name: &str) -> bool {
        self.service_accounts.iter().any(|sa| {
            let meta = sa.meta();
            meta.namespace.as_deref() == Some(namespace) && meta.name.as_deref() == Some(name)
        }) || self
            .workloads_in(namespace)
            .any(|w| w.service_account.as_deref() == Some(name))
    }

    /// Adds an object, replacing any previous version with the same identity.
    pub fn apply(&mut self, obj: Object) {
        match obj {
            Object::Namespace(ns) => {
                match self.namespaces.iter_mut().find(|n| n.name == ns.name) {
                    Some(existing) => *existing = ns,
                    None => self.namespaces.push(ns),
                }
            }
            Object::ServiceAccount(sa) => {
                let (ns, name) = (sa.meta().namespace.clone(), sa.meta().name.clone());
                self.service_accounts
                    .retain(|s| s.meta().namespace != ns || s.meta().name != name);
                self.service_accounts.push(sa);
            }
            Object::Service(o) => upsert(self, o),
            Object::Workload(o) => upsert(self, o),
            Object::VirtualService(o) => upsert(self, o),
            Object::DestinationRule(o) => upsert(self, o),
            Object::Gateway(o) => upsert(self, o),
            Object::Sidecar(o) => upsert(self, o),
            Object::ServiceEntry(o) => upsert(self, o),
            Object::WorkloadEntry(o) => upsert(self, o),
            Object::WorkloadGroup(o) => upsert(self, o),
            Object::PeerAuthentication(o) => upsert(self, o),
            Object::RequestAuthentication(o) => upsert(self, o),
            Object::AuthorizationPolicy(o) => upsert(self, o),
            Object::K8sGateway(o) => upsert(self, o),
            Object::K8sHttpRoute(o) => upsert(self, o),
            Object::K8sGrpcRoute(o) => upsert(self, o),
            Object::K8sReferenceGrant(o) => upsert(self, o),
        }
    }

    /// Removes the validated object with the given kind and name. Returns
    /// false if it was not present.
    pub fn remove(&mut self, kind: ObjectKind, namespace: &str, name: &str) -> bool {
        match kind {
            ObjectKind::AuthorizationPolicy => {
                remove::<AuthorizationPolicy>(self, namespace, name)
            }
            ObjectKind::DestinationRule => remove::<DestinationRule>(self, namespace, name),
            ObjectKind::Gateway => remove::<Gateway>(self, namespace, name),
            ObjectKind::K8sGateway => remove::<K8sGateway>(self, namespace, name),
            ObjectKind::K8sGrpcRoute => remove::<K8sGrpcRoute>(self, namespace, name),
            ObjectKind::K8sHttpRoute => remove::<K8sHttpRoute>(self, namespace, name),
            ObjectKind::K8sReferenceGrant => remove::<K8sReferenceGrant>(self, namespace, name),
            ObjectKind::PeerAuthentication => remove::<PeerAuthentication>(self, namespace, name),
            ObjectKind::RequestAuthentication => {
                remove::<RequestAuthentication>(self, namespace, name)
            }
            ObjectKind::Service => remove::<Service>(self, namespace, name),
            ObjectKind::ServiceEntry => remove::<ServiceEntry>(self, namespace, name),
            ObjectKind::Sidecar => remove::<Sidecar>(self, namespace, name),
            ObjectKind::VirtualService => remove::<VirtualService>(self, namespace, name),
            ObjectKind::Workload => remove::<Workload>(self, namespace, name),
            ObjectKind::WorkloadEntry => remove::<WorkloadEntry>(self, namespace, name),
            ObjectKind::WorkloadGroup => remove::<WorkloadGroup>(self, namespace, name),
        }
    }

    pub fn remove_namespace(&mut self, name: &str) -> bool {
        let before = self.namespaces.len();
        self.namespaces.retain(|ns| ns.name != name);
        before != self.namespaces.len()
    }
}

impl FromIterator<Object> for Snapshot {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        let mut snapshot = Self::default();
        for obj in iter {
            snapshot.apply(obj);
        }
        snapshot
    }
}

fn upsert<T: ConfigObject>(snapshot: &mut Snapshot, obj: T) {
    let list = T::list_mut(snapshot);
    match list
        .iter_mut()
        .find(|o| o.namespace() == obj.namespace() && o.name() == obj.name())
    {
        Some(existing) => *existing = obj,
        None => list.push(obj),
    }
}

fn remove<T: ConfigObject>(snapshot: &mut Snapshot, namespace: &str, name: &str) -> bool {
    let list = T::list_mut(snapshot);
    let before = list.len();
    list.retain(|o| o.namespace() != namespace || o.name() != name);
    before != list.len()
}

// === impl Object ===

impl Object {
    /// The kind of validation result the object produces, if any.
    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            Self::Namespace(_) | Self::ServiceAccount(_) => None,
            Self::Service(_) => Some(ObjectKind::Service),
            Self::Workload(_) => Some(ObjectKind::Workload),
            Self::VirtualService(_) => Some(ObjectKind::VirtualService),
            Self::DestinationRule(_) => Some(ObjectKind::DestinationRule),
            Self::Gateway(_) => Some(ObjectKind::Gateway),
            Self::Sidecar(_) => Some(ObjectKind::Sidecar),
            Self::ServiceEntry(_) => Some(ObjectKind::ServiceEntry),
            Self::WorkloadEntry(_) => Some(ObjectKind::WorkloadEntry),
            Self::WorkloadGroup(_) => Some(ObjectKind::WorkloadGroup),
            Self::PeerAuthentication(_) => Some(ObjectKind::PeerAuthentication),
            Self::RequestAuthentication(_) => Some(ObjectKind::RequestAuthentication),
            Self::AuthorizationPolicy(_) => Some(ObjectKind::AuthorizationPolicy),
            Self::K8sGateway(_) => Some(ObjectKind::K8sGateway),
            Self::K8sHttpRoute(_) => Some(ObjectKind::K8sHttpRoute),
            Self::K8sGrpcRoute(_) => Some(ObjectKind::K8sGrpcRoute),
            Self::K8sReferenceGrant(_) => Some(ObjectKind::K8sReferenceGrant),
        }
    }

    /// The identity of a validated object. Namespaces and service accounts
    /// have none.
    pub fn key(&self, cluster: &str) -> Option<Result<ValidationKey, KeyError>> {
        let key = match self {
            Self::Namespace(_) | Self::ServiceAccount(_) => return None,
            Self::Service(o) => o.try_key(cluster),
            Self::Workload(o) => o.try_key(cluster),
            Self::VirtualService(o) => o.try_key(cluster),
            Self::DestinationRule(o) => o.try_key(cluster),
            Self::Gateway(o) => o.try_key(cluster),
            Self::Sidecar(o) => o.try_key(cluster),
            Self::ServiceEntry(o) => o.try_key(cluster),
            Self::WorkloadEntry(o) => o.try_key(cluster),
            Self::WorkloadGroup(o) => o.try_key(cluster),
            Self::PeerAuthentication(o) => o.try_key(cluster),
            Self::RequestAuthentication(o) => o.try_key(cluster),
            Self::AuthorizationPolicy(o) => o.try_key(cluster),
            Self::K8sGateway(o) => o.try_key(cluster),
            Self::K8sHttpRoute(o) => o.try_key(cluster),
            Self::K8sGrpcRoute(o) => o.try_key(cluster),
            Self::K8sReferenceGrant(o) => o.try_key(cluster),
        };
        Some(key)
    }
}
