mod host;
mod k8s_route;
mod mtls;

use crate::{Context, Registry, Snapshot, ValidationConfig};
use k8s::{
    gateway::{K8sGateway, K8sGatewaySpec},
    networking::{
        destination_rule::{ClientTlsSettings, Subset, TlsMode, TrafficPolicy},
        virtual_service::{Destination, HttpRoute, RouteDestination, TcpRoute},
        DestinationRule, DestinationRuleSpec, VirtualService, VirtualServiceSpec, WorkloadSelector,
    },
    security::{
        peer_authentication::{MtlsMode, PeerMtls},
        AuthorizationPolicy, AuthorizationPolicySpec, PeerAuthentication, PeerAuthenticationSpec,
        PolicySelector,
    },
    ContainerPort, Labels, Namespace, ObjectMeta, Selector, Service, Workload,
};
use k8s_openapi::api::core::v1::{ServicePort, ServiceSpec};
use mesh_validation_core::{Check, MessageId, ObjectKind, Severity, Validation, ValidationKey, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::BTreeMap;

pub fn mk_meta(ns: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        namespace: Some(ns.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn mk_labels(labels: &[(&str, &str)]) -> BTreeMap<String, String> {
    labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn mk_selector(labels: &[(&str, &str)]) -> Selector {
    Selector::from_map(mk_labels(labels))
}

pub fn mk_namespaces(names: &[&str]) -> Vec<Namespace> {
    names.iter().map(|n| Namespace::from(*n)).collect()
}

pub fn mk_workload(ns: &str, name: &str, labels: &[(&str, &str)]) -> Workload {
    Workload::new(ns, name, Labels::from(mk_labels(labels)))
}

pub fn mk_sidecar_workload(ns: &str, name: &str, labels: &[(&str, &str)], port: i32) -> Workload {
    mk_workload(ns, name, labels)
        .with_sidecar()
        .with_ports(Some(ContainerPort::new(None, port)))
}

pub fn mk_service(ns: &str, name: &str) -> Service {
    mk_service_with_ports(ns, name, &[("app", name)], vec![])
}

pub fn mk_service_with_ports(
    ns: &str,
    name: &str,
    selector: &[(&str, &str)],
    ports: Vec<ServicePort>,
) -> Service {
    Service {
        metadata: mk_meta(ns, name),
        spec: Some(ServiceSpec {
            selector: Some(mk_labels(selector)),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn mk_port(name: Option<&str>, port: i32) -> ServicePort {
    ServicePort {
        name: name.map(Into::into),
        port,
        ..Default::default()
    }
}

pub fn mk_virtual_service(ns: &str, name: &str, spec: VirtualServiceSpec) -> VirtualService {
    VirtualService {
        metadata: mk_meta(ns, name),
        spec,
    }
}

pub fn mk_route(destinations: &[(&str, Option<&str>, Option<i32>)]) -> Vec<RouteDestination> {
    destinations
        .iter()
        .map(|(host, subset, weight)| RouteDestination {
            destination: Destination {
                host: host.to_string(),
                subset: subset.map(Into::into),
            },
            weight: *weight,
        })
        .collect()
}

pub fn mk_http_route(destinations: &[(&str, Option<&str>, Option<i32>)]) -> HttpRoute {
    HttpRoute {
        name: None,
        route: mk_route(destinations),
    }
}

pub fn mk_tcp_route(destinations: &[(&str, Option<&str>, Option<i32>)]) -> TcpRoute {
    TcpRoute {
        route: mk_route(destinations),
    }
}

pub fn mk_destination_rule(ns: &str, name: &str, host: &str) -> DestinationRule {
    DestinationRule {
        metadata: mk_meta(ns, name),
        spec: DestinationRuleSpec {
            host: host.to_string(),
            ..Default::default()
        },
    }
}

pub fn mk_tls_destination_rule(ns: &str, name: &str, host: &str, mode: TlsMode) -> DestinationRule {
    let mut dr = mk_destination_rule(ns, name, host);
    dr.spec.traffic_policy = Some(TrafficPolicy {
        tls: Some(ClientTlsSettings { mode }),
        ..Default::default()
    });
    dr
}

pub fn mk_subset(name: &str, labels: &[(&str, &str)]) -> Subset {
    Subset {
        name: name.to_string(),
        labels: mk_labels(labels),
        traffic_policy: None,
    }
}

pub fn mk_peer_authentication(
    ns: &str,
    name: &str,
    selector: Option<&[(&str, &str)]>,
    mode: MtlsMode,
) -> PeerAuthentication {
    PeerAuthentication {
        metadata: mk_meta(ns, name),
        spec: PeerAuthenticationSpec {
            selector: selector.map(|labels| PolicySelector {
                match_labels: mk_selector(labels),
            }),
            mtls: Some(PeerMtls { mode }),
        },
    }
}

pub fn mk_authorization_policy(
    ns: &str,
    name: &str,
    selector: Option<&[(&str, &str)]>,
) -> AuthorizationPolicy {
    AuthorizationPolicy {
        metadata: mk_meta(ns, name),
        spec: AuthorizationPolicySpec {
            selector: selector.map(|labels| PolicySelector {
                match_labels: mk_selector(labels),
            }),
            ..Default::default()
        },
    }
}

pub fn mk_workload_selector(labels: &[(&str, &str)]) -> Option<WorkloadSelector> {
    Some(WorkloadSelector {
        labels: mk_selector(labels),
    })
}

pub fn mk_k8s_gateway(ns: &str, name: &str, class: &str) -> K8sGateway {
    K8sGateway {
        metadata: mk_meta(ns, name),
        spec: K8sGatewaySpec {
            gateway_class_name: class.to_string(),
            ..Default::default()
        },
    }
}

pub fn mk_key(kind: ObjectKind, ns: &str, name: &str) -> ValidationKey {
    ValidationKey {
        cluster: "Kubernetes".to_string(),
        namespace: ns.to_string(),
        kind,
        name: name.to_string(),
    }
}

/// Runs every checker registered for `kind`.
pub fn run_kind(snapshot: &Snapshot, config: &ValidationConfig, kind: ObjectKind) -> Validations {
    Registry::default().run_kind(kind, &Context::new(snapshot, config))
}

/// Returns the result for one object, failing the test if there is none.
pub fn result(validations: &Validations, kind: ObjectKind, ns: &str, name: &str) -> Validation {
    validations
        .get(&mk_key(kind, ns, name))
        .cloned()
        .unwrap_or_else(|| panic!("no result for {}/{}/{}", ns, kind, name))
}

/// Summarizes checks as `(code, severity, path)`.
pub fn findings(validation: &Validation) -> Vec<(&'static str, Severity, String)> {
    validation
        .checks
        .iter()
        .map(|c: &Check| (c.message.code(), c.severity, c.path.clone()))
        .collect()
}

pub fn finding(id: MessageId, path: &str) -> (&'static str, Severity, String) {
    (id.code(), id.default_severity(), path.to_string())
}
