use crate::{registry::Checker, ConfigObject, Context};
use k8s::{Selector, Service, Workload};
use k8s_openapi::{api::core::v1::ServicePort, apimachinery::pkg::util::intstr::IntOrString};
use kube::Resource;
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

/// Protocols the mesh recognizes in port names and `appProtocol`.
const PROTOCOLS: &[&str] = &[
    "grpc", "grpc-web", "http", "http2", "https", "mongo", "mysql", "redis", "tcp", "tls", "udp",
];

/// Services managed by gateways and waypoints are configured by the mesh
/// itself.
const EXEMPT_LABELS: &[&str] = &[
    "gateway.istio.io/managed",
    "gateway.networking.k8s.io/gateway-name",
    "istio.io/waypoint-for",
];

pub(crate) fn checkers() -> Vec<Checker> {
    vec![Checker::object("portmapping", port_mappings)]
}

fn port_mappings(svc: &Service, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if svc.namespace() == ctx.config.root_namespace || is_exempt(svc) {
        return (vec![], true);
    }
    let spec = match svc.spec.as_ref() {
        Some(spec) => spec,
        None => return (vec![], true),
    };

    let selector = Selector::from_map(spec.selector.clone().unwrap_or_default());
    let workloads = ctx
        .snapshot
        .workloads_in(svc.namespace())
        .filter(|w| selector.matches(&w.labels))
        .collect::<Vec<_>>();
    let has_sidecar = workloads.iter().any(|w| w.istio_sidecar);

    let mut checks = Vec::new();
    for (i, port) in spec.ports.iter().flatten().enumerate() {
        let path = format!("spec/ports[{}]", i);
        if has_sidecar {
            if port.name.as_deref().map_or(false, |n| !is_protocol_name(n)) {
                checks.push(Check::new(MessageId::PortNameMismatch, &path));
            }
            if port.app_protocol.as_deref().map_or(false, |p| !is_protocol(p)) {
                checks.push(Check::new(MessageId::PortAppProtocolMismatch, &path));
            }
        }
        if !workloads.is_empty() && !is_exposed(port, &workloads) {
            checks.push(Check::new(MessageId::ServiceDeploymentPortMismatch, path));
        }
    }

    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

fn is_exempt(svc: &Service) -> bool {
    svc.meta()
        .labels
        .as_ref()
        .map_or(false, |labels| EXEMPT_LABELS.iter().any(|l| labels.contains_key(*l)))
}

fn is_protocol(name: &str) -> bool {
    PROTOCOLS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

/// `<protocol>` or `<protocol>-<suffix>`.
fn is_protocol_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    PROTOCOLS.iter().any(|p| {
        name == *p
            || name
                .strip_prefix(p)
                .map_or(false, |rest| rest.starts_with('-'))
    })
}

/// Whether some workload exposes the port the service targets.
fn is_exposed(port: &ServicePort, workloads: &[&Workload]) -> bool {
    let mut container_ports = workloads.iter().flat_map(|w| w.ports.iter());
    match port.target_port.as_ref() {
        Some(IntOrString::String(name)) => {
            container_ports.any(|cp| cp.name.as_deref() == Some(name.as_str()))
        }
        Some(IntOrString::Int(number)) => container_ports.any(|cp| cp.port == *number),
        None => container_ports.any(|cp| cp.port == port.port),
    }
}
