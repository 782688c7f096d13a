//! Gateway API routes.

use crate::{registry::Checker, ConfigObject, Context};
use k8s::gateway::{BackendRef, K8sGrpcRoute, K8sHttpRoute, ParentReference};
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

/// The parts of a route the checkers inspect.
trait Route: ConfigObject + Sized {
    /// The kind named in reference grants.
    const GRANT_KIND: &'static str;

    fn parent_refs(&self) -> &[ParentReference];

    /// `(rule index, backend index, backend)`
    fn backend_refs(&self) -> Vec<(usize, usize, &BackendRef)>;
}

pub(crate) fn http_checkers() -> Vec<Checker> {
    vec![
        Checker::object("parentrefs", parent_refs::<K8sHttpRoute>),
        Checker::object("backendrefs", backend_refs::<K8sHttpRoute>),
    ]
}

pub(crate) fn grpc_checkers() -> Vec<Checker> {
    vec![
        Checker::object("parentrefs", parent_refs::<K8sGrpcRoute>),
        Checker::object("backendrefs", backend_refs::<K8sGrpcRoute>),
    ]
}

/// Gateway parents must exist in their namespace, which defaults to the
/// route's.
fn parent_refs<R: Route>(route: &R, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let checks = route
        .parent_refs()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.targets_gateway())
        .filter(|(_, p)| {
            let ns = p.namespace.as_deref().unwrap_or_else(|| route.namespace());
            !ctx.snapshot
                .k8s_gateways
                .iter()
                .any(|gw| gw.namespace() == ns && gw.name() == p.name)
        })
        .map(|(i, _)| {
            Check::new(
                MessageId::RouteNoK8sGateway,
                format!("spec/parentRefs[{}]/name", i),
            )
        })
        .collect::<Vec<_>>();
    let valid = checks.is_empty();
    (checks, valid)
}

/// Service backends must exist. A backend in another namespace also needs a
/// reference grant there.
fn backend_refs<R: Route>(route: &R, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let route_ns = route.namespace();
    let mut checks = Vec::new();
    for (i, j, backend) in route.backend_refs() {
        if !backend.targets_service() {
            continue;
        }
        let ns = backend.namespace.as_deref().unwrap_or(route_ns);
        let granted = ns == route_ns
            || ctx
                .snapshot
                .k8s_reference_grants
                .iter()
                .filter(|g| g.namespace() == ns)
                .any(|g| g.spec.allows_service(R::GRANT_KIND, route_ns, &backend.name));
        if !granted || !service_exists(&backend.name, ns, ctx) {
            checks.push(Check::new(
                MessageId::RouteBackendNotFound,
                format!("spec/rules[{}]/backendRefs[{}]/name", i, j),
            ));
        }
    }
    let valid = checks.is_empty();
    (checks, valid)
}

fn service_exists(name: &str, ns: &str, ctx: &Context<'_>) -> bool {
    if ctx.snapshot.service(ns, name).is_some() {
        return true;
    }
    let fqdn = ctx.config.service_fqdn(name, ns);
    ctx.snapshot
        .registry_services
        .iter()
        .filter(|rs| rs.cluster.as_deref().map_or(true, |c| c == ctx.config.cluster))
        .any(|rs| rs.hostname == fqdn)
}

// === impl Route ===

impl Route for K8sHttpRoute {
    const GRANT_KIND: &'static str = "HTTPRoute";

    fn parent_refs(&self) -> &[ParentReference] {
        &self.spec.parent_refs
    }

    fn backend_refs(&self) -> Vec<(usize, usize, &BackendRef)> {
        self.spec
            .rules
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.backend_refs.iter().enumerate().map(move |(j, b)| (i, j, b)))
            .collect()
    }
}

impl Route for K8sGrpcRoute {
    const GRANT_KIND: &'static str = "GRPCRoute";

    fn parent_refs(&self) -> &[ParentReference] {
        &self.spec.parent_refs
    }

    fn backend_refs(&self) -> Vec<(usize, usize, &BackendRef)> {
        self.spec
            .rules
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.backend_refs.iter().enumerate().map(move |(j, b)| (i, j, b)))
            .collect()
    }
}
