use crate::{export_to, host, registry::Checker, ConfigObject, Context};
use k8s::networking::VirtualService;
use mesh_validation_core::{Check, MessageId, Severity, Validation, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("exportto", export_to::namespaces_exist::<VirtualService>),
        Checker::object("nohost", no_host),
        Checker::object("gateways", gateways),
        Checker::object("route", routes),
        Checker::object("subsetpresence", subsets),
        Checker::group("singlehost", single_host),
    ]
}

/// A gateway reference resolved to its namespace and name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GatewayRef {
    pub namespace: String,
    pub name: String,
    /// Written as `name.namespace`.
    pub old_nomenclature: bool,
}

/// Resolves a gateway reference written in an object in `ns`. Accepts
/// `ns/name`, `name`, `name.ns.svc.<domain>` and the deprecated `name.ns`.
pub(crate) fn gateway_ref(gateway: &str, ns: &str, ctx: &Context<'_>) -> GatewayRef {
    let mk = |namespace: &str, name: &str, old_nomenclature| GatewayRef {
        namespace: namespace.to_string(),
        name: name.to_string(),
        old_nomenclature,
    };

    if let Some((gw_ns, name)) = gateway.split_once('/') {
        let gw_ns = if gw_ns == "." { ns } else { gw_ns };
        return mk(gw_ns, name, false);
    }

    match ctx.hosts().parse(gateway, ns) {
        host::Host::Service { name, namespace } if gateway.contains(".svc") => {
            mk(namespace.as_str(), name.as_str(), false)
        }
        _ => match gateway.split_once('.') {
            Some((name, gw_ns)) => mk(gw_ns, name, true),
            None => mk(ns, gateway, false),
        },
    }
}

/// Every route destination host must resolve.
fn no_host(vs: &VirtualService, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let severity = if ctx.config.policy_allow_any {
        Severity::Warning
    } else {
        Severity::Error
    };

    let mut checks = Vec::new();
    for (proto, i, route) in vs.spec.routes() {
        for (j, dest) in route.iter().enumerate() {
            if !hosts.resolves(&dest.destination.host, vs.namespace()) {
                let path = format!(
                    "spec/{}[{}]/route[{}]/destination/host",
                    proto.as_str(),
                    i,
                    j
                );
                checks.push(Check::new(MessageId::VsHostNotFound, path).with_severity(severity));
            }
        }
    }
    let valid = checks.is_empty();
    (checks, valid)
}

/// Every referenced gateway other than `mesh` must exist.
fn gateways(vs: &VirtualService, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let mut checks = Vec::new();
    for (i, gateway) in vs.spec.gateways.iter().enumerate() {
        if gateway == "mesh" {
            continue;
        }
        let path = format!("spec/gateways[{}]", i);
        let gw = gateway_ref(gateway, vs.namespace(), ctx);
        if gw.old_nomenclature {
            checks.push(Check::new(MessageId::VsGatewayOldNomenclature, &path));
        }
        let exists = ctx
            .snapshot
            .gateways
            .iter()
            .any(|g| g.namespace() == gw.namespace && g.name() == gw.name);
        if !exists {
            checks.push(Check::new(MessageId::VsNoGateway, path));
        }
    }
    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

/// Flags single-destination routes with an explicit weight other than 100,
/// and host/subset pairs repeated within a route.
fn routes(vs: &VirtualService, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let mut checks = Vec::new();
    for (proto, i, route) in vs.spec.routes() {
        if let [dest] = route {
            if dest.weight.map_or(false, |w| w != 100) {
                checks.push(Check::new(
                    MessageId::VsSingleWeight,
                    format!("spec/{}[{}]/route[0]/weight", proto.as_str(), i),
                ));
            }
            continue;
        }

        let mut seen = BTreeMap::<(String, Option<&str>), Vec<usize>>::new();
        for (j, dest) in route.iter().enumerate() {
            let host = hosts.fqdn(&dest.destination.host, vs.namespace());
            seen.entry((host, dest.destination.subset.as_deref()))
                .or_default()
                .push(j);
        }
        let mut repeated = seen
            .into_values()
            .filter(|js| js.len() > 1)
            .flatten()
            .collect::<Vec<_>>();
        repeated.sort_unstable();
        for j in repeated {
            checks.push(Check::new(
                MessageId::VsRepeatedSubset,
                format!("spec/{}[{}]/route[{}]/destination", proto.as_str(), i, j),
            ));
        }
    }
    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

/// Destination subsets must be declared by a visible destination rule for
/// the destination host.
fn subsets(vs: &VirtualService, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let mut checks = Vec::new();
    for (proto, i, route) in vs.spec.routes() {
        for (j, dest) in route.iter().enumerate() {
            let subset = match dest.destination.subset.as_deref() {
                Some(s) => s,
                None => continue,
            };
            let fqdn = hosts.fqdn(&dest.destination.host, vs.namespace());
            let found = ctx
                .snapshot
                .destination_rules
                .iter()
                .filter(|dr| ctx.is_visible(*dr, vs.namespace()))
                .filter(|dr| host::covers(&hosts.fqdn(&dr.spec.host, dr.namespace()), &fqdn))
                .any(|dr| dr.spec.subsets.iter().any(|s| s.name == subset));
            if !found {
                checks.push(Check::new(
                    MessageId::VsSubsetNotFound,
                    format!("spec/{}[{}]/route[{}]/destination", proto.as_str(), i, j),
                ));
            }
        }
    }
    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

/// Flags mutually visible virtual services that route the same host through
/// a common gateway.
fn single_host(ctx: &Context<'_>) -> Validations {
    let hosts = ctx.hosts();
    let services = &ctx.snapshot.virtual_services;

    let bindings = services
        .iter()
        .map(|vs| {
            let gateways = if vs.spec.gateways.is_empty() {
                std::iter::once("mesh".to_string()).collect::<BTreeSet<_>>()
            } else {
                vs.spec
                    .gateways
                    .iter()
                    .map(|g| {
                        if g == "mesh" {
                            return g.clone();
                        }
                        let gw = gateway_ref(g, vs.namespace(), ctx);
                        format!("{}/{}", gw.namespace, gw.name)
                    })
                    .collect()
            };
            let names = vs
                .spec
                .hosts
                .iter()
                .map(|h| hosts.fqdn(h, vs.namespace()))
                .collect::<Vec<_>>();
            (gateways, names)
        })
        .collect::<Vec<_>>();

    let mut conflicts = BTreeMap::<usize, BTreeSet<usize>>::new();
    for i in 0..services.len() {
        for j in (i + 1)..services.len() {
            let (gw_a, hosts_a) = &bindings[i];
            let (gw_b, hosts_b) = &bindings[j];
            if gw_a.is_disjoint(gw_b) {
                continue;
            }
            let overlap = hosts_a
                .iter()
                .any(|a| hosts_b.iter().any(|b| host::overlaps(a, b)));
            if overlap && ctx.mutually_visible(&services[i], &services[j]) {
                conflicts.entry(i).or_default().insert(j);
                conflicts.entry(j).or_default().insert(i);
            }
        }
    }

    conflicts
        .into_iter()
        .map(|(i, refs)| {
            let validation = Validation::new(
                vec![Check::new(MessageId::VsSingleHost, "spec/hosts")],
                true,
            )
            .with_references(refs.into_iter().map(|j| ctx.key(&services[j])));
            (ctx.key(&services[i]), validation)
        })
        .collect()
}
