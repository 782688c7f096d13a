use crate::{host, registry::Checker, ConfigObject, Context};
use k8s::networking::Gateway;
use mesh_validation_core::{Check, MessageId, Validation, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("selector", selector),
        Checker::group("multimatch", multi_match),
    ]
}

/// Gateway selectors usually target ingress workloads in another namespace,
/// unless gateways are restricted to their own namespace.
fn selector(gw: &Gateway, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let selector = &gw.spec.selector;
    if selector.is_empty() {
        return (vec![], true);
    }

    let found = ctx
        .snapshot
        .workloads
        .iter()
        .filter(|w| !ctx.config.gateway_to_namespace || w.namespace == gw.namespace())
        .any(|w| selector.matches(&w.labels));
    if found {
        return (vec![], true);
    }
    (
        vec![Check::new(MessageId::GatewaySelector, "spec/selector")],
        true,
    )
}

/// Strips the `namespace/` prefix of a server host.
fn dns_name(host: &str) -> &str {
    host.split_once('/').map_or(host, |(_, name)| name)
}

/// Flags hosts exposed on the same port by gateways with identical
/// selectors.
fn multi_match(ctx: &Context<'_>) -> Validations {
    let gateways = &ctx.snapshot.gateways;

    // gateway index -> (overlapping host paths, conflicting gateways)
    let mut conflicts = BTreeMap::<usize, (BTreeSet<(usize, usize)>, BTreeSet<usize>)>::new();
    for a in 0..gateways.len() {
        for b in (a + 1)..gateways.len() {
            let (gw_a, gw_b) = (&gateways[a], &gateways[b]);
            if gw_a.spec.selector.is_empty() || gw_a.spec.selector != gw_b.spec.selector {
                continue;
            }

            for (i, srv_a) in gw_a.spec.servers.iter().enumerate() {
                for (k, srv_b) in gw_b.spec.servers.iter().enumerate() {
                    if srv_a.port.number != srv_b.port.number {
                        continue;
                    }
                    for (j, host_a) in srv_a.hosts.iter().enumerate() {
                        for (l, host_b) in srv_b.hosts.iter().enumerate() {
                            if !host::overlaps(dns_name(host_a), dns_name(host_b)) {
                                continue;
                            }
                            let entry = conflicts.entry(a).or_default();
                            entry.0.insert((i, j));
                            entry.1.insert(b);
                            let entry = conflicts.entry(b).or_default();
                            entry.0.insert((k, l));
                            entry.1.insert(a);
                        }
                    }
                }
            }
        }
    }

    conflicts
        .into_iter()
        .map(|(g, (paths, refs))| {
            let checks = paths
                .into_iter()
                .map(|(i, j)| {
                    Check::new(
                        MessageId::GatewayMultiMatch,
                        format!("spec/servers[{}]/hosts[{}]", i, j),
                    )
                })
                .collect();
            let validation = Validation::new(checks, true)
                .with_references(refs.into_iter().map(|r| ctx.key(&gateways[r])));
            (ctx.key(&gateways[g]), validation)
        })
        .collect()
}
