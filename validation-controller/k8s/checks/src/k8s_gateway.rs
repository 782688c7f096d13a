use crate::{registry::Checker, Context};
use k8s::gateway::K8sGateway;
use mesh_validation_core::{Check, MessageId, Validation, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("gatewayclass", gateway_class),
        Checker::object("uniquelistener", unique_listeners),
        Checker::group("multimatch", multi_match),
    ]
}

fn gateway_class(gw: &K8sGateway, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if ctx
        .config
        .gateway_classes
        .iter()
        .any(|c| *c == gw.spec.gateway_class_name)
    {
        return (vec![], true);
    }
    (
        vec![Check::new(
            MessageId::K8sGatewayClassNotFound,
            "spec/gatewayClassName",
        )],
        false,
    )
}

/// Listeners within one gateway must differ in hostname, port or protocol.
fn unique_listeners(gw: &K8sGateway, _: &Context<'_>) -> (Vec<Check>, bool) {
    let mut by_binding = BTreeMap::<_, Vec<usize>>::new();
    for (i, l) in gw.spec.listeners.iter().enumerate() {
        by_binding
            .entry((l.hostname.as_deref(), l.port, l.protocol.as_str()))
            .or_default()
            .push(i);
    }

    let mut duplicates = by_binding
        .into_values()
        .filter(|ls| ls.len() > 1)
        .flatten()
        .collect::<Vec<_>>();
    duplicates.sort_unstable();

    let checks = duplicates
        .into_iter()
        .map(|i| {
            Check::new(
                MessageId::K8sGatewayUniqueListener,
                format!("spec/listeners[{}]", i),
            )
        })
        .collect::<Vec<_>>();
    let valid = checks.is_empty();
    (checks, valid)
}

/// Flags gateways that share a listener port and hostname, or an address.
fn multi_match(ctx: &Context<'_>) -> Validations {
    let gateways = &ctx.snapshot.k8s_gateways;

    // gateway index -> (paths, conflicting gateways)
    let mut conflicts = BTreeMap::<usize, (BTreeSet<(MessageId, String)>, BTreeSet<usize>)>::new();
    let mut flag = |g: usize, other: usize, message: MessageId, path: String| {
        let entry = conflicts.entry(g).or_default();
        entry.0.insert((message, path));
        entry.1.insert(other);
    };

    for a in 0..gateways.len() {
        for b in (a + 1)..gateways.len() {
            let (gw_a, gw_b) = (&gateways[a].spec, &gateways[b].spec);

            for (i, la) in gw_a.listeners.iter().enumerate() {
                for (k, lb) in gw_b.listeners.iter().enumerate() {
                    if la.port == lb.port && la.hostname == lb.hostname {
                        let message = MessageId::K8sGatewayListenerMultiMatch;
                        flag(a, b, message, format!("spec/listeners[{}]/hostname", i));
                        flag(b, a, message, format!("spec/listeners[{}]/hostname", k));
                    }
                }
            }

            for (i, aa) in gw_a.addresses.iter().enumerate() {
                for (k, ab) in gw_b.addresses.iter().enumerate() {
                    if aa.value == ab.value && aa.address_type() == ab.address_type() {
                        let message = MessageId::K8sGatewayAddressMultiMatch;
                        flag(a, b, message, format!("spec/addresses[{}]", i));
                        flag(b, a, message, format!("spec/addresses[{}]", k));
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
                .map(|(message, path)| Check::new(message, path))
                .collect();
            let validation = Validation::new(checks, true)
                .with_references(refs.into_iter().map(|r| ctx.key(&gateways[r])));
            (ctx.key(&gateways[g]), validation)
        })
        .collect()
}
