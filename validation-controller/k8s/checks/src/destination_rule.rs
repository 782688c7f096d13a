use crate::{
    export_to,
    host::{self, Host},
    registry::Checker,
    ConfigObject, Context,
};
use k8s::{
    networking::{destination_rule::TlsMode, DestinationRule},
    security::peer_authentication::MtlsMode,
    Labels, Selector,
};
use mesh_validation_core::{Check, MessageId, Severity, Validation, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::{BTreeMap, BTreeSet};

const TLS_MODE_PATH: &str = "spec/trafficPolicy/tls/mode";

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("exportto", export_to::namespaces_exist::<DestinationRule>),
        Checker::object("nodest", no_dest),
        Checker::object("disabledmtls", disabled_namespace_mtls),
        Checker::object("mtlspolicy", mtls_without_policy),
        Checker::group("multimatch", multi_match),
        Checker::group("trafficpolicy", traffic_policy),
    ]
}

/// The host must resolve, and every subset must select some workload of
/// the host's service, or some endpoint of a mesh-internal service entry
/// for the host.
fn no_dest(dr: &DestinationRule, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let mut checks = Vec::new();

    if !hosts.resolves(&dr.spec.host, dr.namespace()) {
        checks.push(Check::new(MessageId::DrNoDestination, "spec/host"));
    }

    let service = hosts.service(&dr.spec.host, dr.namespace());
    let endpoints = internal_endpoints(dr, ctx);
    for (i, subset) in dr.spec.subsets.iter().enumerate() {
        let path = format!("spec/subsets[{}]", i);
        if subset.labels.is_empty() {
            checks.push(
                Check::new(MessageId::DrSubsetNoLabels, path).with_severity(Severity::Unknown),
            );
            continue;
        }

        let subset_selector = Selector::from_map(subset.labels.clone());
        let found = match service {
            Some(svc) => {
                let svc_selector = Selector::from_map(
                    svc.spec
                        .as_ref()
                        .and_then(|s| s.selector.clone())
                        .unwrap_or_default(),
                );
                ctx.snapshot.workloads_in(svc.namespace()).any(|w| {
                    (svc_selector.is_empty() || svc_selector.matches(&w.labels))
                        && subset_selector.matches(&w.labels)
                })
            }
            None if !endpoints.is_empty() => endpoints
                .iter()
                .any(|labels| subset_selector.matches(labels)),
            None => continue,
        };
        if !found {
            let severity = if routed_subset(dr, &subset.name, ctx) {
                Severity::Error
            } else {
                Severity::Unknown
            };
            checks.push(Check::new(MessageId::DrSubsetLabels, path).with_severity(severity));
        }
    }

    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

/// Endpoint labels of the mesh-internal service entries visible from `dr`
/// that declare its host.
fn internal_endpoints(dr: &DestinationRule, ctx: &Context<'_>) -> Vec<Labels> {
    let hosts = ctx.hosts();
    let fqdn = hosts.fqdn(&dr.spec.host, dr.namespace());
    ctx.snapshot
        .service_entries
        .iter()
        .filter(|se| se.spec.is_mesh_internal() && ctx.is_visible(*se, dr.namespace()))
        .filter(|se| {
            se.spec
                .hosts
                .iter()
                .any(|h| hosts.fqdn(h, se.namespace()) == fqdn)
        })
        .flat_map(|se| se.spec.endpoints.iter())
        .map(|ep| Labels::from(ep.labels.clone()))
        .collect()
}

/// Whether a virtual service that can see `dr` routes to one of its subsets.
fn routed_subset(dr: &DestinationRule, subset: &str, ctx: &Context<'_>) -> bool {
    let hosts = ctx.hosts();
    let host = hosts.fqdn(&dr.spec.host, dr.namespace());
    ctx.snapshot
        .virtual_services
        .iter()
        .filter(|vs| ctx.mutually_visible(*vs, dr))
        .flat_map(|vs| {
            vs.spec
                .routes()
                .flat_map(|(_, _, route)| route.iter())
                .map(move |d| (vs, &d.destination))
        })
        .any(|(vs, dest)| {
            dest.subset.as_deref() == Some(subset)
                && hosts.fqdn(&dest.host, vs.namespace()) == host
        })
}

/// A namespace-wide rule disabling TLS contradicts a STRICT peer
/// authentication for that namespace or, when the namespace has none, for
/// the mesh.
fn disabled_namespace_mtls(dr: &DestinationRule, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if dr.spec.tls_mode() != Some(TlsMode::Disable) {
        return (vec![], true);
    }
    let mtls = ctx.mtls();

    let check = if ctx.config.is_mesh_wildcard(&dr.spec.host) {
        (mtls.mesh_mode() == Some(MtlsMode::Strict))
            .then(|| Check::new(MessageId::DrMeshPolicyMtlsEnabled, TLS_MODE_PATH))
    } else if let Some(ns) = ctx.config.namespace_of_wildcard(&dr.spec.host) {
        match mtls.namespace_mode(ns) {
            Some(MtlsMode::Strict) => Some(Check::new(MessageId::DrPolicyMtlsEnabled, TLS_MODE_PATH)),
            None if mtls.mesh_mode() == Some(MtlsMode::Strict) => {
                Some(Check::new(MessageId::DrMeshPolicyMtlsEnabled, TLS_MODE_PATH))
            }
            _ => None,
        }
    } else {
        None
    };

    match check {
        Some(c) => (vec![c], false),
        None => (vec![], true),
    }
}

/// A rule enabling `ISTIO_MUTUAL` mesh-wide or namespace-wide needs a peer
/// authentication accepting mTLS at that scope.
fn mtls_without_policy(dr: &DestinationRule, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if ctx.config.auto_mtls || dr.spec.tls_mode() != Some(TlsMode::IstioMutual) {
        return (vec![], true);
    }
    let mtls = ctx.mtls();
    let enables = |mode: Option<MtlsMode>| mode.map_or(false, |m| m.enables_mtls());

    let check = if ctx.config.is_mesh_wildcard(&dr.spec.host) {
        (!enables(mtls.mesh_mode()))
            .then(|| Check::new(MessageId::DrMeshPolicyMissing, TLS_MODE_PATH))
    } else if let Some(ns) = ctx.config.namespace_of_wildcard(&dr.spec.host) {
        (!enables(mtls.namespace_mode(ns)) && !enables(mtls.mesh_mode()))
            .then(|| Check::new(MessageId::DrNamespacePolicyMissing, TLS_MODE_PATH))
    } else {
        None
    };

    match check {
        Some(c) => (vec![c], false),
        None => (vec![], true),
    }
}

/// Flags mutually visible rules whose hosts overlap and that declare a
/// common subset. A rule without subsets covers every subset of its host.
/// Mesh-wide and namespace-wide rules enabling `ISTIO_MUTUAL` only set the
/// TLS default and never conflict.
fn multi_match(ctx: &Context<'_>) -> Validations {
    let hosts = ctx.hosts();
    let rules = ctx
        .snapshot
        .destination_rules
        .iter()
        .filter(|dr| !is_mtls_default(dr, ctx))
        .collect::<Vec<_>>();

    let targets = rules
        .iter()
        .map(|dr| {
            let host = hosts.fqdn(&dr.spec.host, dr.namespace());
            let subsets = dr
                .spec
                .subsets
                .iter()
                .map(|s| s.name.as_str())
                .collect::<BTreeSet<_>>();
            (host, subsets)
        })
        .collect::<Vec<_>>();

    let mut conflicts = BTreeMap::<usize, BTreeSet<usize>>::new();
    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            let (host_a, subsets_a) = &targets[i];
            let (host_b, subsets_b) = &targets[j];
            if !host::overlaps(host_a, host_b) {
                continue;
            }
            let whole_host = subsets_a.is_empty() || subsets_b.is_empty();
            if !whole_host && subsets_a.is_disjoint(subsets_b) {
                continue;
            }
            if ctx.mutually_visible(rules[i], rules[j]) {
                conflicts.entry(i).or_default().insert(j);
                conflicts.entry(j).or_default().insert(i);
            }
        }
    }

    conflicts
        .into_iter()
        .map(|(i, refs)| {
            let validation =
                Validation::new(vec![Check::new(MessageId::DrMultiMatch, "spec/host")], true)
                    .with_references(refs.into_iter().map(|j| ctx.key(rules[j])));
            (ctx.key(rules[i]), validation)
        })
        .collect()
}

fn is_mtls_default(dr: &DestinationRule, ctx: &Context<'_>) -> bool {
    dr.spec.tls_mode() == Some(TlsMode::IstioMutual)
        && (ctx.config.is_mesh_wildcard(&dr.spec.host)
            || ctx.config.namespace_of_wildcard(&dr.spec.host).is_some())
}

/// A rule for a specific in-cluster host replaces the traffic policy of
/// broader rules. When a broader rule enables mTLS and this one sets no TLS,
/// mTLS is silently dropped for the host.
fn traffic_policy(ctx: &Context<'_>) -> Validations {
    let hosts = ctx.hosts();
    let mtls = ctx.mtls();
    let rules = &ctx.snapshot.destination_rules;

    let mut validations = Validations::new();
    for dr in rules {
        if dr.spec.has_tls_settings() {
            continue;
        }
        let host_ns = match hosts.parse(&dr.spec.host, dr.namespace()) {
            Host::Service { namespace, .. } => namespace,
            _ => continue,
        };

        let enabling = mtls
            .mesh_rules()
            .chain(mtls.namespace_rules(&host_ns))
            .map(|r| ctx.key(r))
            .collect::<Vec<_>>();
        if enabling.is_empty() {
            continue;
        }

        let fqdn = hosts.fqdn(&dr.spec.host, dr.namespace());
        let same_host = rules
            .iter()
            .filter(|other| other.spec.has_tls_settings())
            .filter(|other| hosts.fqdn(&other.spec.host, other.namespace()) == fqdn)
            .map(|other| ctx.key(other));

        let validation = Validation::new(
            vec![Check::new(MessageId::DrNoTlsSettings, "spec/trafficPolicy")],
            true,
        )
        .with_references(enabling.into_iter().chain(same_host));
        validations.insert(ctx.key(dr), validation);
    }
    validations
}
