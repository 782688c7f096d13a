use crate::{registry::Checker, selector, ConfigObject, Context};
use k8s::security::{peer_authentication::MtlsMode, AuthorizationPolicy};
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

const HTTP_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object(
            "workloadselector",
            selector::workload_not_found::<AuthorizationPolicy>,
        ),
        Checker::object("namespacemethod", namespaces_and_methods),
        Checker::object("principals", principals),
        Checker::object("nohost", no_host),
        Checker::object("mtls", mtls_enabled),
    ]
}

fn verdict(checks: Vec<Check>) -> (Vec<Check>, bool) {
    let valid = !checks.iter().any(Check::is_error);
    (checks, valid)
}

/// Source namespaces must exist and operation methods must be HTTP verbs or
/// gRPC paths.
fn namespaces_and_methods(ap: &AuthorizationPolicy, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let mut checks = Vec::new();
    for (i, rule) in ap.spec.rules.iter().enumerate() {
        for (j, from) in rule.from.iter().enumerate() {
            for (k, ns) in from.source.namespaces.iter().enumerate() {
                if ns.contains('*') || ctx.snapshot.has_namespace(ns) {
                    continue;
                }
                checks.push(Check::new(
                    MessageId::AuthzSourceNamespaceNotFound,
                    format!("spec/rules[{}]/from[{}]/source/namespaces[{}]", i, j, k),
                ));
            }
        }

        for (j, to) in rule.to.iter().enumerate() {
            for (k, method) in to.operation.methods.iter().enumerate() {
                if HTTP_METHODS.contains(&method.as_str()) || method.starts_with('/') {
                    continue;
                }
                checks.push(Check::new(
                    MessageId::AuthzWrongMethod,
                    format!("spec/rules[{}]/to[{}]/operation/methods[{}]", i, j, k),
                ));
            }
        }
    }
    verdict(checks)
}

/// Principals of the form `<trust-domain>/ns/<ns>/sa/<sa>` must name a
/// known service account in the local trust domain.
fn principals(ap: &AuthorizationPolicy, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let mut checks = Vec::new();
    for (i, rule) in ap.spec.rules.iter().enumerate() {
        for (j, from) in rule.from.iter().enumerate() {
            for (k, principal) in from.source.principals.iter().enumerate() {
                if principal.contains('*') {
                    continue;
                }
                let parts = principal.split('/').collect::<Vec<_>>();
                let (domain, ns, sa) = match parts.as_slice() {
                    [domain, "ns", ns, "sa", sa] => (*domain, *ns, *sa),
                    _ => continue,
                };
                let path = format!("spec/rules[{}]/from[{}]/source/principals[{}]", i, j, k);
                if domain != ctx.config.trust_domain {
                    checks.push(Check::new(MessageId::AuthzPrincipalRemote, path));
                } else if !ctx.snapshot.has_service_account(ns, sa) {
                    checks.push(Check::new(MessageId::AuthzPrincipalNotFound, path));
                }
            }
        }
    }
    verdict(checks)
}

/// Operation hosts must resolve. Namespace wildcards can only be checked for
/// the policy's own namespace.
fn no_host(ap: &AuthorizationPolicy, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let own_ns = ap.namespace();

    let mut checks = Vec::new();
    for (i, rule) in ap.spec.rules.iter().enumerate() {
        for (j, to) in rule.to.iter().enumerate() {
            for (k, host) in to.operation.hosts.iter().enumerate() {
                let path = format!("spec/rules[{}]/to[{}]/operation/hosts[{}]", i, j, k);
                let host = strip_port(host);
                if host == "*" {
                    continue;
                }

                if let Some(ns) = wildcard_namespace(host, ctx) {
                    if ns != own_ns {
                        checks.push(Check::new(MessageId::UnableCrossNamespace, path));
                    }
                    continue;
                }

                if !hosts.resolves_with_routes(host, own_ns) {
                    checks.push(Check::new(MessageId::AuthzNoDestination, path));
                }
            }
        }
    }
    verdict(checks)
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => h,
        _ => host,
    }
}

/// The namespace of a `*.<ns>` or `*.<ns>.svc.<domain>` host.
fn wildcard_namespace<'h>(host: &'h str, ctx: &Context<'_>) -> Option<&'h str> {
    if let Some(ns) = ctx.config.namespace_of_wildcard(host) {
        return Some(ns);
    }
    host.strip_prefix("*.").filter(|rest| !rest.contains('.'))
}

/// Source principals and namespaces are only known to the proxy when the
/// connection uses mutual TLS.
fn mtls_enabled(ap: &AuthorizationPolicy, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let ns = ap.namespace();
    let mtls = ctx.mtls();
    let enabled = if ctx.config.auto_mtls {
        mtls.effective_mode(ns, None) != MtlsMode::Disable
    } else {
        mtls.effective_mode(ns, None).enables_mtls() && mtls.namespace_enabled_by_rule(ns)
    };
    if enabled {
        return (vec![], true);
    }

    let mut checks = Vec::new();
    for (i, rule) in ap.spec.rules.iter().enumerate() {
        for (j, from) in rule.from.iter().enumerate() {
            if !from.source.principals.is_empty() {
                checks.push(Check::new(
                    MessageId::AuthzMtlsNeeded,
                    format!("spec/rules[{}]/from[{}]/source/principals", i, j),
                ));
            }
            if !from.source.namespaces.is_empty() {
                checks.push(Check::new(
                    MessageId::AuthzMtlsNeeded,
                    format!("spec/rules[{}]/from[{}]/source/namespaces", i, j),
                ));
            }
        }
    }
    verdict(checks)
}
