//! Host resolution.
//!
//! Route and rule hosts are written in several forms: a short service name,
//! `name.namespace`, a full `name.namespace.svc.<domain>` name, a wildcard or
//! an external DNS name. A host resolves when it designates (or, for
//! wildcards, covers) a known host visible from the referencing namespace.
//! Known hosts come from Kubernetes services, service entries and the mesh
//! registry.

use crate::{context::is_exported_to, ConfigObject, Context};
use k8s::Service;
use mesh_validation_k8s_api as k8s;

/// A host after expansion against the referencing object's namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Host {
    /// An in-cluster service name.
    Service { name: String, namespace: String },

    /// `*` or `*.<suffix>`.
    Wildcard(String),

    /// Anything else, matched verbatim.
    External(String),
}

#[derive(Copy, Clone, Debug)]
pub struct HostResolver<'a> {
    ctx: Context<'a>,
}

/// Whether `pattern` covers `host`. Non-wildcard patterns cover only
/// themselves; `*.suffix` covers any host (or narrower wildcard) ending in
/// `.suffix`.
pub fn covers(pattern: &str, host: &str) -> bool {
    if pattern == "*" || pattern == host {
        return true;
    }
    match pattern.strip_prefix('*') {
        Some(suffix) => host.ends_with(suffix),
        None => false,
    }
}

/// Whether two host patterns can match a common host.
pub fn overlaps(a: &str, b: &str) -> bool {
    covers(a, b) || covers(b, a)
}

// === impl Host ===

impl Host {
    pub fn fqdn(&self, ctx: &Context<'_>) -> String {
        match self {
            Self::Service { name, namespace } => ctx.config.service_fqdn(name, namespace),
            Self::Wildcard(h) | Self::External(h) => h.clone(),
        }
    }
}

// === impl HostResolver ===

impl<'a> HostResolver<'a> {
    pub(crate) fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    /// Expands `host` as written in an object in `namespace`.
    pub fn parse(&self, host: &str, namespace: &str) -> Host {
        if host.starts_with('*') {
            return Host::Wildcard(host.to_string());
        }

        fn service(name: &str, ns: &str) -> Host {
            Host::Service {
                name: name.to_string(),
                namespace: ns.to_string(),
            }
        }

        let parts = host.split('.').collect::<Vec<_>>();
        match parts.as_slice() {
            [name] => service(name, namespace),
            [name, ns] if self.ctx.snapshot.has_namespace(ns) || self.is_known_service(name, ns) => {
                service(name, ns)
            }
            [name, ns, "svc"] => service(name, ns),
            [name, ns, "svc", domain @ ..] if domain.join(".") == self.ctx.config.cluster_domain => {
                service(name, ns)
            }
            _ => Host::External(host.to_string()),
        }
    }

    /// The full name of `host` as written in an object in `namespace`.
    pub fn fqdn(&self, host: &str, namespace: &str) -> String {
        self.parse(host, namespace).fqdn(&self.ctx)
    }

    /// Whether `host`, written in an object in `namespace`, resolves to a
    /// known host visible from that namespace.
    pub fn resolves(&self, host: &str, namespace: &str) -> bool {
        self.resolves_from(host, namespace, namespace)
    }

    /// Like [`Self::resolves`], but checks visibility from `from_ns`.
    pub fn resolves_from(&self, host: &str, namespace: &str, from_ns: &str) -> bool {
        let known = self.known_hosts(from_ns);
        match self.parse(host, namespace) {
            Host::Wildcard(pattern) => {
                self.ctx.config.is_mesh_wildcard(&pattern)
                    || self
                        .ctx
                        .config
                        .namespace_of_wildcard(&pattern)
                        .map_or(false, |ns| self.ctx.snapshot.has_namespace(ns))
                    || known.iter().any(|k| overlaps(&pattern, k))
            }
            parsed => {
                let fqdn = parsed.fqdn(&self.ctx);
                known.iter().any(|k| covers(k, &fqdn))
            }
        }
    }

    /// Like [`Self::resolves`], but also accepts hosts declared by virtual
    /// services visible from `namespace`.
    pub fn resolves_with_routes(&self, host: &str, namespace: &str) -> bool {
        if self.resolves(host, namespace) {
            return true;
        }
        let fqdn = self.fqdn(host, namespace);
        self.ctx
            .snapshot
            .virtual_services
            .iter()
            .filter(|vs| self.ctx.is_visible(*vs, namespace))
            .flat_map(|vs| {
                vs.spec
                    .hosts
                    .iter()
                    .map(move |h| self.fqdn(h, vs.namespace()))
            })
            .any(|h| covers(&h, &fqdn))
    }

    /// The Kubernetes service `host` designates, if any.
    pub fn service(&self, host: &str, namespace: &str) -> Option<&'a Service> {
        match self.parse(host, namespace) {
            Host::Service { name, namespace } => self.ctx.snapshot.service(&namespace, &name),
            _ => None,
        }
    }

    /// Whether `name.ns` names a known service, visible or not.
    fn is_known_service(&self, name: &str, ns: &str) -> bool {
        let Context { snapshot, config } = self.ctx;
        let fqdn = config.service_fqdn(name, ns);
        snapshot.service(ns, name).is_some()
            || snapshot
                .service_entries
                .iter()
                .any(|se| se.spec.hosts.iter().any(|h| *h == fqdn))
            || snapshot.registry_services.iter().any(|rs| rs.hostname == fqdn)
    }

    /// Every host name visible from `from_ns`. Service entry hosts may be
    /// wildcards.
    fn known_hosts(&self, from_ns: &str) -> Vec<String> {
        let Context { snapshot, config } = self.ctx;

        let services = snapshot
            .services
            .iter()
            .filter(|svc| self.ctx.is_visible(*svc, from_ns))
            .map(|svc| config.service_fqdn(svc.name(), svc.namespace()));

        let entries = snapshot
            .service_entries
            .iter()
            .filter(|se| self.ctx.is_visible(*se, from_ns))
            .flat_map(|se| {
                se.spec.hosts.iter().map(move |h| {
                    if h.contains('.') || h.starts_with('*') {
                        h.clone()
                    } else {
                        config.service_fqdn(h, se.namespace())
                    }
                })
            });

        let registry = snapshot
            .registry_services
            .iter()
            .filter(|rs| rs.cluster.as_deref().map_or(true, |c| c == config.cluster))
            .filter(|rs| {
                let export_to = rs.export_to.iter().map(String::as_str).collect::<Vec<_>>();
                is_exported_to(&rs.namespace, &export_to, from_ns)
            })
            .map(|rs| rs.hostname.clone());

        services.chain(entries).chain(registry).collect()
    }
}
