//! Effective mutual TLS posture.
//!
//! Peer authentication is declared at three scopes: mesh-wide (root
//! namespace, no selector), namespace-wide (no selector) and per workload
//! (selector). The most specific scope with a set mode wins. Destination
//! rules enable client-side mTLS with `ISTIO_MUTUAL`, either mesh-wide (a
//! mesh wildcard host) or namespace-wide (`*.<ns>.svc.<domain>`).

use crate::{ConfigObject, Context};
use k8s::{
    networking::{destination_rule::TlsMode, DestinationRule},
    security::{peer_authentication::MtlsMode, PeerAuthentication},
    Workload,
};
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

#[derive(Copy, Clone, Debug)]
pub struct MtlsResolver<'a> {
    ctx: Context<'a>,
}

/// The scope a peer authentication applies at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Mesh,
    Namespace,
    Workload,
}

// === impl MtlsResolver ===

impl<'a> MtlsResolver<'a> {
    pub(crate) fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    pub fn scope(&self, pa: &PeerAuthentication) -> Scope {
        let selector_less = pa
            .spec
            .selector
            .as_ref()
            .map_or(true, |s| s.match_labels.is_empty());
        match (selector_less, pa.namespace() == self.ctx.config.root_namespace) {
            (true, true) => Scope::Mesh,
            (true, false) => Scope::Namespace,
            (false, _) => Scope::Workload,
        }
    }

    /// The mode of the mesh-wide peer authentication, if one exists.
    pub fn mesh_mode(&self) -> Option<MtlsMode> {
        self.ctx
            .snapshot
            .peer_authentications
            .iter()
            .find(|pa| self.scope(pa) == Scope::Mesh)
            .map(|pa| pa.spec.mode())
    }

    /// The mode of the namespace-wide peer authentication in `ns`, if one
    /// exists.
    pub fn namespace_mode(&self, ns: &str) -> Option<MtlsMode> {
        if ns == self.ctx.config.root_namespace {
            return self.mesh_mode();
        }
        self.ctx
            .snapshot
            .peer_authentications
            .iter()
            .find(|pa| pa.namespace() == ns && self.scope(pa) == Scope::Namespace)
            .map(|pa| pa.spec.mode())
    }

    pub fn workload_mode(&self, workload: &Workload) -> Option<MtlsMode> {
        self.ctx
            .snapshot
            .peer_authentications
            .iter()
            .filter(|pa| pa.namespace() == workload.namespace)
            .filter(|pa| self.scope(pa) == Scope::Workload)
            .find(|pa| {
                pa.spec
                    .selector
                    .as_ref()
                    .map_or(false, |s| s.match_labels.matches(&workload.labels))
            })
            .map(|pa| pa.spec.mode())
    }

    /// Resolves the mode that applies to `ns`, or to a workload within it.
    /// `UNSET` at every scope resolves to `UNSET`.
    pub fn effective_mode(&self, ns: &str, workload: Option<&Workload>) -> MtlsMode {
        let set = |m: &MtlsMode| *m != MtlsMode::Unset;
        workload
            .and_then(|w| self.workload_mode(w))
            .filter(set)
            .or_else(|| self.namespace_mode(ns).filter(set))
            .or_else(|| self.mesh_mode().filter(set))
            .unwrap_or_default()
    }

    /// Destination rules enabling mTLS for every host in the mesh.
    pub fn mesh_rules(&self) -> impl Iterator<Item = &'a DestinationRule> + 'a {
        let ctx = self.ctx;
        ctx.snapshot
            .destination_rules
            .iter()
            .filter(move |dr| ctx.config.is_mesh_wildcard(&dr.spec.host))
            .filter(|dr| dr.spec.tls_mode() == Some(TlsMode::IstioMutual))
    }

    /// Destination rules enabling mTLS for every host in `ns`.
    pub fn namespace_rules(&self, ns: &str) -> impl Iterator<Item = &'a DestinationRule> + 'a {
        let ctx = self.ctx;
        let ns = ns.to_string();
        ctx.snapshot
            .destination_rules
            .iter()
            .filter(move |dr| ctx.config.namespace_of_wildcard(&dr.spec.host) == Some(&*ns))
            .filter(|dr| dr.spec.tls_mode() == Some(TlsMode::IstioMutual))
    }

    pub fn mesh_enabled_by_rule(&self) -> bool {
        self.mesh_rules().next().is_some()
    }

    pub fn namespace_enabled_by_rule(&self, ns: &str) -> bool {
        self.mesh_enabled_by_rule() || self.namespace_rules(ns).next().is_some()
    }

    /// A STRICT peer authentication requires a destination rule enabling
    /// mTLS at the same (or a broader) scope. Not evaluated under auto mTLS.
    pub fn missing_rule(&self, pa: &PeerAuthentication) -> Option<Check> {
        if self.ctx.config.auto_mtls || pa.spec.mode() != MtlsMode::Strict {
            return None;
        }

        match self.scope(pa) {
            Scope::Mesh if !self.mesh_enabled_by_rule() => {
                Some(Check::new(MessageId::MeshPaDrMissing, "spec/mtls"))
            }
            Scope::Namespace if !self.namespace_enabled_by_rule(pa.namespace()) => {
                Some(Check::new(MessageId::NamespacePaDrMissing, "spec/mtls"))
            }
            Scope::Workload
                if !self.namespace_enabled_by_rule(pa.namespace())
                    && !self.host_rule_in(pa.namespace()) =>
            {
                Some(Check::new(MessageId::NamespacePaDrMissing, "spec/mtls"))
            }
            _ => None,
        }
    }

    /// Whether some destination rule enables mTLS for a specific service in
    /// `ns`.
    fn host_rule_in(&self, ns: &str) -> bool {
        let hosts = self.ctx.hosts();
        self.ctx
            .snapshot
            .destination_rules
            .iter()
            .filter(|dr| dr.spec.tls_mode() == Some(TlsMode::IstioMutual))
            .any(|dr| match hosts.parse(&dr.spec.host, dr.namespace()) {
                crate::host::Host::Service { namespace, .. } => namespace == ns,
                _ => false,
            })
    }
}
