use crate::{
    authorization_policy, destination_rule, gateway, k8s_gateway, k8s_reference_grant, k8s_route,
    peer_authentication, request_authentication, service, service_entry, sidecar,
    virtual_service, workload, workload_group, ConfigObject, Context,
};
use mesh_validation_core::{Check, ObjectKind, Validation, Validations};
use tracing::trace;

/// Inspects one object in isolation and returns its findings and validity.
pub type ObjectCheck<T> = fn(&T, &Context<'_>) -> (Vec<Check>, bool);

/// Inspects every object of a kind together.
pub type GroupCheck = fn(&Context<'_>) -> Validations;

/// A named checker with a uniform signature.
pub struct Checker {
    name: &'static str,
    run: Box<dyn Fn(&Context<'_>) -> Validations + Send + Sync>,
}

/// Maps each object kind to its ordered checkers.
pub struct Registry {
    kinds: Vec<(ObjectKind, Vec<Checker>)>,
}

// === impl Checker ===

impl Checker {
    /// Runs `check` over every object of kind `T`. Every object gets a
    /// result, even when it has no findings.
    pub fn object<T: ConfigObject + Sized>(name: &'static str, check: ObjectCheck<T>) -> Self {
        Self {
            name,
            run: Box::new(move |ctx: &Context<'_>| {
                T::list(ctx.snapshot)
                    .iter()
                    .map(|obj| {
                        let (checks, valid) = check(obj, ctx);
                        (ctx.key(obj), Validation::new(checks, valid))
                    })
                    .collect()
            }),
        }
    }

    pub fn group(name: &'static str, check: GroupCheck) -> Self {
        Self {
            name,
            run: Box::new(check),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(&self, ctx: &Context<'_>) -> Validations {
        (self.run)(ctx)
    }
}

impl std::fmt::Debug for Checker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker").field("name", &self.name).finish()
    }
}

// === impl Registry ===

impl Default for Registry {
    /// Every checker, in registration order.
    fn default() -> Self {
        Self::empty()
            .register(ObjectKind::VirtualService, virtual_service::checkers())
            .register(ObjectKind::DestinationRule, destination_rule::checkers())
            .register(ObjectKind::Gateway, gateway::checkers())
            .register(ObjectKind::Sidecar, sidecar::checkers())
            .register(ObjectKind::ServiceEntry, service_entry::checkers())
            .register(ObjectKind::PeerAuthentication, peer_authentication::checkers())
            .register(
                ObjectKind::RequestAuthentication,
                request_authentication::checkers(),
            )
            .register(
                ObjectKind::AuthorizationPolicy,
                authorization_policy::checkers(),
            )
            .register(ObjectKind::WorkloadGroup, workload_group::checkers())
            .register(ObjectKind::K8sGateway, k8s_gateway::checkers())
            .register(ObjectKind::K8sHttpRoute, k8s_route::http_checkers())
            .register(ObjectKind::K8sGrpcRoute, k8s_route::grpc_checkers())
            .register(
                ObjectKind::K8sReferenceGrant,
                k8s_reference_grant::checkers(),
            )
            .register(ObjectKind::Service, service::checkers())
            .register(ObjectKind::Workload, workload::checkers())
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Appends checkers for `kind` after any already registered.
    pub fn register(mut self, kind: ObjectKind, checkers: Vec<Checker>) -> Self {
        match self.kinds.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => existing.extend(checkers),
            None => self.kinds.push((kind, checkers)),
        }
        self
    }

    /// Registered kinds, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = ObjectKind> + '_ {
        self.kinds.iter().map(|(k, _)| *k)
    }

    pub fn checkers(&self, kind: ObjectKind) -> &[Checker] {
        self.kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| c.as_slice())
            .unwrap_or_default()
    }

    /// Runs every checker registered for `kind` and merges their results.
    pub fn run_kind(&self, kind: ObjectKind, ctx: &Context<'_>) -> Validations {
        let mut validations = Validations::new();
        for checker in self.checkers(kind) {
            let result = checker.run(ctx);
            trace!(%kind, checker = checker.name(), results = result.len());
            validations.merge(result);
        }
        validations
    }
}
