use crate::{registry::Checker, Context};
use k8s::gateway::K8sReferenceGrant;
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![Checker::object("fromnamespace", from_namespaces)]
}

fn from_namespaces(grant: &K8sReferenceGrant, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let checks = grant
        .spec
        .from
        .iter()
        .enumerate()
        .filter(|(_, from)| !ctx.snapshot.has_namespace(&from.namespace))
        .map(|(i, _)| {
            Check::new(
                MessageId::ReferenceGrantNamespaceNotFound,
                format!("spec/from[{}]/namespace", i),
            )
        })
        .collect::<Vec<_>>();
    let valid = checks.is_empty();
    (checks, valid)
}
