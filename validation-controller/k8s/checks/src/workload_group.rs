use crate::{registry::Checker, ConfigObject, Context};
use k8s::networking::WorkloadGroup;
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![Checker::object("serviceaccount", service_account)]
}

fn service_account(wg: &WorkloadGroup, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    match wg.spec.template.service_account.as_deref() {
        Some(sa) if !ctx.snapshot.has_service_account(wg.namespace(), sa) => (
            vec![Check::new(
                MessageId::WorkloadGroupServiceAccountNotFound,
                "spec/template/serviceAccount",
            )],
            true,
        ),
        _ => (vec![], true),
    }
}
