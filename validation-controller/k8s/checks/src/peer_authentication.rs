use crate::{
    registry::Checker,
    selector::{self, Overlap},
    Context,
};
use k8s::security::PeerAuthentication;
use mesh_validation_core::{Check, Validations};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object(
            "workloadselector",
            selector::workload_not_found::<PeerAuthentication>,
        ),
        Checker::object("mtls", destination_rule_missing),
        Checker::group("multimatch", multi_match),
    ]
}

fn destination_rule_missing(pa: &PeerAuthentication, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    match ctx.mtls().missing_rule(pa) {
        Some(check) => (vec![check], false),
        None => (vec![], true),
    }
}

fn multi_match(ctx: &Context<'_>) -> Validations {
    selector::multi_match::<PeerAuthentication>(ctx, Overlap::Exclusive)
}
