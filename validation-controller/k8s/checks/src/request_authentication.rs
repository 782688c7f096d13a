use crate::{
    registry::Checker,
    selector::{self, Overlap},
    Context,
};
use k8s::security::RequestAuthentication;
use mesh_validation_core::Validations;
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object(
            "workloadselector",
            selector::workload_not_found::<RequestAuthentication>,
        ),
        Checker::group("multimatch", multi_match),
    ]
}

/// Request authentication rules selecting the same workload are combined by
/// the proxy rather than conflicting, so only selector-less duplicates are
/// reported.
fn multi_match(ctx: &Context<'_>) -> Validations {
    selector::multi_match::<RequestAuthentication>(ctx, Overlap::Merged)
}
