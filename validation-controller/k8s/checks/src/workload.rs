use crate::{registry::Checker, selector::Selecting, ConfigObject, Context};
use k8s::Workload;
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![Checker::object("authorizationpolicy", coverage)]
}

/// A workload is covered by a selector-less authorization policy in its own
/// namespace or in the root namespace, or by a policy selecting it.
fn coverage(workload: &Workload, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let covered = ctx
        .snapshot
        .authorization_policies
        .iter()
        .filter(|ap| {
            ap.namespace() == workload.namespace || ap.namespace() == ctx.config.root_namespace
        })
        .any(|ap| {
            ap.is_selector_less()
                || ap
                    .selector()
                    .map_or(false, |s| s.matches(&workload.labels))
        });
    if covered {
        return (vec![], true);
    }
    (vec![Check::new(MessageId::WorkloadNotCovered, "")], true)
}
