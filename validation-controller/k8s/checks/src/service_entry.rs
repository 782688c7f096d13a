use crate::{export_to, registry::Checker, ConfigObject, Context};
use k8s::{networking::ServiceEntry, Labels};
use mesh_validation_core::{Check, MessageId};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("exportto", export_to::namespaces_exist::<ServiceEntry>),
        Checker::object("workloadentries", workload_entry_addresses),
    ]
}

/// A service entry that selects workload entries and lists addresses must
/// list the address of every entry it selects.
fn workload_entry_addresses(se: &ServiceEntry, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let selector = match se.spec.workload_selector.as_ref() {
        Some(ws) if !ws.labels.is_empty() => &ws.labels,
        _ => return (vec![], true),
    };
    if se.spec.addresses.is_empty() {
        return (vec![], true);
    }

    let missing = ctx
        .snapshot
        .workload_entries
        .iter()
        .filter(|we| we.namespace() == se.namespace())
        .filter(|we| selector.matches(&Labels::from(we.spec.labels.clone())))
        .any(|we| !se.spec.addresses.contains(&we.spec.address));
    if !missing {
        return (vec![], true);
    }
    (
        vec![Check::new(
            MessageId::ServiceEntryAddressMatch,
            "spec/workloadSelector/labels",
        )],
        true,
    )
}
