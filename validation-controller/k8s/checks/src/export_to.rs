use crate::{ConfigObject, Context};
use mesh_validation_core::{Check, MessageId};

/// Every exportTo entry must be `.`, `*` or a namespace in the Namespace Set.
/// Objects in ambient namespaces are not checked.
pub(crate) fn namespaces_exist<T: ConfigObject>(obj: &T, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if ctx.snapshot.is_ambient(obj.namespace()) {
        return (vec![], true);
    }

    let checks = obj
        .export_to()
        .into_iter()
        .enumerate()
        .filter(|(_, ns)| !matches!(*ns, "." | "*") && !ctx.snapshot.has_namespace(ns))
        .map(|(i, _)| {
            Check::new(
                MessageId::ExportToNamespaceNotFound,
                format!("spec/exportTo[{}]", i),
            )
        })
        .collect::<Vec<_>>();
    let valid = checks.is_empty();
    (checks, valid)
}
