use crate::{
    registry::Checker,
    selector::{self, Overlap, Selecting},
    ConfigObject, Context,
};
use k8s::networking::Sidecar;
use mesh_validation_core::{Check, MessageId, Validations};
use mesh_validation_k8s_api as k8s;

pub(crate) fn checkers() -> Vec<Checker> {
    vec![
        Checker::object("workloadselector", selector::workload_not_found::<Sidecar>),
        Checker::object("globalselector", global_selector),
        Checker::object("egresslistener", egress_hosts),
        Checker::group("multimatch", multi_match),
    ]
}

/// The root namespace's sidecar is the mesh default and applies to every
/// workload; it must not select.
fn global_selector(sc: &Sidecar, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    if sc.namespace() != ctx.config.root_namespace || sc.is_selector_less() {
        return (vec![], true);
    }
    (
        vec![Check::new(
            MessageId::SidecarGlobalSelector,
            Sidecar::SELECTOR_PATH,
        )],
        true,
    )
}

/// Egress hosts are written `namespace/dnsName` and must name something the
/// sidecar's namespace can see.
fn egress_hosts(sc: &Sidecar, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let hosts = ctx.hosts();
    let own_ns = sc.namespace();

    let mut checks = Vec::new();
    for (i, listener) in sc.spec.egress.iter().enumerate() {
        for (j, host) in listener.hosts.iter().enumerate() {
            let (ns, dns_name) = match host.split_once('/') {
                Some(parts) => parts,
                None => continue,
            };
            if dns_name == "*" {
                continue;
            }
            let ns = match ns {
                "." | "*" | "~" => own_ns,
                ns => ns,
            };
            if !hosts.resolves_from(dns_name, ns, own_ns) {
                checks.push(Check::new(
                    MessageId::SidecarEgressServiceNotFound,
                    format!("spec/egress[{}]/hosts[{}]", i, j),
                ));
            }
        }
    }
    (checks, true)
}

fn multi_match(ctx: &Context<'_>) -> Validations {
    selector::multi_match::<Sidecar>(ctx, Overlap::Exclusive)
}
