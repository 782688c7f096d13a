//! Workload selection shared by the policy kinds.

use crate::{ConfigObject, Context};
use k8s::{
    networking::Sidecar,
    security::{AuthorizationPolicy, PeerAuthentication, RequestAuthentication},
    Selector,
};
use mesh_validation_core::{Check, MessageId, Validation, Validations};
use mesh_validation_k8s_api as k8s;
use std::collections::{BTreeMap, BTreeSet};

/// An object bound to workloads in its namespace through a label selector.
pub trait Selecting: ConfigObject + Sized {
    /// Where findings about the selector are reported.
    const SELECTOR_PATH: &'static str;

    /// `None` and an empty selector are equivalent.
    fn selector(&self) -> Option<&Selector>;

    fn is_selector_less(&self) -> bool {
        self.selector().map_or(true, Selector::is_empty)
    }
}

/// How a kind combines the configuration of objects selecting the same
/// workload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Overlap {
    /// Only one object may apply to a workload.
    Exclusive,

    /// Configuration from every matching object is merged, so only
    /// selector-less objects can conflict.
    Merged,
}

/// Reports a non-empty selector that matches no workload in the object's
/// namespace. The object stays valid.
pub(crate) fn workload_not_found<T: Selecting>(obj: &T, ctx: &Context<'_>) -> (Vec<Check>, bool) {
    let selector = match obj.selector() {
        Some(s) if !s.is_empty() => s,
        _ => return (vec![], true),
    };
    if ctx
        .snapshot
        .workloads_in(obj.namespace())
        .any(|w| selector.matches(&w.labels))
    {
        return (vec![], true);
    }
    (
        vec![Check::new(
            MessageId::SelectorWorkloadNotFound,
            T::SELECTOR_PATH,
        )],
        true,
    )
}

/// Flags objects of one kind that apply to the same workloads.
///
/// Selector-less objects conflict with every other selector-less object in
/// the same namespace. Objects with a selector conflict when their selectors
/// match a common workload, unless the kind merges its configuration. Every
/// conflicting object is flagged and references all the others.
pub(crate) fn multi_match<T: Selecting>(ctx: &Context<'_>, overlap: Overlap) -> Validations {
    let objects = T::list(ctx.snapshot);

    let mut by_namespace = BTreeMap::<&str, (Vec<usize>, Vec<usize>)>::new();
    for (i, obj) in objects.iter().enumerate() {
        let (selector_less, selecting) = by_namespace.entry(obj.namespace()).or_default();
        if obj.is_selector_less() {
            selector_less.push(i);
        } else {
            selecting.push(i);
        }
    }

    let mut conflicts = BTreeMap::<usize, (MessageId, BTreeSet<usize>)>::new();
    let mut flag = |ids: &[usize], message: MessageId| {
        for &i in ids {
            let (_, refs) = conflicts
                .entry(i)
                .or_insert_with(|| (message, BTreeSet::new()));
            refs.extend(ids.iter().copied().filter(|&j| j != i));
        }
    };

    for (ns, (selector_less, selecting)) in &by_namespace {
        if selector_less.len() > 1 {
            flag(selector_less, MessageId::MultiMatchSelectorless);
        }

        if overlap == Overlap::Merged {
            continue;
        }
        for workload in ctx.snapshot.workloads_in(ns) {
            let matching = selecting
                .iter()
                .copied()
                .filter(|&i| {
                    objects[i]
                        .selector()
                        .map_or(false, |s| s.matches(&workload.labels))
                })
                .collect::<Vec<_>>();
            if matching.len() > 1 {
                flag(&matching, MessageId::MultiMatchSelector);
            }
        }
    }

    conflicts
        .into_iter()
        .map(|(i, (message, refs))| {
            let validation = Validation::from_checks(vec![Check::new(message, T::SELECTOR_PATH)])
                .with_references(refs.into_iter().map(|j| ctx.key(&objects[j])));
            (ctx.key(&objects[i]), validation)
        })
        .collect()
}

// === impl Selecting ===

impl Selecting for Sidecar {
    const SELECTOR_PATH: &'static str = "spec/workloadSelector";

    fn selector(&self) -> Option<&Selector> {
        self.spec.workload_selector.as_ref().map(|s| &s.labels)
    }
}

impl Selecting for PeerAuthentication {
    const SELECTOR_PATH: &'static str = "spec/selector";

    fn selector(&self) -> Option<&Selector> {
        self.spec.selector.as_ref().map(|s| &s.match_labels)
    }
}

impl Selecting for RequestAuthentication {
    const SELECTOR_PATH: &'static str = "spec/selector";

    fn selector(&self) -> Option<&Selector> {
        self.spec.selector.as_ref().map(|s| &s.match_labels)
    }
}

impl Selecting for AuthorizationPolicy {
    const SELECTOR_PATH: &'static str = "spec/selector";

    fn selector(&self) -> Option<&Selector> {
        self.spec.selector.as_ref().map(|s| &s.match_labels)
    }
}
