//! Mesh configuration checkers.
//!
//! Each object kind maps to an ordered list of checkers. A checker either
//! inspects one object at a time (plus whatever correlated context it needs
//! from the snapshot), or a whole kind at once to find conflicts between
//! objects. Every checker is a pure function of a [`Snapshot`] and a
//! [`ValidationConfig`]; results are merged into a [`Validations`] set keyed
//! by object identity.
//!
//! ```text
//! [ Snapshot ] -> [ Registry ] -> kind -> [ Checker ]* -> [ Validations ]
//! ```
//!
//! Checkers correlate objects through three shared resolvers:
//!
//! - label selectors against workloads (see [`selector`]);
//! - hosts against services, service entries and the registry (see [`host`]);
//! - peer authentication scopes against destination rules (see [`mtls`]).

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod authorization_policy;
mod config;
mod context;
mod destination_rule;
mod export_to;
mod gateway;
pub mod host;
mod k8s_gateway;
mod k8s_reference_grant;
mod k8s_route;
pub mod mtls;
mod object;
mod peer_authentication;
mod registry;
mod request_authentication;
pub mod selector;
mod service;
mod service_entry;
mod sidecar;
mod snapshot;
mod virtual_service;
mod workload;
mod workload_group;

#[cfg(test)]
mod tests;

pub use self::{
    config::ValidationConfig,
    context::{is_exported_to, Context},
    object::ConfigObject,
    registry::{Checker, GroupCheck, ObjectCheck, Registry},
    snapshot::{Object, Snapshot},
};
use mesh_validation_core::{KeyError, Validations};
use tracing::debug;

/// Runs every registered checker over `snapshot` and returns the merged
/// results with ignored codes stripped.
///
/// Fails without evaluating anything when an object lacks a name or
/// namespace, or two objects share an identity.
pub fn validate(snapshot: &Snapshot, config: &ValidationConfig) -> Result<Validations, KeyError> {
    snapshot.check_identities(&config.cluster)?;

    let registry = Registry::default();
    let ctx = Context::new(snapshot, config);
    let mut validations = Validations::new();
    for kind in registry.kinds() {
        let results = registry.run_kind(kind, &ctx);
        debug!(%kind, objects = results.len(), "Validated");
        validations.merge(results);
    }
    validations.strip_ignored(&config.ignored_checks);
    Ok(validations)
}
