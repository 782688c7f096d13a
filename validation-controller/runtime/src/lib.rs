#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use mesh_validation_core as core;
pub use mesh_validation_k8s_api as k8s;
pub use mesh_validation_k8s_checks as checks;

mod args;
mod engine;
pub mod loader;
mod metrics;
mod reconcile;
mod store;
pub mod watch;

pub use self::{
    args::{Args, LogFormat, Output},
    engine::{Engine, EngineError},
    loader::LoadError,
    metrics::EngineMetrics,
    reconcile::{Event, Reconciler},
    store::ValidationStore,
};
