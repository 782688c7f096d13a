#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Identity keys, findings and the result aggregator shared by every
//! validation checker.

mod catalog;
mod check;
mod key;
mod kind;
mod validation;

pub use self::{
    catalog::{MessageId, UnknownMessage},
    check::{Check, Severity},
    key::{KeyError, ValidationKey},
    kind::{ObjectKind, UnknownKind},
    validation::{Summary, Validation, Validations},
};
