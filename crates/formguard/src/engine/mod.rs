//! Validation engine
//!
//! [`ValidationSession`] owns a data record, its rules and every piece of
//! per-run state (errors, skip marks, messages, registry, chain cache).
//!
//! ```text
//! all()            every chain, errors reset
//! only(attrs)      named chains, only their errors reset
//! validate(values) merge values, then only(their keys)
//! ```
//!
//! A run ends in [`Validated`] or `GuardError::Invalid` with the error bag.

mod execute;
pub mod form_data;
mod session;

use serde_json::{Map, Value};

pub use form_data::{FormData, FormPart};
pub use session::{SessionBuilder, ValidationSession};

/// Successful outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// Requested attributes that hold a value, after coercion and sanitizing.
    pub validated: Map<String, Value>,
    /// Multipart encoding of `validated`.
    pub form_data: FormData,
}
