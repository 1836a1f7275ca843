//! # formguard
//!
//! Declarative, locale-aware validation of form records.
//!
//! Rules are written per attribute in any of three forms (pipe string, token
//! list, mapping). Each rule set is turned into an ordered chain (fillable,
//! datatype, sanitizers, everything else) that runs against the record,
//! coercing and sanitizing values as it goes. Failures are worded through a
//! fallback chain of user messages and per-locale tables.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formguard::prelude::*;
//! use serde_json::json;
//!
//! let mut session = ValidationSession::make(
//!     json!({"age": "17", "email": "ada@example.com"}),
//!     json!({"age": "required|numeric|gte:18", "email": "required|email"}),
//!     json!({"age.gte$de": "Zu jung"}),
//!     json!({"age$de": "Alter"}),
//! )?;
//!
//! match session.all().await {
//!     Ok(done) => println!("{:?}", done.validated),
//!     Err(GuardError::Invalid(bag)) => println!("{}", bag.get("age").unwrap_or_default()),
//!     Err(other) => return Err(other),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`spec`] - rule specification forms and normalization
//! - [`chain`] - categories, ordering and the chain cache
//! - [`infer`] - data type inference
//! - [`rules`] - the built-in rule set
//! - [`messages`] - message catalogs, locale tables, resolution
//! - [`registry`] - custom rule registration
//! - [`engine`] - sessions and the `all` / `only` / `validate` entry points
//! - [`config`] - [`EngineConfig`]
//! - [`probe`] - reachability probing for `active_url`

#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod engine;
pub mod foundation;
pub mod infer;
pub mod messages;
pub mod probe;
pub mod registry;
pub mod rules;
pub mod spec;

pub use config::{EngineConfig, UnknownRulePolicy};
pub use engine::{FormData, FormPart, SessionBuilder, Validated, ValidationSession};
pub use foundation::{
    ErrorBag, FileInspector, FileRef, GuardError, GuardResult, JsonFileInspector, RuleCall,
    RuleHandler, Verdict,
};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{EngineConfig, UnknownRulePolicy};
    pub use crate::engine::{FormData, FormPart, SessionBuilder, Validated, ValidationSession};
    pub use crate::foundation::{
        ErrorBag, FileInspector, FileRef, GuardError, GuardResult, JsonFileInspector,
        NamedHandler, RuleCall, RuleHandler, Verdict, from_async_fn, from_fn,
    };
    pub use crate::infer::DataType;
    pub use crate::probe::{NoProbe, UrlProbe};
    pub use crate::registry::{Registration, RuleBatch, RuleDescriptor, RuleRegistry};
    pub use crate::spec::{RuleArg, RuleSpec, RuleToken};

    #[cfg(feature = "http-probe")]
    pub use crate::probe::HttpProbe;
}
