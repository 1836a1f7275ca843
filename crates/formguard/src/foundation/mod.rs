//! Foundation layer
//!
//! Building blocks shared by every other module:
//!
//! - [`error`] - [`GuardError`] and the [`ErrorBag`] of resolved messages
//! - [`predicates`] - value classification and string helpers
//! - [`files`] - the [`FileInspector`] seam for file-like values
//! - [`handler`] - the [`RuleHandler`] trait for custom rules

pub mod error;
pub mod files;
pub mod handler;
pub mod predicates;

pub use error::{ErrorBag, GuardError, GuardResult};
pub use files::{FileInspector, FileRef, JsonFileInspector};
pub use handler::{NamedHandler, RuleCall, RuleHandler, Verdict, from_async_fn, from_fn};
