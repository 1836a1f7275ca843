//! Error types for the rule engine
//!
//! Two kinds of failure leave the engine:
//!
//! - **Fatal misuse** (`Specification`, `Messages`, `UnknownRule`,
//!   `ReservedRule`, `RuleArgument`, `Config`) surfaces immediately and
//!   aborts the current call.
//! - **Validation failure** (`Invalid`) carries an [`ErrorBag`] and is only
//!   produced after every requested chain has run.
//!
//! # Examples
//!
//! ```rust,ignore
//! use formguard::prelude::*;
//!
//! match session.all().await {
//!     Ok(done) => println!("{:?}", done.validated),
//!     Err(GuardError::Invalid(bag)) => {
//!         for (attribute, message) in bag.iter() {
//!             eprintln!("{attribute}: {message}");
//!         }
//!     }
//!     Err(other) => return Err(other.into()),
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Result alias used throughout the crate.
pub type GuardResult<T> = Result<T, GuardError>;

// ============================================================================
// GUARD ERROR
// ============================================================================

/// Every failure the engine can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GuardError {
    /// The rule specification for an attribute could not be normalized.
    #[error("invalid rule specification for '{attribute}': {reason}")]
    Specification { attribute: String, reason: String },

    /// The user message or attribute label table is malformed.
    #[error("invalid message table: {0}")]
    Messages(String),

    /// A rule name is neither built in nor registered.
    #[error("rule '{rule}' used by '{attribute}' is not defined")]
    UnknownRule { attribute: String, rule: String },

    /// A custom registration tried to take over a built-in rule name.
    #[error("rule name '{0}' is reserved by a built-in rule")]
    ReservedRule(String),

    /// A rule received arguments it cannot work with.
    #[error("rule '{rule}' on '{attribute}' was misused: {reason}")]
    RuleArgument {
        attribute: String,
        rule: String,
        reason: String,
    },

    /// The data record is not a JSON object.
    #[error("data record must be an object, got {0}")]
    Data(String),

    /// The engine configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// One or more attributes failed validation.
    #[error("validation failed for {} attribute(s)", .0.len())]
    Invalid(ErrorBag),
}

impl GuardError {
    /// Creates a specification error.
    pub fn specification(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Specification {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Creates a rule argument error.
    pub fn rule_argument(
        attribute: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RuleArgument {
            attribute: attribute.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error bag when this is a validation failure.
    #[must_use]
    pub fn errors(&self) -> Option<&ErrorBag> {
        match self {
            Self::Invalid(bag) => Some(bag),
            _ => None,
        }
    }

    /// Returns `true` for validation failures, `false` for fatal misuse.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

// ============================================================================
// ERROR BAG
// ============================================================================

/// Resolved error messages keyed by attribute, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBag {
    entries: IndexMap<String, String>,
}

impl ErrorBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the message recorded for `attribute`.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.entries.get(attribute).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(attribute, message)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attribute names that carry an error.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Consumes the bag into its underlying map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.entries
    }

    pub(crate) fn insert(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(attribute.into(), message.into());
    }

    pub(crate) fn remove(&mut self, attribute: &str) -> Option<String> {
        self.entries.shift_remove(attribute)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of the bag restricted to attributes accepted by `keep`.
    pub(crate) fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
