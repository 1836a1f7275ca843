//! Rule chains
//!
//! A chain is the execution plan for one attribute: the normalized rules
//! sorted into a fixed shape and resolved to handlers.
//!
//! ```text
//! [fillable?] → [datatype?] → sanitizers (registry order) → others (as written) → Passed
//! ```
//!
//! Chains are built once per (attribute, rules, registry generation) and
//! memoized in a [`ChainCache`].

pub mod cache;
pub mod category;
pub mod order;

use std::fmt;
use std::sync::Arc;

pub use cache::ChainCache;
pub use category::{CategoryTable, RuleCategory};
pub use order::build_chain;

use crate::foundation::RuleHandler;
use crate::rules::BuiltinRule;
use crate::spec::RuleArgs;

/// What runs for one chain step.
#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinRule),
    Custom(Arc<dyn RuleHandler>),
    /// A rule nobody knows about, tolerated by the `warn` policy. Passes.
    Unknown,
    /// Terminal step; clears whatever error is left for the attribute.
    Passed,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(rule) => f.debug_tuple("Builtin").field(rule).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Unknown => f.write_str("Unknown"),
            Self::Passed => f.write_str("Passed"),
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::Unknown, Self::Unknown) | (Self::Passed, Self::Passed) => true,
            _ => false,
        }
    }
}

/// One step of an [`OrderedChain`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleInvocation {
    pub name: String,
    pub args: RuleArgs,
    pub handler: Handler,
    pub category: RuleCategory,
}

impl RuleInvocation {
    pub(crate) fn passed() -> Self {
        Self {
            name: "passed".to_owned(),
            args: RuleArgs::new(),
            handler: Handler::Passed,
            category: RuleCategory::Other,
        }
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self.handler, Handler::Passed)
    }
}

/// Ordered steps for one attribute, always ending with the sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedChain {
    attribute: String,
    steps: Vec<RuleInvocation>,
}

impl OrderedChain {
    pub(crate) fn new(attribute: impl Into<String>, mut steps: Vec<RuleInvocation>) -> Self {
        steps.push(RuleInvocation::passed());
        Self {
            attribute: attribute.into(),
            steps,
        }
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub fn steps(&self) -> &[RuleInvocation] {
        &self.steps
    }

    /// Rule names in execution order, sentinel excluded.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| !s.is_sentinel())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Name of the chain's datatype rule, if it has one.
    #[must_use]
    pub fn datatype_name(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.category == RuleCategory::Datatype)
            .map(|s| s.name.as_str())
    }
}
