//! Rule specifications
//!
//! A rule set for one attribute can be written three ways, all of which
//! normalize to the same ordered [`NormalizedRules`]:
//!
//! ```rust,ignore
//! use formguard::prelude::*;
//! use serde_json::json;
//!
//! let a = RuleSpec::from("required|between:18,45");
//! let b = RuleSpec::list(["required", "between:18,45"]);
//! let c = RuleSpec::from_pairs([("required", RuleArg::from(true)), ("between", json!([18, 45]).into())]);
//! let d = RuleSpec::from_json(json!({"required": true, "between": [18, 45]}));
//! ```

mod normalize;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::foundation::{NamedHandler, RuleHandler};

pub use normalize::normalize;

/// Canonical rule arguments. Most rules take at most two.
pub type RuleArgs = SmallVec<[String; 2]>;

// ============================================================================
// INPUT FORMS
// ============================================================================

/// One rule set as supplied by the caller.
#[derive(Debug, Clone)]
pub enum RuleSpec {
    /// Pipe string: `"required|between:18,45"`.
    Text(String),
    /// Token list mixing `"name"`, `"name:args"` and named handlers.
    List(Vec<RuleToken>),
    /// Mapping of rule name to flag, arguments or handler.
    Map(IndexMap<String, RuleArg>),
    /// Any of the above, still encoded as JSON.
    Json(Value),
}

impl RuleSpec {
    /// Builds the token-list form.
    pub fn list<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RuleToken>,
    {
        Self::List(tokens.into_iter().map(Into::into).collect())
    }

    /// Builds the mapping form.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RuleArg)>,
        K: Into<String>,
    {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wraps a JSON-encoded specification (string, array or object).
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for RuleSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RuleSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for RuleSpec {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<RuleToken>> for RuleSpec {
    fn from(tokens: Vec<RuleToken>) -> Self {
        Self::List(tokens)
    }
}

/// An entry of the token-list form.
#[derive(Debug, Clone)]
pub enum RuleToken {
    Name(String),
    Callback(NamedHandler),
}

impl From<&str> for RuleToken {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for RuleToken {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<NamedHandler> for RuleToken {
    fn from(handler: NamedHandler) -> Self {
        Self::Callback(handler)
    }
}

/// A value of the mapping form.
#[derive(Clone)]
pub enum RuleArg {
    /// `true` / `false`; both enable the rule without arguments.
    Flag(bool),
    /// Explicit argument list.
    Args(Vec<String>),
    /// A JSON scalar or array of arguments.
    Value(Value),
    /// A handler bound under the mapping key.
    Handler(Arc<dyn RuleHandler>),
}

impl fmt::Debug for RuleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            Self::Args(args) => f.debug_tuple("Args").field(args).finish(),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<bool> for RuleArg {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for RuleArg {
    fn from(arg: &str) -> Self {
        Self::Value(Value::String(arg.to_owned()))
    }
}

impl From<Value> for RuleArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<String>> for RuleArg {
    fn from(args: Vec<String>) -> Self {
        Self::Args(args)
    }
}

impl From<Arc<dyn RuleHandler>> for RuleArg {
    fn from(handler: Arc<dyn RuleHandler>) -> Self {
        Self::Handler(handler)
    }
}

// ============================================================================
// NORMALIZED FORM
// ============================================================================

/// One normalized rule: name, canonical arguments, optional inline handler.
#[derive(Clone)]
pub struct RuleEntry {
    pub name: String,
    pub args: RuleArgs,
    pub handler: Option<Arc<dyn RuleHandler>>,
}

impl RuleEntry {
    /// `true` when the rule was given without arguments.
    #[must_use]
    pub fn is_flag(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl PartialEq for RuleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.args == other.args
            && match (&self.handler, &other.handler) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Hash for RuleEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.args.hash(state);
        self.handler
            .as_ref()
            .map(|h| Arc::as_ptr(h).cast::<()>() as usize)
            .hash(state);
    }
}

/// Ordered `rule name → arguments` mapping for one attribute.
#[derive(Debug, Clone, Default, PartialEq, Hash)]
pub struct NormalizedRules {
    entries: Vec<RuleEntry>,
}

impl NormalizedRules {
    #[must_use]
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces `entry`; a replaced rule keeps its first position.
    pub(crate) fn upsert(&mut self, entry: RuleEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}
