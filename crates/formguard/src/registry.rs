//! Custom rule registry
//!
//! Holds the handlers of user-defined rules and the category table that
//! decides where each rule name runs inside a chain.
//!
//! Every mutation bumps a generation counter, which is part of the chain
//! cache key: chains built before a registration are never reused after it.
//!
//! # Examples
//!
//! ```rust,ignore
//! use formguard::prelude::*;
//!
//! let mut registry = RuleRegistry::new();
//! registry.register(
//!     "slug",
//!     RuleDescriptor::new(from_fn(|call| is_slug(&call.value).into()))
//!         .message("The :attribute field must be a slug.")
//!         .message_for("de", "Das Feld :attribute muss ein Slug sein.")
//!         .priority(3),
//! )?;
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::chain::{CategoryTable, RuleCategory};
use crate::foundation::{GuardError, GuardResult, RuleHandler};
use crate::rules::BuiltinRule;

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Everything a registration may carry besides the rule name.
#[derive(Clone)]
pub struct RuleDescriptor {
    pub(crate) name: Option<String>,
    pub(crate) handler: Arc<dyn RuleHandler>,
    pub(crate) message: Option<String>,
    pub(crate) messages: IndexMap<String, String>,
    pub(crate) priority: Option<u8>,
}

impl RuleDescriptor {
    pub fn new(handler: Arc<dyn RuleHandler>) -> Self {
        Self {
            name: None,
            handler,
            message: None,
            messages: IndexMap::new(),
            priority: None,
        }
    }

    /// Rule name used by batch registration.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Default message, stored under the system locale.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Message for one locale. Wins over [`message`](Self::message) for
    /// that locale.
    #[must_use]
    pub fn message_for(mut self, locale: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(locale.into(), message.into());
        self
    }

    /// 1 = fillable, 2 = datatype, 3 = sanitizer, anything else = other.
    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn category(&self) -> RuleCategory {
        RuleCategory::from_priority(self.priority)
    }

    /// Messages by locale, the default one filed under `system_locale`.
    #[must_use]
    pub fn messages_by_locale(&self, system_locale: &str) -> IndexMap<String, String> {
        let mut messages = IndexMap::with_capacity(self.messages.len() + 1);
        if let Some(default) = &self.message {
            if !self.messages.contains_key(system_locale) {
                messages.insert(system_locale.to_owned(), default.clone());
            }
        }
        messages.extend(self.messages.iter().map(|(k, v)| (k.clone(), v.clone())));
        messages
    }
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("messages", &self.messages)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl From<Arc<dyn RuleHandler>> for RuleDescriptor {
    fn from(handler: Arc<dyn RuleHandler>) -> Self {
        Self::new(handler)
    }
}

// ============================================================================
// BATCHES
// ============================================================================

/// Value side of a mapping-style batch: a full descriptor or a bare handler.
#[derive(Debug, Clone)]
pub enum Registration {
    Descriptor(RuleDescriptor),
    Handler(HandlerOnly),
}

/// A bare handler registered without messages or priority.
#[derive(Clone)]
pub struct HandlerOnly(pub Arc<dyn RuleHandler>);

impl fmt::Debug for HandlerOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerOnly(..)")
    }
}

impl Registration {
    pub(crate) fn into_descriptor(self) -> RuleDescriptor {
        match self {
            Self::Descriptor(descriptor) => descriptor,
            Self::Handler(HandlerOnly(handler)) => RuleDescriptor::new(handler),
        }
    }
}

impl From<RuleDescriptor> for Registration {
    fn from(descriptor: RuleDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<Arc<dyn RuleHandler>> for Registration {
    fn from(handler: Arc<dyn RuleHandler>) -> Self {
        Self::Handler(HandlerOnly(handler))
    }
}

/// Several registrations at once.
///
/// `Single` and `List` take their names from [`RuleDescriptor::named`];
/// unnamed descriptors register as `anonymous`.
#[derive(Debug, Clone)]
pub enum RuleBatch {
    Single(RuleDescriptor),
    List(Vec<RuleDescriptor>),
    Map(IndexMap<String, Registration>),
}

impl RuleBatch {
    /// Flattens the batch into `(name, descriptor)` pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, RuleDescriptor)> {
        fn named(descriptor: RuleDescriptor) -> (String, RuleDescriptor) {
            let name = descriptor
                .name
                .clone()
                .unwrap_or_else(|| "anonymous".to_owned());
            (name, descriptor)
        }

        match self {
            Self::Single(descriptor) => vec![named(descriptor)],
            Self::List(list) => list.into_iter().map(named).collect(),
            Self::Map(map) => map
                .into_iter()
                .map(|(name, registration)| (name, registration.into_descriptor()))
                .collect(),
        }
    }
}

impl From<RuleDescriptor> for RuleBatch {
    fn from(descriptor: RuleDescriptor) -> Self {
        Self::Single(descriptor)
    }
}

impl From<Vec<RuleDescriptor>> for RuleBatch {
    fn from(list: Vec<RuleDescriptor>) -> Self {
        Self::List(list)
    }
}

impl From<IndexMap<String, Registration>> for RuleBatch {
    fn from(map: IndexMap<String, Registration>) -> Self {
        Self::Map(map)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Custom handlers and rule categories of one session.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    categories: CategoryTable,
    handlers: IndexMap<String, Arc<dyn RuleHandler>>,
    generation: u64,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to the descriptor's handler and category.
    ///
    /// A previous registration under the same name is replaced. Messages are
    /// not stored here; see `ValidationSession::register`.
    pub fn register(&mut self, name: &str, descriptor: RuleDescriptor) -> GuardResult<()> {
        if BuiltinRule::from_name(name).is_some() {
            return Err(GuardError::ReservedRule(name.to_owned()));
        }
        let category = descriptor.category();
        self.categories.assign(name, category);
        self.handlers.insert(name.to_owned(), descriptor.handler);
        self.generation += 1;
        info!(rule = name, ?category, generation = self.generation, "registered custom rule");
        Ok(())
    }

    /// Drops `name`'s handler and category. Returns `false` when the name
    /// was never registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.handlers.shift_remove(name).is_some();
        if removed {
            self.categories.release(name);
            self.generation += 1;
            debug!(rule = name, generation = self.generation, "removed custom rule");
        }
        removed
    }

    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&Arc<dyn RuleHandler>> {
        self.handlers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn category_of(&self, name: &str) -> RuleCategory {
        self.categories.category_of(name)
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Registered rule names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.handlers.keys().collect::<Vec<_>>())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
