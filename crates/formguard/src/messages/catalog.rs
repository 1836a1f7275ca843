//! Locale-suffixed key/value tables
//!
//! Both user messages and attribute labels are written as flat objects whose
//! keys may carry a locale suffix:
//!
//! ```text
//! { "age.gte": "Too young", "age.gte$de": "Zu jung", "age$de": "Alter" }
//! ```
//!
//! A key without suffix belongs to the system locale.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::foundation::{GuardError, GuardResult};

/// Splits `key$locale`; keys without a (single) suffix use `system_locale`.
pub(crate) fn split_key<'a>(key: &'a str, system_locale: &'a str) -> (&'a str, &'a str) {
    match key.split_once('$') {
        Some((name, locale)) if !name.is_empty() && !locale.is_empty() && !locale.contains('$') => {
            (name, locale)
        }
        _ => (key, system_locale),
    }
}

/// Strings grouped by locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCatalog {
    by_locale: IndexMap<String, IndexMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of `key[$locale] → string`.
    pub fn from_value(value: &Value, system_locale: &str) -> GuardResult<Self> {
        let mut catalog = Self::new();
        catalog.merge(value, system_locale)?;
        Ok(catalog)
    }

    /// Adds every entry of `value`, overwriting existing keys.
    ///
    /// Nothing is added when the table is malformed.
    pub fn merge(&mut self, value: &Value, system_locale: &str) -> GuardResult<()> {
        let Value::Object(entries) = value else {
            return Err(GuardError::Messages(format!(
                "expected an object of strings, got {}",
                kind_of(value)
            )));
        };

        let mut parsed = Vec::with_capacity(entries.len());
        for (key, message) in entries {
            let Value::String(message) = message else {
                return Err(GuardError::Messages(format!(
                    "message for '{key}' is {}, expected a string",
                    kind_of(message)
                )));
            };
            let (name, locale) = split_key(key, system_locale);
            if locale != system_locale
                && !entries.contains_key(name)
                && !entries.contains_key(&format!("{name}${system_locale}"))
            {
                warn!(
                    key = name,
                    locale,
                    system_locale,
                    "no system locale message defined, it is the fallback for other locales"
                );
            }
            parsed.push((locale.to_owned(), name.to_owned(), message.clone()));
        }

        for (locale, name, message) in parsed {
            self.by_locale.entry(locale).or_default().insert(name, message);
        }
        Ok(())
    }

    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.by_locale
            .entry(locale.into())
            .or_default()
            .insert(key.into(), message.into());
    }

    #[must_use]
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.by_locale.get(locale)?.get(key).map(String::as_str)
    }

    /// Looks `key` up in `locale`, then in `fallback`.
    #[must_use]
    pub fn get_or_fallback(&self, locale: &str, fallback: &str, key: &str) -> Option<&str> {
        self.get(locale, key).or_else(|| self.get(fallback, key))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.by_locale.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_locale.values().all(IndexMap::is_empty)
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
