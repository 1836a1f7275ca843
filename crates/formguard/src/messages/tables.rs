//! Locale fallback tables
//!
//! One table per locale maps a rule name to either a flat template or a map
//! of templates keyed by variant (`password.mixed`) or data type
//! (`min.string`). `en` and `de` ship with the crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::kind_of;
use crate::foundation::{GuardError, GuardResult};

const EN: &str = include_str!("../../locales/en.json");
const DE: &str = include_str!("../../locales/de.json");

/// Template(s) for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableEntry {
    Text(String),
    Variants(IndexMap<String, String>),
}

impl TableEntry {
    /// Picks the template for `variant`, then `data_type`, then `default`.
    #[must_use]
    pub fn pick(&self, variant: Option<&str>, data_type: &str) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Variants(map) => variant
                .and_then(|v| map.get(v))
                .or_else(|| map.get(data_type))
                .or_else(|| map.get("default"))
                .map(String::as_str),
        }
    }
}

type Table = IndexMap<String, TableEntry>;

/// All loaded locale tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTables {
    tables: IndexMap<String, Table>,
}

impl Default for LocaleTables {
    /// The embedded `en` and `de` tables.
    fn default() -> Self {
        let mut tables = IndexMap::new();
        for (locale, source) in [("en", EN), ("de", DE)] {
            tables.insert(locale.to_owned(), serde_json::from_str(source).unwrap_or_default());
        }
        Self { tables }
    }
}

impl LocaleTables {
    /// No tables at all.
    pub fn empty() -> Self {
        Self {
            tables: IndexMap::new(),
        }
    }

    /// Adds or extends the table for `locale` from a JSON object.
    pub fn insert_table(&mut self, locale: impl Into<String>, table: Value) -> GuardResult<()> {
        let kind = kind_of(&table);
        let parsed: Table = serde_json::from_value(table).map_err(|e| {
            GuardError::Messages(format!("locale table is {kind}, expected rule templates: {e}"))
        })?;
        self.tables.entry(locale.into()).or_default().extend(parsed);
        Ok(())
    }

    /// Replaces every template of `rule` with `messages` (locale → text).
    pub fn set_rule_messages(&mut self, rule: &str, messages: &IndexMap<String, String>) {
        self.remove_rule(rule);
        for (locale, message) in messages {
            self.tables
                .entry(locale.clone())
                .or_default()
                .insert(rule.to_owned(), TableEntry::Text(message.clone()));
        }
    }

    /// Drops `rule` from every locale.
    pub fn remove_rule(&mut self, rule: &str) {
        for table in self.tables.values_mut() {
            table.shift_remove(rule);
        }
    }

    #[must_use]
    pub fn entry(&self, locale: &str, rule: &str) -> Option<&TableEntry> {
        self.tables.get(locale)?.get(rule)
    }

    /// Template for `rule` in `locale`.
    #[must_use]
    pub fn lookup(
        &self,
        locale: &str,
        rule: &str,
        variant: Option<&str>,
        data_type: &str,
    ) -> Option<&str> {
        self.entry(locale, rule)?.pick(variant, data_type)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
