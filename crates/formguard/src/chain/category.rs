//! Rule categories
//!
//! Every rule name falls into one of four categories that decide where it
//! lands in a chain. Membership is by exact name in three ordered lists;
//! anything not listed is [`RuleCategory::Other`].

use serde::{Deserialize, Serialize};

const FILLABLES: &[&str] = &[
    "if_empty",
    "fill",
    "fillable",
    "nullable",
    "required",
    "required_if",
    "required_unless",
    "required_with",
    "required_with_all",
    "required_without",
    "required_without_all",
];

const DATATYPES: &[&str] = &[
    "blob", "date", "datetime", "array", "object", "numeric", "integer", "string", "file", "files",
    "boolean", "url", "ip", "email", "uuid",
];

const SANITIZERS: &[&str] = &["trim", "capitalize", "format_date"];

/// Where a rule runs inside its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Supplies defaults or marks blanks to be skipped; at most one per chain.
    Fillable,
    /// Asserts or coerces the runtime type; at most one per chain.
    Datatype,
    /// Transforms the value without judging it.
    Sanitizer,
    /// Everything else.
    Other,
}

impl RuleCategory {
    /// Category for a registration priority: 1, 2, 3, anything else.
    #[must_use]
    pub fn from_priority(priority: Option<u8>) -> Self {
        match priority {
            Some(1) => Self::Fillable,
            Some(2) => Self::Datatype,
            Some(3) => Self::Sanitizer,
            _ => Self::Other,
        }
    }
}

/// The three ordered name lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    fillables: Vec<String>,
    datatypes: Vec<String>,
    sanitizers: Vec<String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| (*n).to_owned()).collect();
        Self {
            fillables: owned(FILLABLES),
            datatypes: owned(DATATYPES),
            sanitizers: owned(SANITIZERS),
        }
    }
}

impl CategoryTable {
    #[must_use]
    pub fn category_of(&self, name: &str) -> RuleCategory {
        if self.fillables.iter().any(|n| n == name) {
            RuleCategory::Fillable
        } else if self.datatypes.iter().any(|n| n == name) {
            RuleCategory::Datatype
        } else if self.sanitizers.iter().any(|n| n == name) {
            RuleCategory::Sanitizer
        } else {
            RuleCategory::Other
        }
    }

    /// Sanitizer names in execution order.
    #[must_use]
    pub fn sanitizers(&self) -> &[String] {
        &self.sanitizers
    }

    /// Moves `name` to the end of `category`'s list, out of every other one.
    pub fn assign(&mut self, name: &str, category: RuleCategory) {
        self.release(name);
        let list = match category {
            RuleCategory::Fillable => &mut self.fillables,
            RuleCategory::Datatype => &mut self.datatypes,
            RuleCategory::Sanitizer => &mut self.sanitizers,
            RuleCategory::Other => return,
        };
        list.push(name.to_owned());
    }

    /// Removes `name` from every list.
    pub fn release(&mut self, name: &str) {
        for list in [&mut self.fillables, &mut self.datatypes, &mut self.sanitizers] {
            list.retain(|n| n != name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_membership() {
        let table = CategoryTable::default();
        assert_eq!(table.category_of("nullable"), RuleCategory::Fillable);
        assert_eq!(table.category_of("uuid"), RuleCategory::Datatype);
        assert_eq!(table.category_of("trim"), RuleCategory::Sanitizer);
        assert_eq!(table.category_of("min"), RuleCategory::Other);
    }

    #[test]
    fn test_assign_moves_between_lists() {
        let mut table = CategoryTable::default();
        table.assign("slug", RuleCategory::Sanitizer);
        assert_eq!(table.category_of("slug"), RuleCategory::Sanitizer);
        assert_eq!(table.sanitizers().last().map(String::as_str), Some("slug"));

        table.assign("slug", RuleCategory::Datatype);
        assert_eq!(table.category_of("slug"), RuleCategory::Datatype);
        assert!(!table.sanitizers().iter().any(|n| n == "slug"));

        table.release("slug");
        assert_eq!(table.category_of("slug"), RuleCategory::Other);
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(RuleCategory::from_priority(Some(1)), RuleCategory::Fillable);
        assert_eq!(RuleCategory::from_priority(Some(3)), RuleCategory::Sanitizer);
        assert_eq!(RuleCategory::from_priority(Some(9)), RuleCategory::Other);
        assert_eq!(RuleCategory::from_priority(None), RuleCategory::Other);
    }
}
