//! Type inference
//!
//! Before a chain runs, the engine settles on the [`DataType`] its rules will
//! see. A declared datatype rule wins; otherwise the type is read off the
//! value's shape. Numeric-looking input comes back with a coerced number
//! that the engine writes into the record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::FileInspector;
use crate::foundation::predicates::{as_number, number_value};

/// Runtime type of an attribute value as seen by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Numeric,
    Integer,
    Array,
    Object,
    File,
    Files,
    Boolean,
    Blob,
    Date,
    Datetime,
    Any,
}

impl DataType {
    /// Type implied by a built-in datatype rule name.
    #[must_use]
    pub fn from_rule(name: &str) -> Option<Self> {
        Some(match name {
            "string" | "url" | "ip" | "email" | "uuid" => Self::String,
            "numeric" => Self::Numeric,
            "integer" => Self::Integer,
            "array" => Self::Array,
            "object" => Self::Object,
            "file" => Self::File,
            "files" => Self::Files,
            "boolean" => Self::Boolean,
            "blob" => Self::Blob,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            _ => return None,
        })
    }

    /// The type comparison rules reason about; integers compare as numbers.
    #[must_use]
    pub fn comparison(self) -> Self {
        match self {
            Self::Integer => Self::Numeric,
            other => other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Array => "array",
            Self::Object => "object",
            Self::File => "file",
            Self::Files => "files",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`infer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub data_type: DataType,
    /// Replacement value the engine should store, if any.
    pub coerced: Option<Value>,
}

impl Inference {
    fn of(data_type: DataType) -> Self {
        Self {
            data_type,
            coerced: None,
        }
    }
}

/// Decides the type for one attribute.
///
/// `declared` is the chain's datatype rule, if it has one. Custom datatype
/// rules are opaque to the engine and yield [`DataType::Any`].
pub fn infer(
    declared: Option<&str>,
    value: Option<&Value>,
    inspector: &dyn FileInspector,
) -> Inference {
    if let Some(rule) = declared {
        return Inference::of(DataType::from_rule(rule).unwrap_or(DataType::Any));
    }
    let Some(value) = value else {
        return Inference::of(DataType::Any);
    };

    match value {
        Value::Array(_) if inspector.files(value).is_some() => Inference::of(DataType::Files),
        Value::Array(_) => Inference::of(DataType::Array),
        Value::Object(_) if inspector.is_file(value) => Inference::of(DataType::File),
        Value::Object(_) if inspector.file_list(value).is_some() => Inference::of(DataType::Files),
        Value::Object(_) if inspector.is_blob(value) => Inference::of(DataType::Blob),
        Value::Object(_) => Inference::of(DataType::Object),
        _ => match as_number(value) {
            Some(n) => Inference {
                data_type: DataType::Numeric,
                coerced: Some(number_value(n)),
            },
            None if value.is_string() => Inference::of(DataType::String),
            None => Inference::of(DataType::Any),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{FileRef, JsonFileInspector};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Some("url"), json!(5), DataType::String)]
    #[case(Some("integer"), json!("x"), DataType::Integer)]
    #[case(Some("even"), json!("x"), DataType::Any)]
    #[case(None, json!([1, 2]), DataType::Array)]
    #[case(None, json!([]), DataType::Array)]
    #[case(None, json!({"a": 1}), DataType::Object)]
    #[case(None, json!("hello"), DataType::String)]
    #[case(None, json!(true), DataType::Any)]
    fn test_declared_and_shape(
        #[case] declared: Option<&str>,
        #[case] value: Value,
        #[case] expected: DataType,
    ) {
        let inference = infer(declared, Some(&value), &JsonFileInspector);
        assert_eq!(inference.data_type, expected);
    }

    #[test]
    fn test_numeric_text_is_coerced() {
        let inference = infer(None, Some(&json!("17")), &JsonFileInspector);
        assert_eq!(inference.data_type, DataType::Numeric);
        assert_eq!(inference.coerced, Some(json!(17)));
    }

    #[test]
    fn test_declared_type_skips_coercion() {
        let inference = infer(Some("string"), Some(&json!("17")), &JsonFileInspector);
        assert_eq!(inference.coerced, None);
    }

    #[test]
    fn test_files_shapes() {
        let a = FileRef::new("a", 1, "image/png");
        let single = a.to_value();
        let array = json!([a.to_value(), a.to_value()]);
        let list = FileRef::list_value(&[a]);

        assert_eq!(infer(None, Some(&single), &JsonFileInspector).data_type, DataType::File);
        assert_eq!(infer(None, Some(&array), &JsonFileInspector).data_type, DataType::Files);
        assert_eq!(infer(None, Some(&list), &JsonFileInspector).data_type, DataType::Files);
    }

    #[test]
    fn test_integer_compares_as_numeric() {
        assert_eq!(DataType::Integer.comparison(), DataType::Numeric);
        assert_eq!(DataType::String.comparison(), DataType::String);
    }
}
