//! Value classification and string helpers
//!
//! Every rule sees attribute values as [`serde_json::Value`]. The helpers
//! here answer the recurring questions ("is this blank?", "does this read as
//! a number?") in one place so the rules agree with each other.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Number, Value};

static NUMERIC_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+(\.\d+)?|\.\d+)$").unwrap());

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":([a-zA-Z_]+)").unwrap());

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// `null`, whitespace-only text, an empty array or an empty object.
///
/// `0` and `false` are values, not blanks.
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Like [`is_empty`] but an absent value counts as empty too.
#[must_use]
pub fn is_missing(value: Option<&Value>) -> bool {
    value.is_none_or(is_empty)
}

/// Blank in the sense of the skip-marking fillables: missing, empty, or `false`.
#[must_use]
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Bool(b)) => !b,
        Some(other) => is_empty(other),
    }
}

/// Reads a number out of a JSON number or a plain decimal string.
///
/// Accepts `"12"`, `"-3.5"`, `".5"`; rejects `""`, `"1e3"`, `"12px"`.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMERIC_TEXT.is_match(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Reads an integral number, see [`as_number`].
#[must_use]
pub fn as_integer(value: &Value) -> Option<i64> {
    let n = as_number(value)?;
    (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

/// Converts a float into a JSON number, preferring the integral form.
#[must_use]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// JavaScript-style truthiness: `false`, `0`, `""`, `null` are falsy.
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Renders a value the way it appears in a message or a form field.
///
/// Strings are taken verbatim, `null` becomes empty, everything else is JSON.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// STRINGS
// ============================================================================

/// Trims every string inside `value`, recursing into arrays and objects.
#[must_use]
pub fn trim_deep(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_owned()),
        Value::Array(items) => Value::Array(items.into_iter().map(trim_deep).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, trim_deep(v))).collect())
        }
        other => other,
    }
}

/// `("first_name", "password", "letters")` → `first_namePasswordLetters`.
///
/// The first part is lowercased, every following part is capitalized.
#[must_use]
pub fn join_camel(parts: &[&str]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            out.push_str(&part.to_lowercase());
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

/// Replaces `:token` occurrences with entries from `params`.
///
/// Tokens without a matching entry are left untouched.
#[must_use]
pub fn substitute(template: &str, params: &IndexMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            params
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

/// Joins `items` with `glue`, using `final_glue` before the last item.
///
/// `join_list(&["a", "b", "c"], ", ", " or ")` → `a, b or c`.
#[must_use]
pub fn join_list<S: AsRef<str>>(items: &[S], glue: &str, final_glue: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}{final_glue}{}", head.join(glue), last.as_ref())
        }
    }
}

/// Parses a rule argument as JSON when it reads as JSON, else keeps the text.
///
/// `"18"` → `18`, `"true"` → `true`, `"[1,2]"` → `[1, 2]`, `"abc"` → `"abc"`.
#[must_use]
pub fn normalize_argument(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), true)]
    #[case(json!("   "), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    #[case(json!(0), false)]
    #[case(json!(false), false)]
    #[case(json!("x"), false)]
    fn test_is_empty(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_empty(&value), expected);
    }

    #[test]
    fn test_blank_includes_false_and_absent() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(false))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(true))));
    }

    #[rstest]
    #[case(json!("17"), Some(17.0))]
    #[case(json!("-3.5"), Some(-3.5))]
    #[case(json!(".5"), Some(0.5))]
    #[case(json!(42), Some(42.0))]
    #[case(json!(""), None)]
    #[case(json!("-"), None)]
    #[case(json!("12px"), None)]
    #[case(json!(true), None)]
    fn test_as_number(#[case] value: Value, #[case] expected: Option<f64>) {
        assert_eq!(as_number(&value), expected);
    }

    #[test]
    fn test_number_value_prefers_integers() {
        assert_eq!(number_value(17.0), json!(17));
        assert_eq!(number_value(2.5), json!(2.5));
    }

    #[test]
    fn test_join_camel() {
        assert_eq!(join_camel(&["name", "password", "letters"]), "namePasswordLetters");
        assert_eq!(join_camel(&["Email", "required"]), "emailRequired");
    }

    #[test]
    fn test_substitute_leaves_unknown_tokens() {
        let params: IndexMap<String, String> =
            [("attribute".to_owned(), "Age".to_owned())].into_iter().collect();
        assert_eq!(
            substitute("The :attribute must be :gte.", &params),
            "The Age must be :gte."
        );
    }

    #[test]
    fn test_join_list() {
        assert_eq!(join_list::<&str>(&[], ", ", " or "), "");
        assert_eq!(join_list(&["image"], ", ", " or "), "image");
        assert_eq!(join_list(&["image", "video", "pdf"], ", ", " or "), "image, video or pdf");
    }

    #[test]
    fn test_trim_deep_recurses() {
        let value = trim_deep(json!({"a": " x ", "b": [" y", 1]}));
        assert_eq!(value, json!({"a": "x", "b": ["y", 1]}));
    }

    #[test]
    fn test_normalize_argument() {
        assert_eq!(normalize_argument("18"), json!(18));
        assert_eq!(normalize_argument(" true "), json!(true));
        assert_eq!(normalize_argument("abc"), json!("abc"));
    }
}
