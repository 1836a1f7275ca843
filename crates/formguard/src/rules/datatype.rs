//! Datatype rules
//!
//! Assert the runtime type and, where a canonical form exists, coerce the
//! value into it (`"17"` → `17`, `"true"` → `true`).

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{Outcome, RuleContext, Step};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{as_integer, as_number, number_value, to_text};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

// ============================================================================
// STRUCTURAL
// ============================================================================

pub fn blob(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(ctx.value().is_some_and(|v| ctx.inspector.is_blob(v)))
}

pub fn array(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(ctx.value().is_some_and(Value::is_array))
}

/// A plain object; file and blob envelopes do not count.
pub fn object(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(ctx.value().is_some_and(|v| {
        v.is_object() && !ctx.inspector.carries_file(v) && !ctx.inspector.is_blob(v)
    }))
}

// ============================================================================
// SCALARS
// ============================================================================

pub fn numeric(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value().and_then(as_number) {
        Some(n) => Outcome::replacing(number_value(n), Step::Pass),
        None => Outcome::check(false),
    }
}

pub fn integer(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value().and_then(as_integer) {
        Some(n) => Outcome::replacing(Value::from(n), Step::Pass),
        None => Outcome::check(false),
    }
}

/// Strings pass; numbers are turned into their decimal text.
pub fn string(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value() {
        Some(Value::String(_)) => Outcome::pass(),
        Some(n @ Value::Number(_)) => Outcome::replacing(Value::String(to_text(n)), Step::Pass),
        _ => Outcome::check(false),
    }
}

/// Accepts `true`, `false`, `1`, `0`, `"1"`, `"0"`, `"true"`, `"false"`
/// and stores the boolean.
pub fn boolean(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let parsed = match ctx.value() {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    };
    match parsed {
        Some(b) => Outcome::replacing(Value::Bool(b), Step::Pass),
        None => Outcome::check(false),
    }
}

// ============================================================================
// FORMATS
// ============================================================================

fn string_value<'a>(ctx: &'a RuleContext<'_>) -> Option<&'a str> {
    ctx.value().and_then(Value::as_str)
}

pub fn email(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(|s| EMAIL_REGEX.is_match(s)))
}

pub fn uuid(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(|s| UUID_REGEX.is_match(s)))
}

pub fn ip(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(|s| s.parse::<IpAddr>().is_ok()))
}

/// An absolute `http`, `https` or `ftp` URL with a host.
pub(crate) fn is_web_url(text: &str) -> bool {
    url::Url::parse(text).is_ok_and(|parsed| {
        matches!(parsed.scheme(), "http" | "https" | "ftp") && parsed.host_str().is_some()
    })
}

pub fn url(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(is_web_url))
}

/// A well-formed `http(s)` URL the configured probe can reach.
///
/// The default [`NoProbe`](crate::probe::NoProbe) accepts every well-formed
/// URL, so this only checks the shape. Install
/// [`HttpProbe`](crate::probe::HttpProbe) (feature `http-probe`) or a custom
/// [`UrlProbe`](crate::probe::UrlProbe) for a real reachability check.
pub async fn active_url(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let Some(text) = string_value(ctx) else {
        return Outcome::check(false);
    };
    if !(text.starts_with("http://") || text.starts_with("https://")) || !is_web_url(text) {
        return Outcome::check(false);
    }
    Outcome::check(ctx.probe.reachable(text).await)
}

#[cfg(test)]
mod tests {
    use super::super::BuiltinRule;
    use super::super::testing::{Harness, fails, passes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn run(rule: BuiltinRule, value: Value) -> super::Outcome {
        Harness::new(json!({ "field": value }), &[]).run(rule).unwrap()
    }

    #[rstest]
    #[case(json!("17"), Some(json!(17)))]
    #[case(json!("2.5"), Some(json!(2.5)))]
    #[case(json!(3), Some(json!(3)))]
    #[case(json!("abc"), None)]
    fn test_numeric_coerces(#[case] value: Value, #[case] expected: Option<Value>) {
        let outcome = run(BuiltinRule::Numeric, value);
        assert_eq!(outcome.replace, expected);
        assert_eq!(passes(&outcome), expected.is_some());
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert!(fails(&run(BuiltinRule::Integer, json!("2.5"))));
        assert_eq!(run(BuiltinRule::Integer, json!("4")).replace, Some(json!(4)));
    }

    #[test]
    fn test_string_stringifies_numbers() {
        assert_eq!(run(BuiltinRule::String, json!(12)).replace, Some(json!("12")));
        assert!(fails(&run(BuiltinRule::String, json!([1]))));
    }

    #[rstest]
    #[case(json!(true), Some(true))]
    #[case(json!("false"), Some(false))]
    #[case(json!(1), Some(true))]
    #[case(json!("0"), Some(false))]
    #[case(json!("yes"), None)]
    #[case(json!(2), None)]
    fn test_boolean(#[case] value: Value, #[case] expected: Option<bool>) {
        let outcome = run(BuiltinRule::Boolean, value);
        assert_eq!(outcome.replace, expected.map(Value::Bool));
    }

    #[rstest]
    #[case(BuiltinRule::Email, json!("user@example.com"), true)]
    #[case(BuiltinRule::Email, json!("user@"), false)]
    #[case(BuiltinRule::Uuid, json!("550e8400-e29b-41d4-a716-446655440000"), true)]
    #[case(BuiltinRule::Uuid, json!("550e8400"), false)]
    #[case(BuiltinRule::Ip, json!("192.168.0.1"), true)]
    #[case(BuiltinRule::Ip, json!("::1"), true)]
    #[case(BuiltinRule::Ip, json!("999.1.1.1"), false)]
    #[case(BuiltinRule::Url, json!("https://example.com/a?b=c"), true)]
    #[case(BuiltinRule::Url, json!("ftp://files.example.com"), true)]
    #[case(BuiltinRule::Url, json!("mailto:user@example.com"), false)]
    #[case(BuiltinRule::Url, json!("example.com"), false)]
    #[case(BuiltinRule::ActiveUrl, json!("https://example.com"), true)]
    #[case(BuiltinRule::ActiveUrl, json!("ftp://example.com"), false)]
    // NoProbe never dials out, so an unreachable host still passes
    #[case(BuiltinRule::ActiveUrl, json!("https://host.invalid"), true)]
    #[case(BuiltinRule::ActiveUrl, json!("https://"), false)]
    fn test_formats(#[case] rule: BuiltinRule, #[case] value: Value, #[case] ok: bool) {
        assert_eq!(passes(&run(rule, value)), ok);
    }

    #[test]
    fn test_object_excludes_file_envelopes() {
        assert!(passes(&run(BuiltinRule::Object, json!({"a": 1}))));
        let file = json!({"$file": {"name": "a", "size": 1, "type": "text/plain"}});
        assert!(fails(&run(BuiltinRule::Object, file)));
    }
}
