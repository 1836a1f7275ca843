//! Content rules on text and scalar values

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{BuiltinRule, Failure, Outcome, RuleContext};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{is_empty, to_text};

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").unwrap());

static CARD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^4[0-9]{12}(?:[0-9]{3})?$|^5[1-5][0-9]{14}$|^3[47][0-9]{13}$",
        r"|^3(?:0[0-5]|[68][0-9])[0-9]{11}$|^6(?:011|5[0-9]{2})[0-9]{12}$",
        r"|^35(?:2[89]|[3-8][0-9])[0-9]{12}$|^(?:2131|1800|35[2-8][0-9])[0-9]{11}$",
    ))
    .unwrap()
});

static ALPHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static ALPHA_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z_]+$").unwrap());
static ALPHA_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static ALPHA_NUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static ALPHA_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z ]+$").unwrap());

fn string_value<'a>(ctx: &'a RuleContext<'_>) -> Option<&'a str> {
    ctx.value().and_then(Value::as_str)
}

fn listed(values: &[String]) -> String {
    values.join(", ")
}

// ============================================================================
// PRESENCE
// ============================================================================

/// Absent values pass; present ones must not be empty.
pub fn filled(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(ctx.value().is_none_or(|v| !is_empty(v)))
}

/// `yes`, `on`, `1`, `true` (as text, number or boolean).
pub fn accepted(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let ok = match ctx.value() {
        Some(Value::Bool(b)) => *b,
        Some(v @ (Value::Number(_) | Value::String(_))) => {
            matches!(to_text(v).trim().to_lowercase().as_str(), "yes" | "on" | "1" | "true")
        }
        _ => false,
    };
    Outcome::check(ok)
}

// ============================================================================
// PASSWORD
// ============================================================================

/// Checks the password classes in a fixed order and reports the first one
/// that is not met: `letters`, `mixed`, `numbers`, `symbols`, `length`.
///
/// `password:12` overrides the configured minimum length.
pub fn password(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let min_length = match ctx.arg(0) {
        Some(_) => ctx.number_arg(0)? as usize,
        None => ctx.password_min_length,
    };
    let text = ctx.text().unwrap_or_default();

    let unmet = if !text.chars().any(|c| c.is_ascii_alphabetic()) {
        Some("letters")
    } else if !(text.chars().any(|c| c.is_ascii_lowercase())
        && text.chars().any(|c| c.is_ascii_uppercase()))
    {
        Some("mixed")
    } else if !text.chars().any(|c| c.is_ascii_digit()) {
        Some("numbers")
    } else if !text
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace())
    {
        Some("symbols")
    } else if text.chars().count() < min_length {
        Some("length")
    } else {
        None
    };

    match unmet {
        None => Outcome::pass(),
        Some(class) => Outcome::fail(
            Failure::default()
                .variant(class)
                .with("length", min_length.to_string()),
        ),
    }
}

// ============================================================================
// CHARACTER CLASSES
// ============================================================================

/// The `alpha*` family, on trimmed strings.
pub fn alpha(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let pattern: &Regex = match ctx.rule {
        BuiltinRule::AlphaUnderscore => &*ALPHA_UNDERSCORE,
        BuiltinRule::AlphaDash => &*ALPHA_DASH,
        BuiltinRule::AlphaNum => &*ALPHA_NUM,
        BuiltinRule::AlphaSpaces => &*ALPHA_SPACES,
        _ => &*ALPHA,
    };
    Outcome::check(string_value(ctx).is_some_and(|s| pattern.is_match(s.trim())))
}

/// Has at least one cased letter and nothing that changes when lowercased.
pub fn lowercase(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(|s| {
        s.chars().any(char::is_alphabetic) && s.to_lowercase() == s
    }))
}

pub fn uppercase(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(string_value(ctx).is_some_and(|s| {
        s.chars().any(char::is_alphabetic) && s.to_uppercase() == s
    }))
}

// ============================================================================
// SUBSTRINGS
// ============================================================================

pub fn contains(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let needle = ctx.args.join(",");
    Outcome::check_with(
        string_value(ctx).is_some_and(|s| s.contains(needle.as_str())),
        || Failure::default().with("value", needle.clone()),
    )
}

pub fn not_contains(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let needle = ctx.args.join(",");
    Outcome::check_with(
        string_value(ctx).is_some_and(|s| needle.is_empty() || !s.contains(needle.as_str())),
        || Failure::default().with("value", needle.clone()),
    )
}

pub fn starts_with(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let ok = ctx
        .text()
        .is_some_and(|s| ctx.args.iter().any(|prefix| s.starts_with(prefix.as_str())));
    Outcome::check_with(ok, || Failure::default().with("values", listed(ctx.args)))
}

pub fn ends_with(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let ok = ctx
        .text()
        .is_some_and(|s| ctx.args.iter().any(|suffix| s.ends_with(suffix.as_str())));
    Outcome::check_with(ok, || Failure::default().with("values", listed(ctx.args)))
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

/// Textual forms of a scalar value or of every element of an array.
fn members(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) => None,
                scalar => Some(to_text(scalar)),
            })
            .collect(),
        Value::Object(_) => None,
        scalar => Some(vec![to_text(scalar)]),
    }
}

/// `in:a,b,c` - the value (or every element of an array value) is listed.
pub fn one_of(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let ok = ctx
        .value()
        .and_then(members)
        .is_some_and(|m| m.iter().all(|item| ctx.args.contains(item)));
    Outcome::check_with(ok, || Failure::default().with("values", listed(ctx.args)))
}

/// `not_in:a,b,c` - no element is listed.
pub fn not_in(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let ok = ctx
        .value()
        .and_then(members)
        .is_some_and(|m| !m.iter().any(|item| ctx.args.contains(item)));
    Outcome::check_with(ok, || Failure::default().with("values", listed(ctx.args)))
}

// ============================================================================
// FORMATS
// ============================================================================

/// A string holding valid JSON; arrays and objects pass as they are.
pub fn json(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let ok = match ctx.value() {
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).is_ok(),
        Some(Value::Array(_) | Value::Object(_)) => true,
        _ => false,
    };
    Outcome::check(ok)
}

/// E.164: optional `+`, no leading zero, at most 15 digits.
pub fn phone(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(ctx.text().is_some_and(|s| PHONE_REGEX.is_match(s.trim())))
}

/// Visa, Mastercard, Amex, Diners, Discover and JCB numbers. Spaces and
/// dashes between digit groups are ignored.
pub fn credit_card(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let ok = ctx.text().is_some_and(|s| {
        let digits: String = s.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        CARD_REGEX.is_match(&digits)
    });
    Outcome::check(ok)
}

/// `regex:^[a-z]+$`. The arguments are re-joined with `,` so quantifiers
/// like `{2,4}` survive splitting. An invalid pattern fails the value.
pub fn regex(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let source = ctx.args.join(",");
    let ok = match (ctx.text(), Regex::new(&source)) {
        (Some(text), Ok(compiled)) => compiled.is_match(&text),
        _ => false,
    };
    Outcome::check_with(ok, || Failure::default().with("pattern", source.clone()))
}

fn mask_matches(mask: char, c: char) -> bool {
    match mask {
        'z' | 'a' => c.is_ascii_lowercase(),
        'Z' | 'A' => c.is_ascii_uppercase(),
        '0' | '9' => c.is_ascii_digit(),
        '*' => c.is_ascii_alphanumeric(),
        literal => literal == c,
    }
}

/// `pattern:AA-9999` matches the trimmed value position by position.
///
/// `a`/`z` lowercase, `A`/`Z` uppercase, `0`/`9` digit, `*` alphanumeric;
/// any other mask character must appear literally.
pub fn pattern(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let mask = ctx.args.join(",");
    let ok = ctx.text().is_some_and(|text| {
        let text = text.trim();
        !text.is_empty()
            && text.chars().count() == mask.chars().count()
            && mask.chars().zip(text.chars()).all(|(m, c)| mask_matches(m, c))
    });
    Outcome::check_with(ok, || Failure::default().with("pattern", mask.clone()))
}
