//! Sanitizers
//!
//! Transform the value without judging it. They never fail, except for
//! `format_date` placed on a chain that has no date type.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::temporal::{format_moment, parse_moment};
use super::{Outcome, RuleContext, Step};
use crate::foundation::GuardResult;
use crate::foundation::predicates::trim_deep;
use crate::infer::DataType;

static WORD_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]").unwrap());

/// Trims strings, recursing into arrays and objects.
pub fn trim(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value() {
        Some(value) => Outcome::replacing(trim_deep(value.clone()), Step::Keep),
        None => Outcome::keep(),
    }
}

/// `capitalize` upper-cases word starts, `capitalize:all` the whole text,
/// `capitalize:none` lower-cases it. The text is trimmed first.
pub fn capitalize(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let Some(Value::String(text)) = ctx.value() else {
        return trim(ctx);
    };
    let text = text.trim();
    let cased = match ctx.arg(0) {
        Some("all") => text.to_uppercase(),
        Some("none") => text.to_lowercase(),
        _ => WORD_START
            .replace_all(text, |caps: &regex::Captures<'_>| caps[0].to_uppercase())
            .into_owned(),
    };
    Outcome::replacing(Value::String(cased), Step::Keep)
}

/// `format_date:dd/mm/yyyy` rewrites a `date` or `datetime` value.
///
/// Without a format the type's canonical layout is used.
pub fn format_date(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let default = match ctx.data_type {
        DataType::Date => "yyyy-mm-dd",
        DataType::Datetime => "yyyy-mm-dd H:i:s",
        other => {
            return Err(ctx.misuse(format!(
                "format_date needs a date or datetime rule before it, the value is {other}"
            )));
        }
    };
    let format = ctx.arg(0).unwrap_or(default);
    match ctx.value().and_then(parse_moment) {
        Some(moment) => Outcome::replacing(Value::String(format_moment(&moment, format)), Step::Keep),
        None => Outcome::keep(),
    }
}
