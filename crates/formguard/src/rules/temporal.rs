//! Dates and times
//!
//! Values are parsed leniently (RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, a few
//! common human formats, or epoch milliseconds) and stored back in a
//! canonical form. Naive timestamps are treated as UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use regex::Regex;
use serde_json::Value;

use super::{Failure, Outcome, RuleContext, Step};
use crate::foundation::GuardResult;

static OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*(year|month|week|day|hour|minute|second|millisecond)s?$").unwrap()
});

static FORMAT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(yyyy|mm|dd|h|i|s|a)").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M:%S %p", "%H:%M:%S%.f"];

// ============================================================================
// PARSING
// ============================================================================

/// Parses a moment in time out of a string or epoch milliseconds.
pub fn parse_moment(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        Value::String(s) => parse_text(s.trim()),
        _ => None,
    }
}

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
    {
        return Some(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a time of day, falling back to the time part of a full moment.
pub fn parse_time(value: &Value) -> Option<NaiveTime> {
    if let Value::String(s) = value {
        let text = s.trim();
        if let Some(t) = TIME_FORMATS
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
        {
            return Some(t);
        }
    }
    parse_moment(value).map(|dt| dt.time())
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Renders `moment` with the `yyyy mm dd H h i s a A` placeholder syntax.
///
/// Matching is case-insensitive but `h` is the 12-hour clock, `H` the
/// 24-hour one, `a`/`A` the lower/upper meridiem. Unrecognised casings
/// (`Yyyy`) stay as they are.
pub fn format_moment(moment: &NaiveDateTime, format: &str) -> String {
    let hour = moment.hour();
    let (pm, hour12) = moment.hour12();
    FORMAT_TOKEN
        .replace_all(format, |caps: &regex::Captures<'_>| match &caps[0] {
            "yyyy" | "YYYY" => moment.format("%Y").to_string(),
            "mm" | "MM" => moment.format("%m").to_string(),
            "dd" | "DD" => moment.format("%d").to_string(),
            "H" => format!("{hour:02}"),
            "h" => format!("{hour12:02}"),
            "i" | "I" => format!("{:02}", moment.minute()),
            "s" | "S" => format!("{:02}", moment.second()),
            "a" => (if pm { "pm" } else { "am" }).to_owned(),
            "A" => (if pm { "PM" } else { "AM" }).to_owned(),
            other => other.to_owned(),
        })
        .into_owned()
}

// ============================================================================
// RULES
// ============================================================================

fn store_formatted(ctx: &RuleContext<'_>, format: &str) -> GuardResult<Outcome> {
    match ctx.value().and_then(parse_moment) {
        Some(moment) => {
            Outcome::replacing(Value::String(format_moment(&moment, format)), Step::Pass)
        }
        None => Outcome::check(false),
    }
}

/// Stores the value as `YYYY-MM-DD`.
pub fn date(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    store_formatted(ctx, "yyyy-mm-dd")
}

/// Stores the value as `YYYY-MM-DD HH:MM:SS`.
pub fn datetime(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    store_formatted(ctx, "yyyy-mm-dd H:i:s")
}

/// Stores the value as `HH:MM:SS`.
pub fn time(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value().and_then(parse_time) {
        Some(t) => Outcome::replacing(Value::String(t.format("%H:%M:%S").to_string()), Step::Pass),
        None => Outcome::check(false),
    }
}

/// Stores the value as epoch milliseconds.
pub fn timestamp(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    match ctx.value().and_then(parse_moment) {
        Some(moment) => Outcome::replacing(
            Value::from(moment.and_utc().timestamp_millis()),
            Step::Pass,
        ),
        None => Outcome::check(false),
    }
}

/// Milliseconds per offset unit. A month counts as four weeks.
fn unit_millis(unit: &str) -> i64 {
    const SECOND: i64 = 1000;
    const DAY: i64 = 24 * 60 * 60 * SECOND;
    match unit {
        "year" => 365 * DAY,
        "month" => 28 * DAY,
        "week" => 7 * DAY,
        "day" => DAY,
        "hour" => 60 * 60 * SECOND,
        "minute" => 60 * SECOND,
        "second" => SECOND,
        _ => 1,
    }
}

/// Parses `18years` / `3 days` into `(count, unit millis)`.
fn parse_offset(ctx: &RuleContext<'_>) -> GuardResult<(i64, i64)> {
    let raw = ctx.require_arg(0)?.trim();
    let caps = OFFSET.captures(raw).ok_or_else(|| {
        ctx.misuse(format!(
            "expected an offset like '18years', found '{raw}' (usage: {}: 'date|{}:18years')",
            ctx.attribute,
            ctx.rule.name()
        ))
    })?;
    let count = caps[1]
        .parse::<i64>()
        .map_err(|_| ctx.misuse(format!("offset '{raw}' is out of range")))?;
    Ok((count, unit_millis(&caps[2])))
}

/// Whole `unit`s elapsed from `from` to `to`, rounded down.
fn elapsed_units(from: i64, to: i64, unit: i64) -> i64 {
    (to - from).div_euclid(unit)
}

fn relative(ctx: &RuleContext<'_>, past: bool) -> GuardResult<Outcome> {
    let (count, unit) = parse_offset(ctx)?;
    let now = Utc::now().timestamp_millis();
    let ok = ctx
        .value()
        .and_then(parse_moment)
        .map(|moment| moment.and_utc().timestamp_millis())
        .is_some_and(|value| {
            let units = if past {
                elapsed_units(value, now, unit)
            } else {
                elapsed_units(now, value, unit)
            };
            units >= count
        });
    let raw = ctx.args.first().cloned().unwrap_or_default();
    Outcome::check_with(ok, || {
        Failure::default()
            .with(ctx.rule.name(), raw.clone())
            .with("date", raw)
    })
}

/// `after:18years` - the value lies at least that long in the past.
pub fn after(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    relative(ctx, true)
}

/// `before:2days` - the value lies at least that long in the future.
pub fn before(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    relative(ctx, false)
}
