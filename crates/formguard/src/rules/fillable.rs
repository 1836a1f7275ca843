//! Fillable rules
//!
//! A chain runs at most one of these, and always first. They either supply a
//! default, mark a blank value so the rest of the chain is skipped, or demand
//! that the value be present.

use serde_json::Value;

use super::{Failure, Outcome, RuleContext, Step};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{is_blank, is_missing, normalize_argument, to_text};

/// `fill:value` stores `value` (JSON-normalized) when the attribute is missing.
pub fn fill(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    if !is_missing(ctx.value()) || ctx.args.is_empty() {
        return Outcome::keep();
    }
    let default = match ctx.args {
        [single] => normalize_argument(single),
        many => Value::Array(many.iter().map(|a| normalize_argument(a)).collect()),
    };
    Outcome::replacing(default, Step::Keep)
}

/// `if_empty:text` stores `text` verbatim when the attribute is missing.
pub fn if_empty(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let default = ctx.require_arg(0)?;
    if is_missing(ctx.value()) {
        return Outcome::replacing(Value::String(default.to_owned()), Step::Keep);
    }
    Outcome::keep()
}

/// Blank values end the chain without touching the value.
pub fn fillable(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    if is_blank(ctx.value()) {
        return Outcome::skip();
    }
    Outcome::keep()
}

/// Blank values become `null` and end the chain.
pub fn nullable(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    if is_blank(ctx.value()) {
        return Outcome::replacing(Value::Null, Step::Skip);
    }
    Outcome::keep()
}

pub fn required(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    Outcome::check(!is_missing(ctx.value()))
}

/// Shared tail of the conditional `required_*` rules.
///
/// When the condition holds the value must be present; when it does not,
/// a missing value ends the chain quietly.
fn required_when(
    ctx: &RuleContext<'_>,
    condition: bool,
    failure: impl FnOnce() -> Failure,
) -> GuardResult<Outcome> {
    let missing = is_missing(ctx.value());
    match (condition, missing) {
        (true, true) => Outcome::fail(failure()),
        (false, true) => Outcome::skip(),
        (_, false) => Outcome::pass(),
    }
}

fn present(ctx: &RuleContext<'_>, attribute: &str) -> bool {
    !is_missing(ctx.other(attribute))
}

fn joined(values: &[String]) -> String {
    values.join(", ")
}

/// `required_if:other,value` - required when `other` equals `value`.
pub fn required_if(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let other = ctx.require_arg(0)?;
    let expected = ctx.require_arg(1)?;
    let condition = ctx.other(other).is_some_and(|v| to_text(v) == expected);
    required_when(ctx, condition, || {
        Failure::default().with("other", other).with("value", expected)
    })
}

/// `required_unless:other,v1,v2` - required unless `other` is one of the values.
pub fn required_unless(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let other = ctx.require_arg(0)?;
    let values = &ctx.args[1..];
    let current = ctx.other(other).map(to_text);
    let condition = !current.is_some_and(|c| values.iter().any(|v| *v == c));
    required_when(ctx, condition, || {
        Failure::default().with("other", other).with("values", joined(values))
    })
}

/// Required when any of the listed attributes is present.
pub fn required_with(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let condition = ctx.args.iter().any(|a| present(ctx, a));
    required_when(ctx, condition, || Failure::default().with("values", joined(ctx.args)))
}

/// Required when all of the listed attributes are present.
pub fn required_with_all(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let condition = ctx.args.iter().all(|a| present(ctx, a));
    required_when(ctx, condition, || Failure::default().with("values", joined(ctx.args)))
}

/// Required when any of the listed attributes is missing.
pub fn required_without(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let condition = ctx.args.iter().any(|a| !present(ctx, a));
    required_when(ctx, condition, || Failure::default().with("values", joined(ctx.args)))
}

/// Required when every listed attribute is missing.
pub fn required_without_all(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let condition = ctx.args.iter().all(|a| !present(ctx, a));
    required_when(ctx, condition, || Failure::default().with("values", joined(ctx.args)))
}
