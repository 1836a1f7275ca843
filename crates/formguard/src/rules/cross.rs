//! Rules that read other attributes

use serde_json::Value;

use super::{Failure, Outcome, RuleContext, Step};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{as_number, to_text};

/// Equality that survives numeric coercion: `1234` matches `"1234"`.
fn same_value(value: Option<&Value>, other: Option<&Value>) -> bool {
    let (Some(value), Some(other)) = (value, other) else {
        return false;
    };
    if value == other {
        return true;
    }
    match (as_number(value), as_number(other)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            let scalar = |v: &Value| !matches!(v, Value::Array(_) | Value::Object(_));
            scalar(value) && scalar(other) && to_text(value) == to_text(other)
        }
        _ => false,
    }
}

/// `confirmed[:other]` - `other` (default `<attribute>_confirmation`) holds
/// the same value. A mismatch is recorded against `other`, never against
/// the attribute being validated.
pub fn confirmed(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let other = ctx
        .arg(0)
        .map_or_else(|| format!("{}_confirmation", ctx.attribute), str::to_owned);
    if same_value(ctx.value(), ctx.other(&other)) {
        return Outcome::keep();
    }
    Ok(Outcome::from(Step::FailOn {
        failure: Failure::default().with("other", other.clone()),
        attribute: other,
    }))
}

/// `same:other` - equal to the value of `other`.
pub fn same(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let other = ctx.require_arg(0)?;
    let ok = same_value(ctx.value(), ctx.other(other));
    Outcome::check_with(ok, || Failure::default().with("other", other))
}

/// `in_array:other` checks membership in the array held by `other`;
/// any other argument list is taken as the allowed values themselves.
pub fn in_array(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    ctx.require_arg(0)?;
    let Some(value) = ctx.value() else {
        return Outcome::check(false);
    };
    if let [other] = ctx.args {
        if let Some(Value::Array(items)) = ctx.other(other) {
            let ok = items.iter().any(|item| item == value || to_text(item) == to_text(value));
            return Outcome::check_with(ok, || Failure::default().with("values", other.clone()));
        }
    }
    let text = to_text(value);
    let ok = !matches!(value, Value::Array(_) | Value::Object(_)) && ctx.args.contains(&text);
    Outcome::check_with(ok, || Failure::default().with("values", ctx.args.join(", ")))
}
