//! Size and range comparisons
//!
//! What gets compared depends on the chain's type: the number itself for
//! numerics, the character count for strings, the element count for arrays,
//! the byte size for files. `between`, `min` and `max` check every file of a
//! file list; `gt`, `gte`, `lt` and `lte` look at the largest one. Any other
//! type fails the comparison.

use super::{BuiltinRule, Failure, Outcome, RuleContext};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{as_number, number_value};
use crate::infer::DataType;

/// Quantities to compare, one per item.
fn quantities(ctx: &RuleContext<'_>, per_item: bool) -> Option<Vec<f64>> {
    let value = ctx.value()?;
    match ctx.data_type.comparison() {
        DataType::Numeric => as_number(value).map(|n| vec![n]),
        DataType::String => value.as_str().map(|s| vec![s.chars().count() as f64]),
        DataType::Array => value.as_array().map(|a| vec![a.len() as f64]),
        DataType::File => ctx.inspector.file(value).map(|f| vec![f.size as f64]),
        DataType::Files => {
            let sizes: Vec<f64> = ctx
                .inspector
                .files(value)?
                .iter()
                .map(|f| f.size as f64)
                .collect();
            if per_item {
                Some(sizes)
            } else {
                sizes.into_iter().reduce(f64::max).map(|m| vec![m])
            }
        }
        _ => None,
    }
}

fn render(n: f64) -> String {
    number_value(n).to_string()
}

fn sized_failure(ctx: &RuleContext<'_>) -> Failure {
    Failure::default().variant(ctx.data_type.comparison().as_str())
}

/// `between:min,max`, inclusive. Reversed bounds are swapped.
pub fn between(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let a = ctx.number_arg(0)?;
    let b = ctx.number_arg(1)?;
    let (min, max) = (a.min(b), a.max(b));
    let ok = quantities(ctx, true).is_some_and(|qs| qs.iter().all(|q| *q >= min && *q <= max));
    Outcome::check_with(ok, || {
        sized_failure(ctx)
            .with("min", render(min))
            .with("max", render(max))
    })
}

/// `min`, `max`, `gt`, `gte`, `lt`, `lte`.
pub fn bound(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let limit = ctx.number_arg(0)?;
    let per_item = matches!(ctx.rule, BuiltinRule::Min | BuiltinRule::Max);
    let holds = |q: f64| match ctx.rule {
        BuiltinRule::Min | BuiltinRule::Gte => q >= limit,
        BuiltinRule::Max | BuiltinRule::Lte => q <= limit,
        BuiltinRule::Gt => q > limit,
        BuiltinRule::Lt => q < limit,
        _ => false,
    };
    let ok = quantities(ctx, per_item).is_some_and(|qs| qs.into_iter().all(holds));
    Outcome::check_with(ok, || sized_failure(ctx).with(ctx.rule.name(), render(limit)))
}

/// `range:min,max` on numbers only.
pub fn range(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let min = ctx.number_arg(0)?;
    let max = ctx.number_arg(1)?;
    let ok = ctx
        .value()
        .and_then(as_number)
        .is_some_and(|n| n >= min && n <= max);
    Outcome::check_with(ok, || {
        Failure::default()
            .with("min", render(min))
            .with("max", render(max))
    })
}

pub fn multiple_of(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let step = ctx.number_arg(0)?;
    if step == 0.0 {
        return Err(ctx.misuse("the divisor must not be zero"));
    }
    let ok = ctx.value().and_then(as_number).is_some_and(|n| {
        let ratio = n / step;
        (ratio - ratio.round()).abs() < 1e-9
    });
    Outcome::check_with(ok, || {
        Failure::default()
            .with("number", render(step))
            .with("multiple_of", render(step))
    })
}

/// `digits:n` - only ASCII digits, exactly `n` of them.
pub fn digits(ctx: &RuleContext<'_>) -> GuardResult<Outcome> {
    let count = ctx.number_arg(0)?;
    let ok = ctx.text().is_some_and(|text| {
        !text.is_empty()
            && text.bytes().all(|b| b.is_ascii_digit())
            && text.len() as f64 == count
    });
    Outcome::check_with(ok, || Failure::default().with("digits", render(count)))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Harness, fails, passes};
    use super::super::{BuiltinRule, Step};
    use crate::foundation::{FileRef, GuardError};
    use crate::infer::DataType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn check(rule: BuiltinRule, value: Value, data_type: DataType, args: &[&str]) -> bool {
        let outcome = Harness::new(json!({ "field": value }), args)
            .typed(data_type)
            .run(rule)
            .unwrap();
        passes(&outcome)
    }

    #[rstest]
    #[case(BuiltinRule::Min, json!(18), &["18"], true)]
    #[case(BuiltinRule::Min, json!(17), &["18"], false)]
    #[case(BuiltinRule::Max, json!(18), &["18"], true)]
    #[case(BuiltinRule::Max, json!(19), &["18"], false)]
    #[case(BuiltinRule::Gt, json!(18), &["18"], false)]
    #[case(BuiltinRule::Gte, json!(18), &["18"], true)]
    #[case(BuiltinRule::Lt, json!(17.5), &["18"], true)]
    #[case(BuiltinRule::Lte, json!(18.5), &["18"], false)]
    fn test_numeric_bounds(
        #[case] rule: BuiltinRule,
        #[case] value: Value,
        #[case] args: &[&str],
        #[case] ok: bool,
    ) {
        assert_eq!(check(rule, value, DataType::Numeric, args), ok);
    }

    #[test]
    fn test_integer_compares_as_number() {
        assert!(check(BuiltinRule::Gte, json!(20), DataType::Integer, &["18"]));
    }

    #[test]
    fn test_string_and_array_use_lengths() {
        assert!(check(BuiltinRule::Between, json!("héllo"), DataType::String, &["2", "5"]));
        assert!(!check(BuiltinRule::Between, json!("too long"), DataType::String, &["2", "5"]));
        assert!(check(BuiltinRule::Min, json!([1, 2, 3]), DataType::Array, &["3"]));
    }

    #[test]
    fn test_between_swaps_reversed_bounds() {
        assert!(check(BuiltinRule::Between, json!(30), DataType::Numeric, &["45", "18"]));
    }

    #[test]
    fn test_files_per_item_and_largest() {
        let files = FileRef::list_value(&[FileRef::new("a", 10, "x/y"), FileRef::new("b", 50, "x/y")]);
        assert!(check(BuiltinRule::Max, files.clone(), DataType::Files, &["50"]));
        assert!(!check(BuiltinRule::Min, files.clone(), DataType::Files, &["20"]));
        assert!(check(BuiltinRule::Gte, files.clone(), DataType::Files, &["20"]));
        assert!(!check(BuiltinRule::Lt, files, DataType::Files, &["50"]));
    }

    #[test]
    fn test_unsupported_type_fails() {
        assert!(!check(BuiltinRule::Min, json!(true), DataType::Boolean, &["1"]));
        assert!(!check(BuiltinRule::Min, json!({"a": 1}), DataType::Object, &["0"]));
    }

    #[test]
    fn test_failure_carries_variant_and_limit() {
        let outcome = Harness::new(json!({"field": 17}), &["18"])
            .typed(DataType::Numeric)
            .run(BuiltinRule::Gte)
            .unwrap();
        let Step::Fail(failure) = outcome.step else {
            panic!("expected failure");
        };
        assert_eq!(failure.variant.as_deref(), Some("numeric"));
        assert_eq!(failure.params.get("gte").map(String::as_str), Some("18"));
    }

    #[test]
    fn test_non_numeric_argument_is_misuse() {
        let err = Harness::new(json!({"field": 1}), &["ten"])
            .typed(DataType::Numeric)
            .run(BuiltinRule::Max)
            .unwrap_err();
        assert!(matches!(err, GuardError::RuleArgument { ref rule, .. } if rule == "max"));
    }

    #[rstest]
    #[case(BuiltinRule::Range, json!(5), &["1", "10"], true)]
    #[case(BuiltinRule::Range, json!("5"), &["1", "10"], true)]
    #[case(BuiltinRule::Range, json!(11), &["1", "10"], false)]
    #[case(BuiltinRule::MultipleOf, json!(15), &["5"], true)]
    #[case(BuiltinRule::MultipleOf, json!(0.3), &["0.1"], true)]
    #[case(BuiltinRule::MultipleOf, json!(7), &["5"], false)]
    #[case(BuiltinRule::Digits, json!("01234"), &["5"], true)]
    #[case(BuiltinRule::Digits, json!(1234), &["4"], true)]
    #[case(BuiltinRule::Digits, json!("12a4"), &["4"], false)]
    #[case(BuiltinRule::Digits, json!("123"), &["4"], false)]
    fn test_numeric_helpers(
        #[case] rule: BuiltinRule,
        #[case] value: Value,
        #[case] args: &[&str],
        #[case] ok: bool,
    ) {
        let outcome = Harness::new(json!({ "field": value }), args).run(rule).unwrap();
        assert_eq!(passes(&outcome), ok);
        assert_eq!(fails(&outcome), !ok);
    }

    #[test]
    fn test_multiple_of_zero_is_misuse() {
        let err = Harness::new(json!({"field": 1}), &["0"]).run(BuiltinRule::MultipleOf).unwrap_err();
        assert!(matches!(err, GuardError::RuleArgument { .. }));
    }
}
