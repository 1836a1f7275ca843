use serde_json::Value;
use smallvec::{SmallVec, smallvec};
use tracing::debug;

use super::{NormalizedRules, RuleArg, RuleArgs, RuleEntry, RuleSpec, RuleToken};
use crate::foundation::{GuardError, GuardResult, NamedHandler};

/// Normalizes any [`RuleSpec`] form into its canonical ordered mapping.
///
/// Arguments are canonicalized to strings, so `"between:18,45"`,
/// `["between:18,45"]` and `{"between": [18, 45]}` produce identical output.
pub fn normalize(attribute: &str, spec: &RuleSpec) -> GuardResult<NormalizedRules> {
    let mut rules = NormalizedRules::default();

    match spec {
        RuleSpec::Text(text) => push_text(&mut rules, text),
        RuleSpec::List(tokens) => {
            for token in tokens {
                match token {
                    RuleToken::Name(text) => push_token(&mut rules, text),
                    RuleToken::Callback(named) => push_callback(&mut rules, named),
                }
            }
        }
        RuleSpec::Map(map) => {
            for (name, arg) in map {
                push_mapped(&mut rules, name, arg);
            }
        }
        RuleSpec::Json(value) => push_json(&mut rules, attribute, value)?,
    }

    if rules.is_empty() {
        return Err(GuardError::specification(attribute, "no rules were given"));
    }
    debug!(attribute, rules = ?rules.names(), "normalized rule specification");
    Ok(rules)
}

fn push_text(rules: &mut NormalizedRules, text: &str) {
    for token in text.split('|') {
        push_token(rules, token);
    }
}

/// `name` or `name:arg1,arg2`, split on the first colon only.
fn push_token(rules: &mut NormalizedRules, token: &str) {
    let (name, raw_args) = match token.split_once(':') {
        Some((name, args)) => (name.trim(), Some(args)),
        None => (token.trim(), None),
    };
    if name.is_empty() {
        return;
    }
    let args: RuleArgs = raw_args
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.split(',').map(str::to_owned).collect())
        .unwrap_or_default();
    rules.upsert(RuleEntry {
        name: name.to_owned(),
        args,
        handler: None,
    });
}

fn push_callback(rules: &mut NormalizedRules, named: &NamedHandler) {
    rules.upsert(RuleEntry {
        name: named.name.clone(),
        args: SmallVec::new(),
        handler: Some(named.handler.clone()),
    });
}

fn push_mapped(rules: &mut NormalizedRules, name: &str, arg: &RuleArg) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let (args, handler) = match arg {
        RuleArg::Flag(_) => (SmallVec::new(), None),
        RuleArg::Args(list) => (list.iter().cloned().collect(), None),
        RuleArg::Value(value) => (args_from_value(value), None),
        RuleArg::Handler(handler) => (SmallVec::new(), Some(handler.clone())),
    };
    rules.upsert(RuleEntry {
        name: name.to_owned(),
        args,
        handler,
    });
}

fn push_json(rules: &mut NormalizedRules, attribute: &str, value: &Value) -> GuardResult<()> {
    match value {
        Value::String(text) => push_text(rules, text),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(token) => push_token(rules, token),
                    other => {
                        return Err(GuardError::specification(
                            attribute,
                            format!("list entries must be rule names, found {other}"),
                        ));
                    }
                }
            }
        }
        Value::Object(map) => {
            for (name, arg) in map {
                let arg = match arg {
                    Value::Bool(flag) => RuleArg::Flag(*flag),
                    other => RuleArg::Value(other.clone()),
                };
                push_mapped(rules, name, &arg);
            }
        }
        other => {
            return Err(GuardError::specification(
                attribute,
                format!("expected a string, list or mapping, found {other}"),
            ));
        }
    }
    Ok(())
}

/// JSON arguments rendered as their canonical text.
fn args_from_value(value: &Value) -> RuleArgs {
    match value {
        Value::Null | Value::Bool(_) => SmallVec::new(),
        Value::String(s) if s.is_empty() => SmallVec::new(),
        Value::String(s) => smallvec![s.clone()],
        Value::Array(items) => items.iter().map(canonical_text).collect(),
        other => smallvec![other.to_string()],
    }
}

fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::from_fn;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn args(rules: &NormalizedRules, name: &str) -> Vec<String> {
        rules.get(name).unwrap().args.to_vec()
    }

    #[test]
    fn test_text_form() {
        let rules = normalize("age", &"required|between:18,45|numeric".into()).unwrap();
        assert_eq!(rules.names(), vec!["required", "between", "numeric"]);
        assert_eq!(args(&rules, "between"), vec!["18", "45"]);
        assert!(rules.get("required").unwrap().is_flag());
    }

    #[test]
    fn test_three_forms_agree() {
        let text = normalize("age", &"required|between:18,45".into()).unwrap();
        let list = normalize("age", &RuleSpec::list(["required", "between:18,45"])).unwrap();
        let map = normalize(
            "age",
            &RuleSpec::from_pairs([
                ("required", RuleArg::from(true)),
                ("between", RuleArg::from(json!([18, 45]))),
            ]),
        )
        .unwrap();
        let encoded =
            normalize("age", &RuleSpec::from_json(json!({"required": true, "between": [18, 45]})))
                .unwrap();

        assert_eq!(text, list);
        assert_eq!(text, map);
        assert_eq!(text, encoded);
    }

    #[test]
    fn test_colon_without_args_is_flag() {
        let rules = normalize("x", &"confirmed:|trim".into()).unwrap();
        assert!(rules.get("confirmed").unwrap().is_flag());
    }

    #[test]
    fn test_regex_argument_keeps_later_colons() {
        let rules = normalize("x", &"regex:^a:b$".into()).unwrap();
        assert_eq!(args(&rules, "regex"), vec!["^a:b$"]);
    }

    #[test]
    fn test_empty_tokens_are_ignored_and_empty_spec_fails() {
        let rules = normalize("x", &"|required||".into()).unwrap();
        assert_eq!(rules.names(), vec!["required"]);

        let err = normalize("x", &"".into()).unwrap_err();
        assert!(matches!(err, GuardError::Specification { .. }));
    }

    #[test]
    fn test_json_scalar_is_rejected() {
        let err = normalize("x", &RuleSpec::from_json(json!(42))).unwrap_err();
        assert!(matches!(err, GuardError::Specification { ref attribute, .. } if attribute == "x"));
    }

    #[test]
    fn test_callbacks_keep_their_name() {
        let handler = from_fn(|_| true.into());
        let rules = normalize(
            "code",
            &RuleSpec::list([
                RuleToken::from("string"),
                RuleToken::from(NamedHandler::new("even", handler.clone())),
                RuleToken::from(NamedHandler::anonymous(handler)),
            ]),
        )
        .unwrap();
        assert_eq!(rules.names(), vec!["string", "even", "anonymous"]);
        assert!(rules.get("even").unwrap().handler.is_some());
    }

    #[test]
    fn test_duplicate_rule_keeps_first_position() {
        let rules = normalize("x", &"min:1|string|min:3".into()).unwrap();
        assert_eq!(rules.names(), vec!["min", "string"]);
        assert_eq!(args(&rules, "min"), vec!["3"]);
    }
}
