//! Chain execution
//!
//! Attributes run one after another in rule order, and so do the steps of a
//! chain. Before every step the skip guard checks whether the attribute was
//! skipped or already failed; if so the rest of its chain is abandoned.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::session::{ValidationSession, into_record};
use super::{FormData, Validated};
use crate::chain::{Handler, RuleCategory, RuleInvocation};
use crate::foundation::predicates::normalize_argument;
use crate::foundation::{GuardError, GuardResult, RuleCall, RuleHandler, Verdict};
use crate::infer::{DataType, infer};
use crate::messages::MessageRequest;
use crate::rules::{self, Failure, Outcome, RuleContext, Step};

impl ValidationSession {
    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Runs every chain. All errors and skip marks are reset first.
    #[instrument(skip(self), fields(attributes = self.rules.len()))]
    pub async fn all(&mut self) -> GuardResult<Validated> {
        self.errors.clear();
        self.skipped.clear();

        let attributes: Vec<String> = self.rules.keys().cloned().collect();
        let mut touched = IndexSet::new();
        for attribute in &attributes {
            self.run_attribute(attribute, &mut touched).await?;
        }

        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "validation rejected");
            return Err(GuardError::Invalid(self.errors.clone()));
        }
        Ok(self.validated(self.data.clone()))
    }

    /// Runs the chains of `attributes` only, after clearing their errors.
    ///
    /// Errors of other attributes are left in place and do not reject the
    /// run, unless this run wrote them (`confirmed`).
    #[instrument(skip_all)]
    pub async fn only<I, S>(&mut self, attributes: I) -> GuardResult<Validated>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested: IndexSet<String> = attributes
            .into_iter()
            .map(|a| a.as_ref().to_owned())
            .collect();
        debug!(attributes = ?requested, "partial validation");

        self.skipped.clear();
        for attribute in &requested {
            self.errors.remove(attribute);
        }

        let order: Vec<String> = self
            .rules
            .keys()
            .filter(|a| requested.contains(*a))
            .cloned()
            .collect();
        let mut touched = IndexSet::new();
        for attribute in &order {
            self.run_attribute(attribute, &mut touched).await?;
        }

        let rejected = self
            .errors
            .filtered(|a| requested.contains(a) || touched.contains(a));
        if !rejected.is_empty() {
            debug!(errors = rejected.len(), "validation rejected");
            return Err(GuardError::Invalid(rejected));
        }

        let validated = requested
            .iter()
            .filter_map(|a| self.data.get(a).map(|v| (a.clone(), v.clone())))
            .collect();
        Ok(self.validated(validated))
    }

    /// Merges `values` into the record and validates their attributes;
    /// without values, validates everything.
    ///
    /// `values` must be a JSON object.
    pub async fn validate(&mut self, values: Option<Value>) -> GuardResult<Validated> {
        match values {
            None => self.all().await,
            Some(values) => {
                let values = into_record(values)?;
                let keys: Vec<String> = values.keys().cloned().collect();
                self.data.extend(values);
                self.only(keys).await
            }
        }
    }

    fn validated(&self, validated: Map<String, Value>) -> Validated {
        let form_data = FormData::from_record(&validated, self.inspector.as_ref());
        Validated {
            validated,
            form_data,
        }
    }

    // ========================================================================
    // CHAIN WALK
    // ========================================================================

    async fn run_attribute(
        &mut self,
        attribute: &str,
        touched: &mut IndexSet<String>,
    ) -> GuardResult<()> {
        let Some(chain) = self.chain(attribute)? else {
            return Ok(());
        };

        let inference = infer(
            chain.datatype_name(),
            self.data.get(attribute),
            self.inspector.as_ref(),
        );
        if let Some(coerced) = inference.coerced {
            self.data.insert(attribute.to_owned(), coerced);
        }
        let mut data_type = inference.data_type;

        for step in chain.steps() {
            if self.skipped.contains(attribute) || self.errors.contains(attribute) {
                debug!(attribute, rule = %step.name, "rest of chain skipped");
                break;
            }

            let outcome = match &step.handler {
                Handler::Passed => {
                    self.errors.remove(attribute);
                    debug!(attribute, "chain passed");
                    break;
                }
                Handler::Unknown => Outcome::from(Step::Pass),
                Handler::Builtin(rule) => {
                    let ctx = RuleContext {
                        attribute,
                        rule: *rule,
                        args: step.args.as_slice(),
                        data_type,
                        data: &self.data,
                        inspector: self.inspector.as_ref(),
                        kinds: &self.kinds,
                        probe: self.probe.as_ref(),
                        password_min_length: self.config.password_min_length,
                    };
                    rules::run(&ctx).await?
                }
                Handler::Custom(handler) => {
                    self.run_custom(attribute, step, handler.as_ref(), data_type)
                        .await
                }
            };

            debug!(attribute, rule = %step.name, step = ?outcome.step, "rule evaluated");
            let defaulted = step.category == RuleCategory::Fillable
                && outcome.replace.is_some()
                && chain.datatype_name().is_none();
            self.apply(attribute, &step.name, outcome, data_type, touched);

            // A default written by the fillable carries its own type.
            if defaulted {
                let inference = infer(None, self.data.get(attribute), self.inspector.as_ref());
                if let Some(coerced) = inference.coerced {
                    self.data.insert(attribute.to_owned(), coerced);
                }
                data_type = inference.data_type;
            }
        }
        Ok(())
    }

    async fn run_custom(
        &self,
        attribute: &str,
        step: &RuleInvocation,
        handler: &dyn RuleHandler,
        data_type: DataType,
    ) -> Outcome {
        let params = custom_params(step);
        let message = self.messages.resolve(&MessageRequest {
            attribute,
            rule: &step.name,
            variant: None,
            data_type,
            params: &params,
            explicit: None,
        });

        let call = RuleCall {
            attribute: attribute.to_owned(),
            value: self.data.get(attribute).cloned(),
            data: self.data.clone(),
            parameters: step.args.iter().map(|a| normalize_argument(a)).collect(),
            data_type,
            locale: self.messages.locale().to_owned(),
            message,
        };

        let failure = |explicit: Option<String>| Failure {
            variant: None,
            params: params.clone(),
            explicit,
        };

        match handler.check(call).await {
            Verdict::Pass => Outcome::from(Step::Pass),
            Verdict::Replace(value) => Outcome {
                replace: Some(value),
                step: Step::Pass,
            },
            Verdict::Fail(message) => Outcome::from(Step::Fail(failure(message))),
            Verdict::FailLocalized(mut by_locale) => {
                let message = by_locale
                    .shift_remove(self.messages.locale())
                    .or_else(|| by_locale.shift_remove(self.messages.system_locale()))
                    .or_else(|| by_locale.into_values().next());
                Outcome::from(Step::Fail(failure(message)))
            }
        }
    }

    // ========================================================================
    // OUTCOMES
    // ========================================================================

    fn apply(
        &mut self,
        attribute: &str,
        rule: &str,
        outcome: Outcome,
        data_type: DataType,
        touched: &mut IndexSet<String>,
    ) {
        if let Some(value) = outcome.replace {
            self.data.insert(attribute.to_owned(), value);
        }

        match outcome.step {
            Step::Pass => {
                self.errors.remove(attribute);
            }
            Step::Keep => {}
            Step::Skip => {
                self.skipped.insert(attribute.to_owned());
            }
            Step::Fail(failure) => {
                let message = self.failure_message(attribute, rule, &failure, data_type);
                self.errors.insert(attribute, message);
                self.skipped.insert(attribute.to_owned());
            }
            Step::FailOn {
                attribute: target,
                failure,
            } => {
                let message = self.failure_message(attribute, rule, &failure, data_type);
                self.errors.insert(target.clone(), message);
                self.skipped.insert(target.clone());
                touched.insert(target);
            }
        }
    }

    fn failure_message(
        &self,
        attribute: &str,
        rule: &str,
        failure: &Failure,
        data_type: DataType,
    ) -> String {
        self.messages.resolve(&MessageRequest {
            attribute,
            rule,
            variant: failure.variant.as_deref(),
            data_type,
            params: &failure.params,
            explicit: failure.explicit.as_deref(),
        })
    }
}

/// Custom rules expose their raw arguments as `:<rule>`.
fn custom_params(step: &RuleInvocation) -> IndexMap<String, String> {
    let mut params = IndexMap::new();
    if !step.args.is_empty() {
        params.insert(step.name.clone(), step.args.join(","));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{from_async_fn, from_fn};
    use crate::registry::RuleDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session(data: Value, rules: Value) -> ValidationSession {
        ValidationSession::make(data, rules, Value::Null, Value::Null).unwrap()
    }

    #[tokio::test]
    async fn test_numeric_coercion_lands_in_validated() {
        let mut s = session(json!({"age": "21"}), json!({"age": "numeric|gte:18"}));
        let done = s.all().await.unwrap();
        assert_eq!(done.validated.get("age"), Some(&json!(21)));
    }

    #[tokio::test]
    async fn test_error_stops_chain() {
        let mut s = session(json!({"name": "  "}), json!({"name": "string|min:3|trim"}));
        let err = s.all().await.unwrap_err();
        assert!(err.errors().unwrap().contains("name"));
        // trim ran before min, so the stored value is trimmed
        assert_eq!(s.data().get("name"), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_custom_rule_replace_and_fail() {
        let mut s = ValidationSession::builder()
            .data(json!({"code": "abc", "n": 3}))
            .register(
                "upper",
                RuleDescriptor::new(from_fn(|call| match &call.value {
                    Some(Value::String(s)) => Verdict::Replace(json!(s.to_uppercase())),
                    _ => Verdict::Fail(None),
                })),
            )
            .register(
                "even",
                RuleDescriptor::new(from_async_fn(|call: RuleCall| async move {
                    let even = call.value.as_ref().and_then(Value::as_i64).is_some_and(|n| n % 2 == 0);
                    Verdict::from(even)
                }))
                .message("The :attribute field must be even."),
            )
            .rule("code", "upper")
            .rule("n", "even")
            .build()
            .unwrap();

        let err = s.all().await.unwrap_err();
        let bag = err.errors().unwrap();
        assert_eq!(bag.get("n"), Some("The n field must be even."));
        assert!(!bag.contains("code"));
        assert_eq!(s.data().get("code"), Some(&json!("ABC")));
    }

    #[tokio::test]
    async fn test_fail_localized_prefers_current_locale() {
        let mut s = ValidationSession::builder()
            .data(json!({"x": 1}))
            .locale("de")
            .register(
                "never",
                RuleDescriptor::new(from_fn(|_| {
                    Verdict::FailLocalized(
                        [("en".to_owned(), "no".to_owned()), ("de".to_owned(), "nein".to_owned())]
                            .into_iter()
                            .collect(),
                    )
                })),
            )
            .rule("x", "never")
            .build()
            .unwrap();
        let err = s.all().await.unwrap_err();
        assert_eq!(err.errors().unwrap().get("x"), Some("nein"));
    }

    #[tokio::test]
    async fn test_rule_misuse_aborts() {
        let mut s = session(json!({"n": 4}), json!({"n": "numeric|gte:abc"}));
        let err = s.all().await.unwrap_err();
        assert!(matches!(err, GuardError::RuleArgument { .. }));
    }

    #[tokio::test]
    async fn test_validate_merges_values() {
        let mut s = session(json!({}), json!({"age": "required|numeric|gte:18", "name": "required"}));
        let done = s.validate(Some(json!({"age": "30"}))).await.unwrap();
        assert_eq!(done.validated, json!({"age": 30}).as_object().unwrap().clone());
        assert!(s.errors().is_empty());

        let err = s.validate(None).await.unwrap_err();
        assert_eq!(err.errors().unwrap().attributes().collect::<Vec<_>>(), vec!["name"]);
    }
}
