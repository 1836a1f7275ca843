//! Chain ordering and handler resolution

use tracing::{debug, warn};

use super::{Handler, OrderedChain, RuleCategory, RuleInvocation};
use crate::config::UnknownRulePolicy;
use crate::foundation::{GuardError, GuardResult};
use crate::registry::RuleRegistry;
use crate::rules::BuiltinRule;
use crate::spec::{NormalizedRules, RuleEntry};

fn resolve(
    attribute: &str,
    entry: &RuleEntry,
    registry: &RuleRegistry,
    policy: UnknownRulePolicy,
) -> GuardResult<Handler> {
    if let Some(handler) = &entry.handler {
        return Ok(Handler::Custom(handler.clone()));
    }
    if let Some(rule) = BuiltinRule::from_name(&entry.name) {
        return Ok(Handler::Builtin(rule));
    }
    if let Some(handler) = registry.handler(&entry.name) {
        return Ok(Handler::Custom(handler.clone()));
    }
    match policy {
        UnknownRulePolicy::Deny => Err(GuardError::UnknownRule {
            attribute: attribute.to_owned(),
            rule: entry.name.clone(),
        }),
        UnknownRulePolicy::Warn => {
            warn!(attribute, rule = %entry.name, "unknown rule, it will pass unchecked");
            Ok(Handler::Unknown)
        }
    }
}

/// Sorts `rules` into chain order and resolves every handler.
///
/// Only the first fillable and the first datatype are kept; later ones are
/// dropped. Sanitizers follow the registry's sanitizer order, everything
/// else keeps the order it was written in.
pub fn build_chain(
    attribute: &str,
    rules: &NormalizedRules,
    registry: &RuleRegistry,
    policy: UnknownRulePolicy,
) -> GuardResult<OrderedChain> {
    let mut fillable: Option<&RuleEntry> = None;
    let mut datatype: Option<&RuleEntry> = None;
    let mut others = Vec::new();

    for entry in rules.entries() {
        let slot = match registry.category_of(&entry.name) {
            RuleCategory::Fillable => &mut fillable,
            RuleCategory::Datatype => &mut datatype,
            RuleCategory::Sanitizer => continue,
            RuleCategory::Other => {
                others.push(entry);
                continue;
            }
        };
        if slot.is_some() {
            debug!(attribute, rule = %entry.name, "surplus rule dropped from chain");
        } else {
            *slot = Some(entry);
        }
    }

    let sanitizers = registry
        .categories()
        .sanitizers()
        .iter()
        .filter_map(|name| rules.get(name));

    let ordered = fillable
        .into_iter()
        .map(|e| (e, RuleCategory::Fillable))
        .chain(datatype.into_iter().map(|e| (e, RuleCategory::Datatype)))
        .chain(sanitizers.map(|e| (e, RuleCategory::Sanitizer)))
        .chain(others.into_iter().map(|e| (e, RuleCategory::Other)));

    let mut steps = Vec::with_capacity(rules.len() + 1);
    for (entry, category) in ordered {
        steps.push(RuleInvocation {
            name: entry.name.clone(),
            args: entry.args.clone(),
            handler: resolve(attribute, entry, registry, policy)?,
            category,
        });
    }

    debug!(attribute, steps = steps.len(), "chain built");
    Ok(OrderedChain::new(attribute, steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Verdict, from_fn};
    use crate::registry::RuleDescriptor;
    use crate::spec::{RuleSpec, normalize};
    use pretty_assertions::assert_eq;

    fn chain(spec: &str) -> GuardResult<OrderedChain> {
        let rules = normalize("field", &RuleSpec::from(spec))?;
        build_chain("field", &rules, &RuleRegistry::default(), UnknownRulePolicy::Deny)
    }

    #[test]
    fn test_canonical_order() {
        let chain = chain("min:3|trim|string|required|capitalize").unwrap();
        assert_eq!(chain.names(), vec!["required", "string", "trim", "capitalize", "min"]);
        assert!(chain.steps().last().unwrap().is_sentinel());
        assert_eq!(chain.datatype_name(), Some("string"));
    }

    #[test]
    fn test_surplus_fillables_and_datatypes_dropped() {
        let chain = chain("nullable|required|numeric|string|gte:1").unwrap();
        assert_eq!(chain.names(), vec!["nullable", "numeric", "gte"]);
    }

    #[test]
    fn test_sanitizers_follow_registry_order() {
        let chain = chain("capitalize|format_date|trim").unwrap();
        assert_eq!(chain.names(), vec!["trim", "capitalize", "format_date"]);
    }

    #[test]
    fn test_unknown_rule_policy() {
        let err = chain("required|shiny").unwrap_err();
        assert_eq!(
            err,
            GuardError::UnknownRule {
                attribute: "field".into(),
                rule: "shiny".into()
            }
        );

        let rules = normalize("field", &RuleSpec::from("required|shiny")).unwrap();
        let chain =
            build_chain("field", &rules, &RuleRegistry::default(), UnknownRulePolicy::Warn).unwrap();
        assert_eq!(chain.steps()[1].handler, Handler::Unknown);
    }

    #[test]
    fn test_registered_priority_places_custom_rule() {
        let mut registry = RuleRegistry::default();
        registry
            .register("slug", RuleDescriptor::new(from_fn(|_| Verdict::Pass)).priority(3))
            .unwrap();
        let rules = normalize("field", &RuleSpec::from("min:1|slug|string")).unwrap();
        let chain = build_chain("field", &rules, &registry, UnknownRulePolicy::Deny).unwrap();
        assert_eq!(chain.names(), vec!["string", "slug", "min"]);
        assert!(matches!(chain.steps()[1].handler, Handler::Custom(_)));
    }
}
