//! Session state, construction and mutation

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::debug;

use crate::chain::{ChainCache, OrderedChain, build_chain};
use crate::config::EngineConfig;
use crate::foundation::{ErrorBag, FileInspector, GuardError, GuardResult, JsonFileInspector};
use crate::messages::MessageResolver;
use crate::messages::catalog::kind_of;
use crate::probe::{NoProbe, UrlProbe};
use crate::registry::{RuleBatch, RuleDescriptor, RuleRegistry};
use crate::rules::{BuiltinRule, FileKinds};
use crate::spec::{NormalizedRules, RuleSpec, normalize};

// ============================================================================
// SESSION
// ============================================================================

/// One data record under validation together with everything needed to
/// validate it.
#[derive(Debug)]
pub struct ValidationSession {
    pub(super) data: Map<String, Value>,
    pub(super) rules: IndexMap<String, NormalizedRules>,
    pub(super) errors: ErrorBag,
    pub(super) skipped: IndexSet<String>,
    pub(super) registry: RuleRegistry,
    pub(super) chains: ChainCache,
    pub(super) messages: MessageResolver,
    pub(super) inspector: Arc<dyn FileInspector>,
    pub(super) probe: Arc<dyn UrlProbe>,
    pub(super) kinds: FileKinds,
    pub(super) config: EngineConfig,
}

impl ValidationSession {
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Shortcut for the common case: data, rules, messages and labels, all
    /// as JSON, with the default configuration.
    ///
    /// `rules` maps attribute names to any JSON rule form; `messages` and
    /// `attributes` may be `Value::Null`.
    pub fn make(data: Value, rules: Value, messages: Value, attributes: Value) -> GuardResult<Self> {
        let mut builder = Self::builder().data(data).rules_json(rules)?;
        if !messages.is_null() {
            builder = builder.messages(messages);
        }
        if !attributes.is_null() {
            builder = builder.attributes(attributes);
        }
        builder.build()
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The record, including coercions and sanitizing from earlier runs.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Errors left by the last run.
    #[must_use]
    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        self.messages.locale()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn messages(&self) -> &MessageResolver {
        &self.messages
    }

    /// Locale tables, for adding further locales.
    pub fn messages_mut(&mut self) -> &mut MessageResolver {
        &mut self.messages
    }

    /// Attributes in rule order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Execution plan of `attribute`, built on first use.
    pub fn chain(&self, attribute: &str) -> GuardResult<Option<Arc<OrderedChain>>> {
        let Some(rules) = self.rules.get(attribute) else {
            return Ok(None);
        };
        self.chains
            .get_or_build(attribute, rules, self.registry.generation(), || {
                build_chain(attribute, rules, &self.registry, self.config.unknown_rules)
            })
            .map(Some)
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        let locale = locale.into();
        debug!(locale = %locale, "locale changed");
        self.messages.set_locale(locale);
    }

    /// Replaces the attribute display labels.
    pub fn set_attributes(&mut self, labels: &Value) -> GuardResult<()> {
        self.messages.set_attributes(labels)
    }

    /// Replaces the user messages.
    pub fn set_messages(&mut self, messages: &Value) -> GuardResult<()> {
        self.messages.set_messages(messages)
    }

    /// Replaces the record.
    pub fn set_data(&mut self, data: Value) -> GuardResult<()> {
        self.data = into_record(data)?;
        Ok(())
    }

    /// Replaces every rule set and builds the new chains.
    ///
    /// Inline handlers are registered under their rule name unless that name
    /// is built in or already registered.
    pub fn set_rules<I, K, S>(&mut self, rules: I) -> GuardResult<()>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<RuleSpec>,
    {
        let mut normalized = IndexMap::new();
        for (attribute, spec) in rules {
            let attribute = attribute.into();
            let spec = spec.into();
            let entries = normalize(&attribute, &spec)?;
            normalized.insert(attribute, entries);
        }

        for entries in normalized.values() {
            for entry in entries.entries() {
                let Some(handler) = &entry.handler else {
                    continue;
                };
                if BuiltinRule::from_name(&entry.name).is_none()
                    && !self.registry.contains(&entry.name)
                {
                    self.registry
                        .register(&entry.name, RuleDescriptor::new(handler.clone()))?;
                }
            }
        }

        self.rules = normalized;
        for attribute in self.rules.keys() {
            self.chain(attribute)?;
        }
        Ok(())
    }

    /// Like [`set_rules`](Self::set_rules) for a JSON object of
    /// `attribute → rules`.
    pub fn set_rules_json(&mut self, rules: Value) -> GuardResult<()> {
        self.set_rules(rules_from_json(rules)?)
    }

    // ------------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------------

    /// Registers a custom rule and its messages.
    pub fn register(&mut self, name: &str, descriptor: RuleDescriptor) -> GuardResult<()> {
        let messages = descriptor.messages_by_locale(self.messages.system_locale());
        self.registry.register(name, descriptor)?;
        self.messages.tables_mut().set_rule_messages(name, &messages);
        Ok(())
    }

    /// Registers every rule of `batch`, stopping at the first failure.
    pub fn register_batch(&mut self, batch: impl Into<RuleBatch>) -> GuardResult<()> {
        for (name, descriptor) in batch.into().into_pairs() {
            self.register(&name, descriptor)?;
        }
        Ok(())
    }

    /// Forgets a custom rule and its messages.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.registry.remove(name);
        if removed {
            self.messages.tables_mut().remove_rule(name);
        }
        removed
    }
}

pub(super) fn into_record(data: Value) -> GuardResult<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(GuardError::Data(kind_of(&other).to_owned())),
    }
}

fn rules_from_json(rules: Value) -> GuardResult<Vec<(String, RuleSpec)>> {
    match rules {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(attribute, spec)| (attribute, RuleSpec::from_json(spec)))
            .collect()),
        other => Err(GuardError::specification(
            "*",
            format!("rules must be an object of attribute specifications, got {}", kind_of(&other)),
        )),
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Assembles a [`ValidationSession`].
///
/// Registrations are applied before the rules, so rule sets may use the
/// custom rules they introduce.
#[derive(Debug, Default)]
pub struct SessionBuilder {
    data: Option<Value>,
    rules: Vec<(String, RuleSpec)>,
    messages: Option<Value>,
    attributes: Option<Value>,
    locale: Option<String>,
    config: EngineConfig,
    inspector: Option<Arc<dyn FileInspector>>,
    probe: Option<Arc<dyn UrlProbe>>,
    #[cfg(feature = "http-probe")]
    http_probe: bool,
    registrations: Vec<(String, RuleDescriptor)>,
}

impl SessionBuilder {
    /// The record to validate; must be a JSON object.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Adds the rules of one attribute.
    #[must_use]
    pub fn rule(mut self, attribute: impl Into<String>, spec: impl Into<RuleSpec>) -> Self {
        self.rules.push((attribute.into(), spec.into()));
        self
    }

    /// Adds every attribute of a JSON rules object.
    pub fn rules_json(mut self, rules: Value) -> GuardResult<Self> {
        self.rules.extend(rules_from_json(rules)?);
        Ok(self)
    }

    #[must_use]
    pub fn messages(mut self, messages: Value) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Attribute display labels.
    #[must_use]
    pub fn attributes(mut self, labels: Value) -> Self {
        self.attributes = Some(labels);
        self
    }

    /// Overrides `EngineConfig::locale`.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn inspector(mut self, inspector: Arc<dyn FileInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    #[must_use]
    pub fn probe(mut self, probe: Arc<dyn UrlProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Uses [`HttpProbe`](crate::probe::HttpProbe) with the configured
    /// timeout for `active_url`.
    #[cfg(feature = "http-probe")]
    #[must_use]
    pub fn http_probe(mut self) -> Self {
        self.http_probe = true;
        self
    }

    #[must_use]
    pub fn register(mut self, name: impl Into<String>, descriptor: RuleDescriptor) -> Self {
        self.registrations.push((name.into(), descriptor));
        self
    }

    pub fn build(self) -> GuardResult<ValidationSession> {
        self.config.validate()?;
        let kinds = FileKinds::from_config(&self.config.file_patterns)?;
        let locale = self.locale.or_else(|| self.config.locale.clone());

        let mut messages = MessageResolver::new(self.config.system_locale.clone(), locale);
        if let Some(table) = &self.messages {
            messages.set_messages(table)?;
        }
        if let Some(labels) = &self.attributes {
            messages.set_attributes(labels)?;
        }

        #[cfg(feature = "http-probe")]
        let probe = if self.http_probe {
            let timeout = std::time::Duration::from_millis(self.config.probe_timeout_ms);
            Arc::new(crate::probe::HttpProbe::new(timeout)) as Arc<dyn UrlProbe>
        } else {
            self.probe.unwrap_or_else(|| Arc::new(NoProbe))
        };
        #[cfg(not(feature = "http-probe"))]
        let probe = self.probe.unwrap_or_else(|| Arc::new(NoProbe));

        let mut session = ValidationSession {
            data: into_record(self.data.unwrap_or_else(|| Value::Object(Map::new())))?,
            rules: IndexMap::new(),
            errors: ErrorBag::new(),
            skipped: IndexSet::new(),
            registry: RuleRegistry::new(),
            chains: ChainCache::with_capacity(self.config.chain_cache_capacity),
            messages,
            inspector: self.inspector.unwrap_or_else(|| Arc::new(JsonFileInspector)),
            probe,
            kinds,
            config: self.config,
        };

        for (name, descriptor) in self.registrations {
            session.register(&name, descriptor)?;
        }
        session.set_rules(self.rules)?;
        debug!(
            attributes = session.rules.len(),
            locale = session.locale(),
            "validation session ready"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Verdict, from_fn};
    use crate::spec::RuleArg;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_make_rejects_non_object_data() {
        let err = ValidationSession::make(json!([1]), json!({}), Value::Null, Value::Null)
            .unwrap_err();
        assert_eq!(err, GuardError::Data("an array".into()));
    }

    #[test]
    fn test_unknown_rule_fails_at_build() {
        let err = ValidationSession::make(
            json!({}),
            json!({"name": "required|shiny"}),
            Value::Null,
            Value::Null,
        )
        .unwrap_err();
        assert!(matches!(err, GuardError::UnknownRule { .. }));
    }

    #[test]
    fn test_builder_registers_before_rules() {
        let session = ValidationSession::builder()
            .data(json!({"slug": "a-b"}))
            .register("slug", RuleDescriptor::new(from_fn(|_| Verdict::Pass)).priority(3))
            .rule("slug", "slug|string")
            .build()
            .unwrap();
        let chain = session.chain("slug").unwrap().unwrap();
        assert_eq!(chain.names(), vec!["string", "slug"]);
    }

    #[test]
    fn test_inline_handler_is_registered() {
        let mut session = ValidationSession::builder().build().unwrap();
        let handler = from_fn(|_| Verdict::Pass);
        session
            .set_rules([(
                "code",
                RuleSpec::from_pairs([
                    ("even", RuleArg::from(handler)),
                    ("required", RuleArg::from(true)),
                ]),
            )])
            .unwrap();
        assert!(session.registry().contains("even"));
        assert_eq!(session.attributes().collect::<Vec<_>>(), vec!["code"]);
    }

    #[test]
    fn test_register_binds_messages_and_remove_drops_them() {
        let mut session = ValidationSession::builder().build().unwrap();
        session
            .register(
                "slug",
                RuleDescriptor::new(from_fn(|_| Verdict::Pass)).message("Bad slug"),
            )
            .unwrap();
        assert_eq!(
            session.messages().tables().lookup("en", "slug", None, "string"),
            Some("Bad slug")
        );
        assert!(session.remove("slug"));
        assert_eq!(session.messages().tables().lookup("en", "slug", None, "string"), None);
    }

    #[test]
    fn test_config_locale_is_used() {
        let config = EngineConfig {
            locale: Some("de".into()),
            ..EngineConfig::default()
        };
        let session = ValidationSession::builder().config(config).build().unwrap();
        assert_eq!(session.locale(), "de");
    }
}
