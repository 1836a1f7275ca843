//! Message resolution
//!
//! The first source that has something wins:
//!
//! 1. user messages of the current locale, then of the system locale, each
//!    tried with `attrRuleVariant`, `attrRule`, `attr.rule.variant`,
//!    `attr.rule`
//! 2. the message the rule itself supplied
//! 3. the locale table entry for the rule (current locale, then system)
//! 4. `validation.<rule>`
//!
//! The chosen template then has its `:tokens` replaced; `:attribute` becomes
//! the attribute's display label.

use indexmap::IndexMap;
use serde_json::Value;

use super::{LocaleTables, MessageCatalog};
use crate::foundation::GuardResult;
use crate::foundation::predicates::{join_camel, substitute};
use crate::infer::DataType;

/// Everything needed to word one failure.
#[derive(Debug, Clone, Copy)]
pub struct MessageRequest<'a> {
    pub attribute: &'a str,
    pub rule: &'a str,
    pub variant: Option<&'a str>,
    pub data_type: DataType,
    pub params: &'a IndexMap<String, String>,
    pub explicit: Option<&'a str>,
}

/// Per-session message state.
#[derive(Debug, Clone)]
pub struct MessageResolver {
    system_locale: String,
    locale: String,
    messages: MessageCatalog,
    labels: MessageCatalog,
    tables: LocaleTables,
}

impl MessageResolver {
    pub fn new(system_locale: impl Into<String>, locale: Option<String>) -> Self {
        let system_locale = system_locale.into();
        Self {
            locale: locale.unwrap_or_else(|| system_locale.clone()),
            system_locale,
            messages: MessageCatalog::new(),
            labels: MessageCatalog::new(),
            tables: LocaleTables::default(),
        }
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn system_locale(&self) -> &str {
        &self.system_locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// Replaces the user messages.
    pub fn set_messages(&mut self, messages: &Value) -> GuardResult<()> {
        self.messages = MessageCatalog::from_value(messages, &self.system_locale)?;
        Ok(())
    }

    /// Replaces the attribute labels.
    pub fn set_attributes(&mut self, labels: &Value) -> GuardResult<()> {
        self.labels = MessageCatalog::from_value(labels, &self.system_locale)?;
        Ok(())
    }

    #[must_use]
    pub fn tables(&self) -> &LocaleTables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut LocaleTables {
        &mut self.tables
    }

    /// Display label of `attribute`: current locale, system locale, raw name.
    #[must_use]
    pub fn label<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.labels
            .get_or_fallback(&self.locale, &self.system_locale, attribute)
            .unwrap_or(attribute)
    }

    fn user_message(&self, request: &MessageRequest<'_>) -> Option<&str> {
        let MessageRequest {
            attribute,
            rule,
            variant,
            ..
        } = *request;

        let mut keys = Vec::with_capacity(4);
        if let Some(variant) = variant {
            keys.push(join_camel(&[attribute, rule, variant]));
        }
        keys.push(join_camel(&[attribute, rule]));
        if let Some(variant) = variant {
            keys.push(format!("{attribute}.{rule}.{variant}"));
        }
        keys.push(format!("{attribute}.{rule}"));

        [self.locale.as_str(), self.system_locale.as_str()]
            .into_iter()
            .find_map(|locale| keys.iter().find_map(|key| self.messages.get(locale, key)))
    }

    /// Picks the unsubstituted template for `request`.
    #[must_use]
    pub fn template(&self, request: &MessageRequest<'_>) -> String {
        let data_type = request.data_type.as_str();
        self.user_message(request)
            .or(request.explicit)
            .or_else(|| {
                [self.locale.as_str(), self.system_locale.as_str()]
                    .into_iter()
                    .find_map(|locale| {
                        self.tables
                            .lookup(locale, request.rule, request.variant, data_type)
                    })
            })
            .map_or_else(|| format!("validation.{}", request.rule), str::to_owned)
    }

    /// Substitutes `:tokens`, with `:attribute` bound to the label.
    #[must_use]
    pub fn render(
        &self,
        template: &str,
        attribute: &str,
        params: &IndexMap<String, String>,
    ) -> String {
        let mut bound = params.clone();
        bound.insert("attribute".to_owned(), self.label(attribute).to_owned());
        substitute(template, &bound)
    }

    /// Template selection and substitution in one step.
    #[must_use]
    pub fn resolve(&self, request: &MessageRequest<'_>) -> String {
        self.render(&self.template(request), request.attribute, request.params)
    }
}
