//! Custom rule handlers
//!
//! User-defined rules implement [`RuleHandler`]. A handler receives an owned
//! [`RuleCall`] snapshot of the attribute under validation and answers with a
//! [`Verdict`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use formguard::prelude::*;
//!
//! // Synchronous closure
//! let even = from_fn(|call| {
//!     call.value.as_ref().and_then(|v| v.as_i64()).is_some_and(|n| n % 2 == 0).into()
//! });
//!
//! // Asynchronous closure
//! let unique = from_async_fn(|call: RuleCall| async move {
//!     if lookup(&call.value).await { call.fail("already taken") } else { Verdict::Pass }
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::infer::DataType;

// ============================================================================
// CALL CONTEXT
// ============================================================================

/// Snapshot handed to a custom rule.
#[derive(Debug, Clone)]
pub struct RuleCall {
    /// Attribute under validation.
    pub attribute: String,
    /// Current value of the attribute (`None` when absent from the record).
    pub value: Option<Value>,
    /// The whole record as it stands when the rule runs.
    pub data: Map<String, Value>,
    /// Rule arguments, JSON-normalized (`"18"` arrives as `18`).
    pub parameters: Vec<Value>,
    /// Type the chain settled on for this attribute.
    pub data_type: DataType,
    /// Locale active for this run.
    pub locale: String,
    /// Message the engine would record if the rule fails without one.
    pub message: String,
}

impl RuleCall {
    /// Fails the rule with `message`.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> Verdict {
        Verdict::Fail(Some(message.into()))
    }

    /// First parameter, if any.
    #[must_use]
    pub fn parameter(&self, index: usize) -> Option<&Value> {
        self.parameters.get(index)
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// What a custom rule decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The value is acceptable.
    Pass,
    /// The value is acceptable after replacing it.
    Replace(Value),
    /// The value is rejected, optionally with a message.
    Fail(Option<String>),
    /// The value is rejected with a message per locale.
    FailLocalized(IndexMap<String, String>),
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok { Self::Pass } else { Self::Fail(None) }
    }
}

impl From<&str> for Verdict {
    fn from(message: &str) -> Self {
        Self::Fail(Some(message.to_owned()))
    }
}

impl From<String> for Verdict {
    fn from(message: String) -> Self {
        Self::Fail(Some(message))
    }
}

impl From<Result<(), String>> for Verdict {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::Pass,
            Err(message) => Self::Fail(Some(message)),
        }
    }
}

// ============================================================================
// HANDLER TRAIT
// ============================================================================

/// A user-defined validation rule.
#[async_trait]
pub trait RuleHandler: Send + Sync {
    async fn check(&self, call: RuleCall) -> Verdict;
}

/// Handler adapter for a synchronous closure.
pub struct FnHandler<F> {
    check_fn: F,
}

#[async_trait]
impl<F> RuleHandler for FnHandler<F>
where
    F: Fn(&RuleCall) -> Verdict + Send + Sync,
{
    async fn check(&self, call: RuleCall) -> Verdict {
        (self.check_fn)(&call)
    }
}

type BoxedCheck = Box<dyn Fn(RuleCall) -> BoxFuture<'static, Verdict> + Send + Sync>;

/// Handler adapter for an asynchronous closure.
pub struct AsyncFnHandler {
    check_fn: BoxedCheck,
}

#[async_trait]
impl RuleHandler for AsyncFnHandler {
    async fn check(&self, call: RuleCall) -> Verdict {
        (self.check_fn)(call).await
    }
}

/// Wraps a synchronous closure into a shareable handler.
pub fn from_fn<F>(check_fn: F) -> Arc<dyn RuleHandler>
where
    F: Fn(&RuleCall) -> Verdict + Send + Sync + 'static,
{
    Arc::new(FnHandler { check_fn })
}

/// Wraps an asynchronous closure into a shareable handler.
pub fn from_async_fn<F, Fut>(check_fn: F) -> Arc<dyn RuleHandler>
where
    F: Fn(RuleCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Verdict> + Send + 'static,
{
    Arc::new(AsyncFnHandler {
        check_fn: Box::new(move |call| check_fn(call).boxed()),
    })
}

// ============================================================================
// NAMED HANDLER
// ============================================================================

/// A handler carrying the rule name it is registered under.
#[derive(Clone)]
pub struct NamedHandler {
    pub name: String,
    pub handler: Arc<dyn RuleHandler>,
}

impl NamedHandler {
    pub fn new(name: impl Into<String>, handler: Arc<dyn RuleHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// A handler without a name registers as `anonymous`.
    pub fn anonymous(handler: Arc<dyn RuleHandler>) -> Self {
        Self::new("anonymous", handler)
    }
}

impl fmt::Debug for NamedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(value: Value) -> RuleCall {
        RuleCall {
            attribute: "n".into(),
            value: Some(value),
            data: Map::new(),
            parameters: vec![json!(2)],
            data_type: DataType::Numeric,
            locale: "en".into(),
            message: "validation.even".into(),
        }
    }

    #[test]
    fn test_verdict_conversions() {
        assert_eq!(Verdict::from(true), Verdict::Pass);
        assert_eq!(Verdict::from(false), Verdict::Fail(None));
        assert_eq!(Verdict::from("nope"), Verdict::Fail(Some("nope".into())));
        assert_eq!(Verdict::from(Err::<(), _>("bad".to_owned())), Verdict::Fail(Some("bad".into())));
    }

    #[tokio::test]
    async fn test_sync_adapter() {
        let even = from_fn(|call| {
            let divisor = call.parameter(0).and_then(Value::as_i64).unwrap_or(2);
            call.value
                .as_ref()
                .and_then(Value::as_i64)
                .is_some_and(|n| n % divisor == 0)
                .into()
        });
        assert_eq!(even.check(call(json!(4))).await, Verdict::Pass);
        assert_eq!(even.check(call(json!(5))).await, Verdict::Fail(None));
    }

    #[tokio::test]
    async fn test_async_adapter_can_fail_with_message() {
        let handler = from_async_fn(|call: RuleCall| async move {
            tokio::task::yield_now().await;
            if call.value == Some(json!("taken")) {
                call.fail("already taken")
            } else {
                Verdict::Replace(json!("free"))
            }
        });
        assert_eq!(
            handler.check(call(json!("taken"))).await,
            Verdict::Fail(Some("already taken".into()))
        );
        assert_eq!(handler.check(call(json!("x"))).await, Verdict::Replace(json!("free")));
    }
}
