//! Common test utilities for formguard

#![allow(dead_code)]

use formguard::prelude::*;
use serde_json::{Map, Value};

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Session over `data` and `rules` with default configuration.
pub fn session(data: Value, rules: Value) -> ValidationSession {
    init_tracing();
    ValidationSession::make(data, rules, Value::Null, Value::Null)
        .expect("session should build")
}

/// Unwraps a JSON object literal.
pub fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Error bag of a rejected run.
pub fn rejected(result: GuardResult<Validated>) -> ErrorBag {
    match result {
        Err(GuardError::Invalid(bag)) => bag,
        Err(other) => panic!("expected validation failure, got {other}"),
        Ok(done) => panic!("expected validation failure, got {:?}", done.validated),
    }
}
