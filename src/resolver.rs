//! Layered configuration resolution
//!
//! Flattens suite, test-case and request-step configuration into one
//! [`ResolvedRequest`]. Headers, body and expectations deep-merge in the
//! order suite → test case → step. Method and URL are not merged: a value
//! set on the step always wins, otherwise the first level (suite, then test
//! case) that defines one is inherited.

use serde_json::Value;

use crate::definition::{Expectation, Headers, RequestStep, ResolvedRequest, Suite, TestCase};

/// Build the request for one step. Never fails; a missing method or URL is
/// left empty and rejected when the request is about to be sent.
pub fn resolve(suite: &Suite, test: &TestCase, step: &RequestStep) -> ResolvedRequest {
    let layers = [&suite.config, &test.config, &step.config];

    let mut headers = Headers::new();
    let mut body: Option<Value> = None;
    let mut expected = Expectation::default();

    for layer in layers {
        for (name, value) in &layer.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(layer_body) = &layer.body {
            match body.as_mut() {
                Some(existing) => merge_value(existing, layer_body),
                None => body = Some(layer_body.clone()),
            }
        }
        expected.merge(&layer.expected);
    }

    let method = pick(
        step.config.method.as_deref(),
        [suite.config.method.as_deref(), test.config.method.as_deref()],
    )
    .to_ascii_uppercase();
    let url = pick(
        step.config.url.as_deref(),
        [suite.config.url.as_deref(), test.config.url.as_deref()],
    )
    .to_string();

    ResolvedRequest {
        method,
        url,
        headers,
        body,
        expected,
        message: step.message.clone(),
    }
}

/// Explicit step override first, then the broadest level that defines a value
fn pick<'a>(step: Option<&'a str>, inherited: [Option<&'a str>; 2]) -> &'a str {
    std::iter::once(step)
        .chain(inherited)
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or("")
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key; arrays and scalars from `overlay` replace the
/// existing value, they are never concatenated.
pub fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, _) => *slot = overlay.clone(),
    }
}
