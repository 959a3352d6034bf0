//! Expectation descriptors and their evaluation against a response

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Response;
use crate::common::BoxError;
use crate::matcher::{self, Check, Expected};

type PredicateFn = dyn Fn(&Response) -> Result<(), BoxError> + Send + Sync;

/// Custom check invoked with the raw response
#[derive(Clone)]
pub struct Predicate {
    name: String,
    check: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Response) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, response: &Response) -> Result<(), BoxError> {
        (self.check)(response)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

/// What a response must satisfy. Every present field must hold; an absent
/// field places no constraint on that axis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Expectation {
    /// Exact status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Header name (case-insensitive) to literal or pattern
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Expected>,
    /// Full-body deep equality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Subset match of an object body, or per-element match of an array body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_properties: Option<Expected>,
    #[serde(skip)]
    pub assert: Option<Predicate>,
}

impl Expectation {
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Expected>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn body_properties(mut self, properties: impl Into<Expected>) -> Self {
        self.body_properties = Some(properties.into());
        self
    }

    pub fn assert(mut self, predicate: Predicate) -> Self {
        self.assert = Some(predicate);
        self
    }

    /// Layer a more specific expectation on top of this one.
    ///
    /// `body_properties` is taken whole from the most specific layer that
    /// defines it; everything else merges key by key.
    pub fn merge(&mut self, overlay: &Expectation) {
        if overlay.status.is_some() {
            self.status = overlay.status;
        }
        for (name, expected) in &overlay.headers {
            match self.headers.get_mut(name) {
                Some(existing) => existing.merge(expected),
                None => {
                    self.headers.insert(name.clone(), expected.clone());
                }
            }
        }
        if let Some(body) = &overlay.body {
            match self.body.as_mut() {
                Some(existing) => crate::resolver::merge_value(existing, body),
                None => self.body = Some(body.clone()),
            }
        }
        if overlay.body_properties.is_some() {
            self.body_properties = overlay.body_properties.clone();
        }
        if overlay.assert.is_some() {
            self.assert = overlay.assert.clone();
        }
    }

    /// Whether no axis is constrained
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
            && self.body_properties.is_none()
            && self.assert.is_none()
    }

    /// Run every present expectation against a response
    pub fn evaluate(&self, response: &Response) -> Vec<Check> {
        let mut checks = Vec::new();

        if let Some(predicate) = &self.assert {
            let (passed, description) = match predicate.check(response) {
                Ok(()) => (true, format!("custom assertion '{}' holds", predicate.name())),
                Err(e) => (
                    false,
                    format!("custom assertion '{}' holds ({})", predicate.name(), e),
                ),
            };
            checks.push(Check {
                passed,
                path: "response".to_string(),
                description,
            });
        }

        if let Some(status) = self.status {
            let passed = response.status == status;
            let mut description = format!("status is {}", status);
            if !passed {
                description.push_str(&format!(" (got {})", response.status));
            }
            checks.push(Check {
                passed,
                path: "status".to_string(),
                description,
            });
        }

        for (name, expected) in &self.headers {
            let actual = response.header(name).map(|v| Value::String(v.to_string()));
            checks.extend(matcher::matches(
                expected,
                actual.as_ref(),
                &format!("headers.{}", name),
            ));
        }

        if let Some(body) = &self.body {
            checks.push(matcher::equals(body, &response.body, "body"));
        }

        if let Some(properties) = &self.body_properties {
            checks.extend(matcher::matches(properties, Some(&response.body), "body"));
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Response {
        Response::new(201)
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(json!({"id": 3, "email": "a@b.com"}))
    }

    #[test]
    fn test_empty_expectation_produces_no_checks() {
        assert!(Expectation::default().evaluate(&response()).is_empty());
        assert!(Expectation::default().is_empty());
    }

    #[test]
    fn test_status_and_headers() {
        let expectation = Expectation::default()
            .status(201)
            .header("content-type", Expected::pattern("json").unwrap());
        let checks = expectation.evaluate(&response());
        assert!(checks.iter().all(|c| c.passed), "{:?}", checks);

        let checks = Expectation::default().status(200).evaluate(&response());
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
        assert_eq!(checks[0].description, "status is 200 (got 201)");
    }

    #[test]
    fn test_missing_header() {
        let checks = Expectation::default()
            .header("X-Request-Id", "abc")
            .evaluate(&response());
        assert_eq!(checks.len(), 1);
        assert!(!checks[0].passed);
    }

    #[test]
    fn test_body_equality_and_properties() {
        let exact = Expectation::default().body(json!({"id": 3}));
        assert!(!exact.evaluate(&response())[0].passed);

        let subset = Expectation::default().body_properties(json!({"id": 3}));
        assert!(subset.evaluate(&response()).iter().all(|c| c.passed));
    }

    #[test]
    fn test_custom_predicate() {
        let expectation = Expectation::default().assert(Predicate::new("has id", |res| {
            if res.body.get("id").is_some() {
                Ok(())
            } else {
                Err("no id".into())
            }
        }));
        assert!(expectation.evaluate(&response())[0].passed);

        let checks = expectation.evaluate(&Response::new(204));
        assert!(!checks[0].passed);
        assert_eq!(checks[0].description, "custom assertion 'has id' holds (no id)");
    }

    #[test]
    fn test_merge_layers() {
        let mut base = Expectation::default()
            .status(201)
            .header("Accept", "json")
            .body(json!({"a": {"x": 1}}))
            .body_properties(json!({"id": 1, "email": "old"}));
        let overlay = Expectation::default()
            .header("X-Test", "1")
            .body(json!({"a": {"y": 2}}))
            .body_properties(json!({"email": "new"}));

        base.merge(&overlay);

        assert_eq!(base.status, Some(201));
        assert_eq!(base.headers.len(), 2);
        assert_eq!(base.body, Some(json!({"a": {"x": 1, "y": 2}})));
        // Taken whole from the overlay, not merged with the base
        let properties = base.body_properties.unwrap();
        assert!(properties.get("id").is_none());
        assert!(properties.get("email").is_some());
    }
}
