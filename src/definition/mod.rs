//! Suite definition types
//!
//! A suite is a tree of plain records: [`Suite`] → [`TestCase`] →
//! [`RequestStep`]. Each level may carry request configuration and hooks;
//! the resolver flattens the three levels into one [`ResolvedRequest`] per
//! executed step.

mod expectation;
mod response;

pub use expectation::{Expectation, Predicate};
pub use response::{Response, ResponseContext};

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::hooks::Hook;

/// Header name to value mapping, case preserved
pub type Headers = BTreeMap<String, String>;

/// Request configuration shared by every level of the suite tree
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// HTTP method, case-insensitive (e.g. "post")
    pub method: Option<String>,
    /// Absolute or relative URL
    pub url: Option<String>,
    pub headers: Headers,
    /// Structured request body
    pub body: Option<Value>,
    /// What the response must satisfy
    pub expected: Expectation,
}

/// Top-level declarative test suite
#[derive(Debug, Clone, Default)]
pub struct Suite {
    /// Label prefixed to every test case label
    pub message: Option<String>,
    pub config: RequestConfig,
    /// Runs once before the first test case
    pub before: Option<Hook<()>>,
    /// Runs once after the last test case
    pub after: Option<Hook<()>>,
    /// Runs before every test case
    pub before_each: Option<Hook<()>>,
    /// Runs after every test case
    pub after_each: Option<Hook<()>>,
    pub tests: Vec<TestCase>,
}

/// A named group of sequential request steps
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    pub message: Option<String>,
    pub config: RequestConfig,
    /// Runs once before the first request step
    pub before: Option<Hook<()>>,
    /// Runs once after the last request step
    pub after: Option<Hook<()>>,
    /// Runs before every request step, after the step's request is resolved
    pub before_each: Option<Hook<ResponseContext>>,
    /// Runs after every request step with the response just received
    pub after_each: Option<Hook<Response>>,
    pub requests: Vec<RequestStep>,
}

/// The smallest executable unit: one request and its expectation
#[derive(Debug, Clone, Default)]
pub struct RequestStep {
    pub message: Option<String>,
    pub config: RequestConfig,
    /// Receives the previous response and may rewrite `next`
    pub before: Option<Hook<ResponseContext>>,
    /// Receives the response of this step
    pub after: Option<Hook<Response>>,
}

/// The fully merged, ready-to-send form of one request step
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedRequest {
    /// Uppercased method; empty when no level defined one
    pub method: String,
    /// Empty when no level defined one
    pub url: String,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub expected: Expectation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResolvedRequest {
    /// Short `METHOD URL` form used in report messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// JSON form attached to failure records
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.describe())
    }
}

impl RequestConfig {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expected(mut self, expected: Expectation) -> Self {
        self.expected = expected;
        self
    }
}
