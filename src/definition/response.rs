//! Responses and the context threaded between request steps

use serde::Serialize;
use serde_json::Value;

use super::{Headers, ResolvedRequest};

/// A response as returned by the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    /// Parsed body; `Null` when the response had none
    pub body: Value,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a body value by JSON pointer (e.g. `/id`)
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.body.pointer(pointer)
    }
}

/// Carrier handed to the `before` hooks of a request step.
///
/// `response` is the previous step's response (`None` for the first step of
/// a test case); `next` is the request about to be sent. Hooks may rewrite
/// `next` and the engine sends whatever it holds once they return.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub response: Option<Response>,
    pub next: ResolvedRequest,
}

impl ResponseContext {
    /// Body value of the previous response by JSON pointer
    pub fn previous(&self, pointer: &str) -> Option<&Value> {
        self.response.as_ref().and_then(|r| r.pointer(pointer))
    }
}
