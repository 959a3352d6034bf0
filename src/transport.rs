//! Transport boundary
//!
//! The engine never performs network calls itself; it hands every resolved
//! request to a [`Transport`] supplied by the caller.

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;

use crate::definition::{ResolvedRequest, Response};

/// Methods accepted by the default [`Transport::supports`]
pub const STANDARD_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// A transport-level failure (connection refused, reset, timeout, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for TransportError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for TransportError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Performs the actual call for a resolved request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether this transport can send requests with `method` (uppercased)
    fn supports(&self, method: &str) -> bool {
        STANDARD_METHODS.contains(&method)
    }

    /// Send the request and return the received response
    async fn send(&self, request: &ResolvedRequest) -> Result<Response, TransportError>;
}

type Handler = dyn Fn(&ResolvedRequest) -> Result<Response, TransportError> + Send + Sync;

/// In-process transport driven by a handler closure.
///
/// Records every request it receives, in order.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<ResolvedRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ResolvedRequest) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<ResolvedRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ResolvedRequest) -> Result<Response, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        (self.handler)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let transport = MockTransport::new(|req| {
            if req.url == "/down" {
                Err("connection refused".into())
            } else {
                Ok(Response::new(204))
            }
        });

        let ok = ResolvedRequest {
            method: "GET".into(),
            url: "/up".into(),
            ..Default::default()
        };
        let down = ResolvedRequest {
            url: "/down".into(),
            ..ok.clone()
        };

        assert_eq!(transport.send(&ok).await.unwrap().status, 204);
        let err = transport.send(&down).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].url, "/down");
    }

    #[test]
    fn test_default_method_support() {
        let transport = MockTransport::new(|_| Ok(Response::new(200)));
        assert!(transport.supports("PATCH"));
        assert!(!transport.supports("BREW"));
        assert!(!transport.supports("get"));
    }
}
