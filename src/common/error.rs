//! Error types for the suite engine
//!
//! Variants are grouped by how far a failure reaches: definition errors abort
//! the whole run, transport and hook failures abort the current test case,
//! assertion failures only mark it as failed.

use thiserror::Error;

use crate::hooks::HookStage;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by user hooks and predicates
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the suite engine
#[derive(Error, Debug)]
pub enum Error {
    // === Definition Errors ===
    #[error("Request definition must contain `method` ({step})")]
    MissingMethod { step: String },

    #[error("Request definition must contain `url` ({step})")]
    MissingUrl { step: String },

    #[error("Transport does not support HTTP method {method}")]
    UnsupportedMethod { method: String },

    #[error("Invalid expectation pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Execution Errors ===
    #[error("Transport failed for {request}: {reason}")]
    Transport { request: String, reason: String },

    #[error("Hook '{stage}' of {owner} failed: {reason}")]
    Hook {
        stage: HookStage,
        owner: String,
        reason: String,
    },

    #[error("{what} timed out after {secs} seconds")]
    Timeout { what: String, secs: u64 },

    #[error("{failed} assertion(s) failed")]
    AssertionsFailed { failed: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a hook failure error
    pub fn hook(stage: HookStage, owner: &str, source: &BoxError) -> Self {
        Self::Hook {
            stage,
            owner: owner.to_string(),
            reason: source.to_string(),
        }
    }

    /// Create a transport failure error carrying the offending request
    pub fn transport(request: &str, reason: &str) -> Self {
        Self::Transport {
            request: request.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(what: &str, secs: u64) -> Self {
        Self::Timeout {
            what: what.to_string(),
            secs,
        }
    }

    /// Whether this error is fatal for the whole run
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            Error::MissingMethod { .. }
                | Error::MissingUrl { .. }
                | Error::UnsupportedMethod { .. }
                | Error::InvalidPattern { .. }
        )
    }
}
