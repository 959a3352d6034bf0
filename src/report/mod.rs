//! Reporting collaborator
//!
//! The runner announces each test case, streams one record per elementary
//! assertion, signals the terminal state of every test case and finally the
//! end of the run.

mod console;
mod memory;

pub use console::ConsoleReporter;
pub use memory::{MemoryReporter, ReportEvent};

use serde::Serialize;

use crate::common::Error;

/// One named pass/fail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionRecord {
    pub passed: bool,
    /// `METHOD URL - optional message - description`
    pub message: String,
    /// Serialized resolved request, attached to transport and hook failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// Per test case result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestCaseReport {
    pub label: String,
    pub requests_sent: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    /// One entry per request step that received a response
    pub steps: Vec<StepReport>,
    /// Terminal error, if the test case failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one request step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// `METHOD URL` as sent
    pub request: String,
    pub status: u16,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
}

impl TestCaseReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tests: Vec<TestCaseReport>,
    /// Set when a fatal error ended the run early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.len() - self.passed()
    }

    pub fn requests_sent(&self) -> usize {
        self.tests.iter().map(|t| t.requests_sent).sum()
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failed() == 0
    }
}

/// Consumes test lifecycle events
pub trait Reporter: Send {
    /// A test case is about to run
    fn test_started(&mut self, label: &str);

    /// One elementary assertion was evaluated
    fn assertion(&mut self, record: &AssertionRecord);

    /// A test case finished, successfully or with the causing error
    fn test_finished(&mut self, label: &str, result: Result<(), &Error>);

    /// All test cases finished (or the run was aborted)
    fn run_finished(&mut self, summary: &RunSummary);
}
