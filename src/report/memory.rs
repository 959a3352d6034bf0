//! In-memory reporter

use super::{AssertionRecord, Reporter, RunSummary};
use crate::common::Error;

/// A reporter event, as recorded by [`MemoryReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    TestStarted(String),
    Assertion(AssertionRecord),
    TestFinished { label: String, error: Option<String> },
    RunFinished(RunSummary),
}

/// Records every event in the order it was received
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub events: Vec<ReportEvent>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assertions(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::Assertion(record) => Some(record),
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<&AssertionRecord> {
        self.assertions().filter(|r| !r.passed).collect()
    }

    /// Labels of started test cases, in order
    pub fn started(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::TestStarted(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(label, error)` of finished test cases, in order
    pub fn finished(&self) -> Vec<(&str, Option<&str>)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::TestFinished { label, error } => {
                    Some((label.as_str(), error.as_deref()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.events.iter().rev().find_map(|e| match e {
            ReportEvent::RunFinished(summary) => Some(summary),
            _ => None,
        })
    }
}

impl Reporter for MemoryReporter {
    fn test_started(&mut self, label: &str) {
        self.events.push(ReportEvent::TestStarted(label.to_string()));
    }

    fn assertion(&mut self, record: &AssertionRecord) {
        self.events.push(ReportEvent::Assertion(record.clone()));
    }

    fn test_finished(&mut self, label: &str, result: Result<(), &Error>) {
        self.events.push(ReportEvent::TestFinished {
            label: label.to_string(),
            error: result.err().map(|e| e.to_string()),
        });
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.events.push(ReportEvent::RunFinished(summary.clone()));
    }
}
