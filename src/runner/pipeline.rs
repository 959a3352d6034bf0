//! Request pipeline
//!
//! Runs the request steps of one test case strictly in order. For every
//! step: resolve → test `beforeEach` → step `before` → transport → match →
//! step `after` → test `afterEach`. The response of a step is handed to the
//! `before` hooks of the next one through [`ResponseContext`].

use std::time::Duration;
use tracing::{debug, warn};

use crate::common::{Error, Result, RunnerConfig};
use crate::definition::{ResolvedRequest, Response, ResponseContext, Suite, TestCase};
use crate::hooks::{HookRunner, HookStage};
use crate::matcher::Check;
use crate::report::{AssertionRecord, Reporter, StepReport, TestCaseReport};
use crate::resolver;
use crate::transport::Transport;

pub(crate) struct Pipeline<'a> {
    pub transport: &'a dyn Transport,
    pub hooks: &'a HookRunner,
    pub config: &'a RunnerConfig,
}

impl Pipeline<'_> {
    /// Execute every request step of `test`.
    ///
    /// Returns the first error that abandoned the test case. Assertion
    /// failures are only counted in `report`.
    pub async fn run(
        &self,
        suite: &Suite,
        test: &TestCase,
        report: &mut TestCaseReport,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let mut previous: Option<Response> = None;

        for (index, step) in test.requests.iter().enumerate() {
            let owner = format!("request #{} of '{}'", index + 1, report.label);
            let resolved = resolver::resolve(suite, test, step);
            let snapshot = resolved.clone();

            let ctx = ResponseContext {
                response: previous.take(),
                next: resolved,
            };
            let ctx = self
                .hooks
                .run(test.before_each.as_ref(), HookStage::BeforeEach, &owner, ctx)
                .await
                .map_err(|e| self.abandon(reporter, &snapshot, e))?;
            let ctx = self
                .hooks
                .run(step.before.as_ref(), HookStage::Before, &owner, ctx)
                .await
                .map_err(|e| self.abandon(reporter, &snapshot, e))?;
            let mut request = ctx.next;
            request.method.make_ascii_uppercase();

            self.validate(&request, &owner)
                .map_err(|e| self.abandon(reporter, &request, e))?;

            debug!(method = %request.method, url = %request.url, "Sending request");
            report.requests_sent += 1;
            let response = self
                .send(&request)
                .await
                .map_err(|e| self.abandon(reporter, &request, e))?;

            let mut step_report = StepReport {
                request: request.describe(),
                status: response.status,
                ..Default::default()
            };
            for check in request.expected.evaluate(&response) {
                self.record(reporter, report, &mut step_report, &request, &check);
            }
            let step_failed = step_report.assertions_failed > 0;
            report.steps.push(step_report);

            let response = self
                .hooks
                .run(step.after.as_ref(), HookStage::After, &owner, response)
                .await
                .map_err(|e| self.abandon(reporter, &request, e))?;
            let response = self
                .hooks
                .run(test.after_each.as_ref(), HookStage::AfterEach, &owner, response)
                .await
                .map_err(|e| self.abandon(reporter, &request, e))?;
            previous = Some(response);

            if step_failed && self.config.execution.fail_fast {
                debug!(step = index + 1, "Stopping test case after failed assertion");
                break;
            }
        }

        Ok(())
    }

    fn validate(&self, request: &ResolvedRequest, owner: &str) -> Result<()> {
        if request.method.trim().is_empty() {
            return Err(Error::MissingMethod {
                step: owner.to_string(),
            });
        }
        if request.url.trim().is_empty() {
            return Err(Error::MissingUrl {
                step: owner.to_string(),
            });
        }
        if !self.transport.supports(&request.method) {
            return Err(Error::UnsupportedMethod {
                method: request.method.clone(),
            });
        }
        Ok(())
    }

    async fn send(&self, request: &ResolvedRequest) -> Result<Response> {
        let call = self.transport.send(request);
        let outcome = match self.config.timeouts.request() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(Error::transport(&request.describe(), &elapsed(limit))),
            },
            None => call.await,
        };
        outcome.map_err(|e| Error::transport(&request.describe(), &e.message))
    }

    fn record(
        &self,
        reporter: &mut dyn Reporter,
        report: &mut TestCaseReport,
        step: &mut StepReport,
        request: &ResolvedRequest,
        check: &Check,
    ) {
        if check.passed {
            report.assertions_passed += 1;
            step.assertions_passed += 1;
        } else {
            report.assertions_failed += 1;
            step.assertions_failed += 1;
            debug!(path = %check.path, "Assertion failed: {}", check.description);
        }
        reporter.assertion(&AssertionRecord {
            passed: check.passed,
            message: compose(request, &check.description),
            request: None,
        });
    }

    /// Report the error that abandons the test case as a single failing
    /// record carrying the request, and hand it back to the caller
    fn abandon(&self, reporter: &mut dyn Reporter, request: &ResolvedRequest, error: Error) -> Error {
        warn!(method = %request.method, url = %request.url, error = %error, "Abandoning test case");
        reporter.assertion(&AssertionRecord {
            passed: false,
            message: compose(request, &error.to_string()),
            request: Some(request.to_json()),
        });
        error
    }
}

/// `METHOD URL - optional message - description`
fn compose(request: &ResolvedRequest, description: &str) -> String {
    let mut parts = vec![request.describe()];
    if let Some(message) = &request.message {
        parts.push(message.clone());
    }
    parts.push(description.to_string());
    parts.join(" - ")
}

fn elapsed(limit: Duration) -> String {
    format!("timed out after {} seconds", limit.as_secs())
}
