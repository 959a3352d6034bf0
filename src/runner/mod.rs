//! Suite orchestration
//!
//! Drives suite → test case → request traversal:
//! suite `before` → for each test case { suite `beforeEach` → register →
//! test `before` → request pipeline → test `after` → signal completion →
//! suite `afterEach` } → suite `after`.
//!
//! Test cases run one after another in declared order. A failing test case
//! never stops the run; definition errors and a failing suite `before` do.

mod pipeline;

use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use crate::common::{Error, Result, RunnerConfig};
use crate::definition::{Suite, TestCase};
use crate::hooks::{HookRunner, HookStage};
use crate::report::{AssertionRecord, Reporter, RunSummary, TestCaseReport};
use crate::transport::Transport;
use pipeline::Pipeline;

const SUITE: &str = "suite";

/// Executes suites against a transport
pub struct Runner {
    transport: Arc<dyn Transport>,
    config: RunnerConfig,
    hooks: HookRunner,
}

impl Runner {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, RunnerConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: RunnerConfig) -> Self {
        let hooks = HookRunner::new(config.timeouts.hook());
        Self {
            transport,
            config,
            hooks,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every test case of `suite`.
    ///
    /// Returns `Err` only for failures that end the whole run: a definition
    /// error, or a failing suite `before`/`after` hook. The reporter receives
    /// `run_finished` in every case.
    pub async fn run(&self, suite: &Suite, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        info!(tests = suite.tests.len(), "Starting suite");

        if let Err(e) = self
            .hooks
            .run(suite.before.as_ref(), HookStage::Before, SUITE, ())
            .await
        {
            return Err(abort(reporter, summary, e));
        }

        for (index, test) in suite.tests.iter().enumerate() {
            let label = label(suite, test, index);
            let span = info_span!("test_case", label = %label);
            let (report, fatal) = self
                .run_test_case(suite, test, label, reporter)
                .instrument(span)
                .await;
            summary.tests.push(report);

            if let Some(e) = fatal {
                return Err(abort(reporter, summary, e));
            }
        }

        if let Err(e) = self
            .hooks
            .run(suite.after.as_ref(), HookStage::After, SUITE, ())
            .await
        {
            return Err(abort(reporter, summary, e));
        }

        info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "Suite finished"
        );
        reporter.run_finished(&summary);
        Ok(summary)
    }

    /// Run a single test case, wrapped in the suite's `beforeEach`/`afterEach`.
    ///
    /// The second element is set when the failure must end the whole run.
    async fn run_test_case(
        &self,
        suite: &Suite,
        test: &TestCase,
        label: String,
        reporter: &mut dyn Reporter,
    ) -> (TestCaseReport, Option<Error>) {
        let owner = format!("test '{}'", label);
        let mut report = TestCaseReport {
            label,
            ..Default::default()
        };

        let before_each = self
            .hooks
            .run(suite.before_each.as_ref(), HookStage::BeforeEach, SUITE, ())
            .await;

        reporter.test_started(&report.label);

        let mut result = match before_each {
            Ok(()) => self.run_body(suite, test, &owner, &mut report, reporter).await,
            Err(e) => Err(e),
        };
        if result.is_ok() && report.assertions_failed > 0 {
            result = Err(Error::AssertionsFailed {
                failed: report.assertions_failed,
            });
        }

        reporter.test_finished(&report.label, result.as_ref().map(|_| ()));

        match result {
            Ok(()) => info!(requests = report.requests_sent, "Test case passed"),
            Err(e) if e.is_definition() => {
                report.error = Some(e.to_string());
                return (report, Some(e));
            }
            Err(e) => {
                warn!(error = %e, "Test case failed");
                report.error = Some(e.to_string());
            }
        }

        if let Err(e) = self
            .hooks
            .run(suite.after_each.as_ref(), HookStage::AfterEach, SUITE, ())
            .await
        {
            reporter.assertion(&AssertionRecord {
                passed: false,
                message: format!("{} - {}", report.label, e),
                request: None,
            });
            report.error.get_or_insert_with(|| e.to_string());
        }

        (report, None)
    }

    /// Test `before` → request pipeline → test `after`
    async fn run_body(
        &self,
        suite: &Suite,
        test: &TestCase,
        owner: &str,
        report: &mut TestCaseReport,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        self.hooks
            .run(test.before.as_ref(), HookStage::Before, owner, ())
            .await?;

        let pipeline = Pipeline {
            transport: self.transport.as_ref(),
            hooks: &self.hooks,
            config: &self.config,
        };
        let requests = pipeline.run(suite, test, report, reporter).await;
        if let Err(e) = &requests {
            if e.is_definition() {
                return requests;
            }
        }

        let after = self
            .hooks
            .run(test.after.as_ref(), HookStage::After, owner, ())
            .await;
        requests.and(after)
    }
}

/// `"<suite message> <test message>"`, or whichever part exists
fn label(suite: &Suite, test: &TestCase, index: usize) -> String {
    match (suite.message.as_deref(), test.message.as_deref()) {
        (Some(s), Some(t)) => format!("{} {}", s, t),
        (Some(s), None) => s.to_string(),
        (None, Some(t)) => t.to_string(),
        (None, None) => format!("test #{}", index + 1),
    }
}

fn abort(reporter: &mut dyn Reporter, mut summary: RunSummary, error: Error) -> Error {
    warn!(error = %error, "Aborting run");
    summary.aborted = Some(error.to_string());
    reporter.run_finished(&summary);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Expectation, RequestConfig, RequestStep, Response};
    use crate::hooks::Hook;
    use crate::report::MemoryReporter;
    use crate::transport::MockTransport;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging_hook(log: &Log, entry: &str) -> Hook<()> {
        let log = Arc::clone(log);
        let entry = entry.to_string();
        Hook::sync(move |_| {
            log.lock().unwrap().push(entry.clone());
            Ok(())
        })
    }

    fn ok_transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(|_| Ok(Response::new(200))))
    }

    fn get(url: &str) -> RequestStep {
        RequestStep {
            config: RequestConfig::default().method("get").url(url),
            ..Default::default()
        }
    }

    #[test]
    fn test_label_composition() {
        let mut suite = Suite {
            message: Some("users".into()),
            ..Default::default()
        };
        let mut test = TestCase {
            message: Some("can sign up".into()),
            ..Default::default()
        };
        assert_eq!(label(&suite, &test, 0), "users can sign up");

        test.message = None;
        assert_eq!(label(&suite, &test, 1), "users");

        test.message = Some("can sign up".into());
        suite.message = None;
        assert_eq!(label(&suite, &test, 0), "can sign up");

        test.message = None;
        assert_eq!(label(&suite, &test, 2), "test #3");
    }

    #[tokio::test]
    async fn test_hook_order() {
        let log: Log = Arc::default();
        let step_log = Arc::clone(&log);
        let suite = Suite {
            before: Some(logging_hook(&log, "suite before")),
            after: Some(logging_hook(&log, "suite after")),
            before_each: Some(logging_hook(&log, "suite beforeEach")),
            after_each: Some(logging_hook(&log, "suite afterEach")),
            tests: vec![TestCase {
                before: Some(logging_hook(&log, "test before")),
                after: Some(logging_hook(&log, "test after")),
                requests: vec![RequestStep {
                    before: Some(Hook::sync(move |_| {
                        step_log.lock().unwrap().push("request before".into());
                        Ok(())
                    })),
                    ..get("/a")
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut reporter = MemoryReporter::new();
        let summary = Runner::new(ok_transport())
            .run(&suite, &mut reporter)
            .await
            .unwrap();

        assert!(summary.is_success());
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "suite before",
                "suite beforeEach",
                "test before",
                "request before",
                "test after",
                "suite afterEach",
                "suite after",
            ]
        );
    }

    #[tokio::test]
    async fn test_suite_before_failure_aborts_run() {
        let transport = ok_transport();
        let suite = Suite {
            before: Some(Hook::sync(|_| Err("no database".into()))),
            tests: vec![TestCase {
                requests: vec![get("/a")],
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut reporter = MemoryReporter::new();
        let err = Runner::new(transport.clone())
            .run(&suite, &mut reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Hook { stage: HookStage::Before, .. }));
        assert_eq!(transport.call_count(), 0);
        assert!(reporter.started().is_empty());
        assert!(reporter.summary().unwrap().aborted.is_some());
    }

    #[tokio::test]
    async fn test_missing_url_aborts_run() {
        let transport = ok_transport();
        let suite = Suite {
            tests: vec![
                TestCase {
                    requests: vec![RequestStep {
                        config: RequestConfig::default().method("get"),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                TestCase {
                    requests: vec![get("/never")],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let mut reporter = MemoryReporter::new();
        let err = Runner::new(transport.clone())
            .run(&suite, &mut reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingUrl { .. }));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(reporter.started().len(), 1);
        assert_eq!(reporter.failures().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_method_aborts_run() {
        let suite = Suite {
            tests: vec![TestCase {
                requests: vec![RequestStep {
                    config: RequestConfig::default().method("brew").url("/pot"),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let err = Runner::new(ok_transport())
            .run(&suite, &mut MemoryReporter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod { ref method } if method == "BREW"));
    }

    #[tokio::test]
    async fn test_assertion_failure_fails_test_case_but_not_run() {
        let suite = Suite {
            config: RequestConfig::default().expected(Expectation::default().status(201)),
            tests: vec![
                TestCase {
                    message: Some("first".into()),
                    requests: vec![get("/a"), get("/b")],
                    ..Default::default()
                },
                TestCase {
                    message: Some("second".into()),
                    requests: vec![RequestStep {
                        config: RequestConfig::default()
                            .method("get")
                            .url("/c")
                            .expected(Expectation::default().status(200)),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let transport = ok_transport();
        let mut reporter = MemoryReporter::new();
        let summary = Runner::new(transport.clone())
            .run(&suite, &mut reporter)
            .await
            .unwrap();

        // Both requests of the first test case still ran
        assert_eq!(transport.call_count(), 3);
        assert_eq!(summary.tests[0].assertions_failed, 2);
        assert_eq!(summary.tests[0].error.as_deref(), Some("2 assertion(s) failed"));
        assert!(summary.tests[1].passed());
        assert_eq!(
            reporter.finished(),
            vec![("first", Some("2 assertion(s) failed")), ("second", None)]
        );
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failed_step() {
        let mut config = RunnerConfig::default();
        config.execution.fail_fast = true;

        let suite = Suite {
            config: RequestConfig::default().expected(Expectation::default().status(201)),
            tests: vec![TestCase {
                requests: vec![get("/a"), get("/b")],
                ..Default::default()
            }],
            ..Default::default()
        };

        let transport = ok_transport();
        let summary = Runner::with_config(transport.clone(), config)
            .run(&suite, &mut MemoryReporter::new())
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[tokio::test]
    async fn test_suite_before_each_failure_skips_test_body() {
        let log: Log = Arc::default();
        let suite = Suite {
            before_each: Some(Hook::sync(|_| Err("reset failed".into()))),
            after_each: Some(logging_hook(&log, "suite afterEach")),
            tests: vec![TestCase {
                message: Some("skipped".into()),
                before: Some(logging_hook(&log, "test before")),
                requests: vec![get("/a")],
                ..Default::default()
            }],
            ..Default::default()
        };

        let transport = ok_transport();
        let mut reporter = MemoryReporter::new();
        let summary = Runner::new(transport.clone())
            .run(&suite, &mut reporter)
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 0);
        assert_eq!(*log.lock().unwrap(), vec!["suite afterEach"]);
        assert_eq!(reporter.started(), vec!["skipped"]);
        assert!(!summary.tests[0].passed());
    }

    #[tokio::test]
    async fn test_suite_after_failure_is_returned() {
        let suite = Suite {
            after: Some(Hook::sync(|_| Err("cleanup failed".into()))),
            tests: vec![TestCase {
                requests: vec![get("/a")],
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut reporter = MemoryReporter::new();
        let err = Runner::new(ok_transport())
            .run(&suite, &mut reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Hook { stage: HookStage::After, .. }));
        let summary = reporter.summary().unwrap();
        assert_eq!(summary.tests.len(), 1);
        assert!(summary.tests[0].passed());
    }

    #[tokio::test]
    async fn test_suite_after_each_failure_is_recorded_and_run_continues() {
        let suite = Suite {
            after_each: Some(Hook::sync(|_| Err("teardown failed".into()))),
            tests: vec![
                TestCase {
                    message: Some("first".into()),
                    requests: vec![get("/a")],
                    ..Default::default()
                },
                TestCase {
                    message: Some("second".into()),
                    requests: vec![get("/b")],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let transport = ok_transport();
        let mut reporter = MemoryReporter::new();
        let summary = Runner::new(transport.clone())
            .run(&suite, &mut reporter)
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(reporter.started(), vec!["first", "second"]);

        let failures = reporter.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[0].message,
            "first - Hook 'afterEach' of suite failed: teardown failed"
        );
        assert!(failures[0].request.is_none());
        assert_eq!(
            summary.tests[0].error.as_deref(),
            Some("Hook 'afterEach' of suite failed: teardown failed")
        );
        assert_eq!(summary.failed(), 2);
    }

    #[tokio::test]
    async fn test_blank_url_from_hook_is_a_definition_error() {
        let transport = ok_transport();
        let suite = Suite {
            tests: vec![TestCase {
                requests: vec![RequestStep {
                    before: Some(Hook::sync(|ctx: &mut crate::definition::ResponseContext| {
                        ctx.next.url = " ".into();
                        Ok(())
                    })),
                    ..get("/a")
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let err = Runner::new(transport.clone())
            .run(&suite, &mut MemoryReporter::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingUrl { .. }));
        assert_eq!(transport.call_count(), 0);
    }
}
