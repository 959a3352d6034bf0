//! Human-readable console reporter

use colored::{ColoredString, Colorize};
use std::io::{self, Write};

use super::{AssertionRecord, Reporter, RunSummary};
use crate::common::config::OutputConfig;
use crate::common::Error;

/// Prints test progress with ✓/✗ marks
pub struct ConsoleReporter {
    out: Box<dyn Write + Send>,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter {
    /// Report to stdout
    pub fn new(config: &OutputConfig) -> Self {
        Self::with_writer(config, Box::new(io::stdout()))
    }

    pub fn with_writer(config: &OutputConfig, out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            verbose: config.verbose,
            color: config.color,
        }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn pass_mark(&self) -> String {
        self.paint("✓", |s| s.green())
    }

    fn fail_mark(&self) -> String {
        self.paint("✗", |s| s.red())
    }
}

impl Reporter for ConsoleReporter {
    fn test_started(&mut self, label: &str) {
        let header = self.paint("Running Test:", |s| s.blue().bold());
        let _ = writeln!(self.out, "\n{} {}", header, label);
    }

    fn assertion(&mut self, record: &AssertionRecord) {
        if record.passed {
            if self.verbose {
                let mark = self.pass_mark();
                let _ = writeln!(self.out, "  {} {}", mark, record.message);
            }
            return;
        }

        let mark = self.fail_mark();
        let _ = writeln!(self.out, "  {} {}", mark, record.message);
        if let Some(request) = &record.request {
            let request = self.paint(request, |s| s.dimmed());
            let _ = writeln!(self.out, "      {}", request);
        }
    }

    fn test_finished(&mut self, label: &str, result: Result<(), &Error>) {
        let line = match result {
            Ok(()) => format!("{} {}", self.pass_mark(), self.paint(label, |s| s.green())),
            Err(e) => format!(
                "{} {}: {}",
                self.fail_mark(),
                self.paint(label, |s| s.red().bold()),
                e
            ),
        };
        let _ = writeln!(self.out, "{}", line);
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        let totals = format!(
            "{} passed, {} failed, {} request(s)",
            summary.passed(),
            summary.failed(),
            summary.requests_sent()
        );
        let line = if summary.is_success() {
            self.paint(&totals, |s| s.green().bold())
        } else {
            self.paint(&totals, |s| s.red().bold())
        };
        let _ = writeln!(self.out, "\n{}", line);
        if let Some(reason) = &summary.aborted {
            let _ = writeln!(self.out, "Run aborted: {}", reason);
        }
        let _ = self.out.flush();
    }
}
