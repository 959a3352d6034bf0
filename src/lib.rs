//! reqsuite - declarative HTTP test suites
//!
//! A [`Suite`] describes test cases made of sequential request steps. The
//! [`Runner`] resolves inherited configuration for every step, runs the
//! lifecycle hooks in a fixed order, sends each request through a caller
//! supplied [`Transport`] and matches the responses against structured
//! expectations, streaming the results to a [`Reporter`].

pub mod common;
pub mod definition;
pub mod hooks;
pub mod matcher;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod transport;

// Re-export commonly used types
pub use common::{logging, BoxError, Error, Result, RunnerConfig};
pub use definition::{
    Expectation, Predicate, RequestConfig, RequestStep, ResolvedRequest, Response,
    ResponseContext, Suite, TestCase,
};
pub use hooks::{Hook, HookStage};
pub use matcher::Expected;
pub use report::{ConsoleReporter, MemoryReporter, Reporter, RunSummary};
pub use runner::Runner;
pub use transport::{MockTransport, Transport, TransportError};
