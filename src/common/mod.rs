//! Common utilities shared by the engine modules

pub mod config;
pub mod error;
pub mod logging;

pub use config::RunnerConfig;
pub use error::{BoxError, Error, Result};
