//! Runner configuration handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RunnerConfig {
    /// Failure policy settings
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Console output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Failure policy
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ExecutionConfig {
    /// Stop a test case after the first request step with a failed assertion
    #[serde(default)]
    pub fail_fast: bool,
}

/// Timeout settings in seconds; unset means no limit
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Timeouts {
    /// Upper bound for a single hook invocation
    #[serde(default)]
    pub hook_secs: Option<u64>,

    /// Upper bound for a single transport call
    #[serde(default)]
    pub request_secs: Option<u64>,
}

impl Timeouts {
    pub fn hook(&self) -> Option<Duration> {
        self.hook_secs.map(Duration::from_secs)
    }

    pub fn request(&self) -> Option<Duration> {
        self.request_secs.map(Duration::from_secs)
    }
}

/// Console reporter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Print passing assertions as well as failing ones
    #[serde(default)]
    pub verbose: bool,

    /// Colorize console output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeouts.hook_secs == Some(0) {
            return Err(Error::Config("timeouts.hook_secs must be positive".to_string()));
        }
        if self.timeouts.request_secs == Some(0) {
            return Err(Error::Config(
                "timeouts.request_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
