//! Logging and tracing configuration
//!
//! The engine itself only emits `tracing` events; embedders that do not
//! install their own subscriber can use these helpers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "reqsuite=info,warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
}

/// Initialize tracing (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
/// Panics if a global subscriber is already installed.
pub fn init() {
    tracing_subscriber::registry()
        .with(filter())
        .with(layer())
        .init();
}

/// Like [`init`], but returns `false` instead of panicking when a subscriber
/// is already installed (e.g. when several tests initialize logging)
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(filter())
        .with(layer())
        .try_init()
        .is_ok()
}
