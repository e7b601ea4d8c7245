//! Tracing subscriber setup.
//!
//! Level directives come from `BATCHLINE_LOG`, falling back to `RUST_LOG`,
//! and default to `info`. `BATCHLINE_LOG_FORMAT=json` switches to JSON lines.

use batchline_domain::{impl_status_conversions, BatchlineError, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_ENV: &str = "BATCHLINE_LOG";
const LOG_FORMAT_ENV: &str = "BATCHLINE_LOG_FORMAT";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl_status_conversions!(LogFormat {
    Text => "text",
    Json => "json",
});

impl LogFormat {
    /// Read `BATCHLINE_LOG_FORMAT`; unknown or unset values mean text.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV).ok().and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `BatchlineError::Internal` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let fmt_layer = match format {
        LogFormat::Json => fmt::layer().json().flatten_event(true).with_target(true).boxed(),
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter())
        .try_init()
        .map_err(|e| BatchlineError::Internal(format!("tracing already initialized: {e}")))
}

fn env_filter() -> EnvFilter {
    let var = if std::env::var_os(LOG_ENV).is_some() { LOG_ENV } else { EnvFilter::DEFAULT_ENV };
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(var)
        .from_env_lossy()
}
