use std::env::{VarError, var};

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing at INFO, overridable through `RUST_LOG`.
pub fn init_tracing() {
    initialize_tracing(LevelFilter::INFO);
}

/// Initialize tracing with an explicit default level (used by `--verbose`).
pub fn init(level: LevelFilter) {
    initialize_tracing(level);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

/// Output format named by `RUST_LOG_FORMAT`, plus a warning when the value was not understood.
fn log_format(value: Result<String, VarError>) -> (LogFormat, Option<String>) {
    match value.as_deref() {
        Ok("json") => (LogFormat::Json, None),
        Ok("" | "compact") | Err(VarError::NotPresent) => (LogFormat::Compact, None),
        Ok(other) => (
            LogFormat::Compact,
            Some(format!("Unknown RUST_LOG_FORMAT {other:?}, using compact output")),
        ),
        Err(error) => (
            LogFormat::Compact,
            Some(format!("Failed to read RUST_LOG_FORMAT, falling back to default: {error}")),
        ),
    }
}

fn initialize_tracing(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let (format, format_warning) = log_format(var("RUST_LOG_FORMAT"));

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    if tracing_subscriber::registry().with(log_layer).try_init().is_err() {
        warn!("Tracing subscriber already installed, keeping the existing one");
    }
    // Only now is there a subscriber to receive it.
    if let Some(message) = format_warning {
        warn!("{message}");
    }
}
