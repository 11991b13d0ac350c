//! Tracing setup for the bot and the offline subcommands.
//!
//! `start` logs JSON to a daily file under the logs directory and a compact
//! human format to stderr. Other subcommands log to stderr only, leaving
//! stdout for their output. `RUST_LOG` overrides the default filter in both.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix; the appender adds the date.
pub const LOG_FILE_PREFIX: &str = "pdzs.log";

/// Filter used when `RUST_LOG` is unset. Library chatter is kept to warnings.
const DEFAULT_FILTER: &str = "info,teloxide=warn,sqlx=warn,hyper=warn,reqwest=warn";

/// Keeps the file writer alive; dropping it flushes buffered lines.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install file and console logging for the running bot.
///
/// Files are `{logs_dir}/pdzs.log.YYYY-MM-DD`, one JSON object per line.
///
/// # Errors
///
/// Returns an error if `logs_dir` cannot be created.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_writer(writer);
    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard { _guard: guard })
}

/// Install stderr-only logging for `show`, `reset` and `preview`.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
