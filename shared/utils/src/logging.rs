use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// `json` also reports span close timings. Both formats carry thread ids.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let log_file = config.file_path.as_deref().map(open_log_file).transpose()?;

    match (config.format.as_str(), log_file) {
        ("json", log_file) => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_target(true);

            match log_file {
                Some(file) => registry.with(fmt_layer.with_writer(file)).init(),
                None => registry.with(fmt_layer).init(),
            }
        }
        (_, Some(file)) => registry
            .with(
                fmt::layer()
                    .with_thread_ids(true)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(file),
            )
            .init(),
        (_, None) => registry
            .with(fmt::layer().with_thread_ids(true).with_target(false))
            .init(),
    }

    tracing::debug!("Logging initialized with level: {}", config.level);
    Ok(())
}

fn open_log_file(path: &str) -> Result<Mutex<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path))?;
    Ok(Mutex::new(file))
}
