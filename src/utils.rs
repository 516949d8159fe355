use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::constants::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

pub fn verbosity_level(verbosity: &str) -> Level {
    match verbosity {
        "silent" => Level::ERROR,
        "normal" => Level::INFO,
        "verbose" => Level::DEBUG,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. Logs go to stderr, or to `log_file` when it
/// is non-empty.
pub fn setup_logging(verbosity: &str, log_file: &str) -> Result<()> {
    let level = verbosity_level(verbosity);

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("user_upload={}", level).parse()?);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if log_file.is_empty() {
        let subscriber = builder.with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file))?;
        let subscriber = builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < SECONDS_PER_MINUTE {
        format!("{:.1}s", seconds)
    } else if seconds < SECONDS_PER_HOUR {
        format!("{:.1}m", seconds / SECONDS_PER_MINUTE)
    } else {
        format!("{:.1}h", seconds / SECONDS_PER_HOUR)
    }
}
