//! Logging configuration: a human-readable stderr layer plus a per-run
//! log file that also receives captured command output.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::error::{DeployError, DeployResult};

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory holding the run log.
    pub log_dir: PathBuf,
    /// Show debug output (including captured command output) on
    /// stderr as well.
    pub verbose: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
            verbose: false,
        }
    }
}

/// `deploy_<YYYYmmdd_HHMMSS>.log`
#[must_use]
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("deploy_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber and return the log file path.
pub fn init(options: &LogOptions) -> DeployResult<PathBuf> {
    let file_name = log_file_name(Local::now());
    std::fs::create_dir_all(&options.log_dir)?;
    let path = Path::new(&options.log_dir).join(&file_name);

    let default_level = if options.verbose {
        "info,dropship=debug"
    } else {
        "info"
    };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let file = fmt::layer()
        .with_writer(tracing_appender::rolling::never(&options.log_dir, &file_name))
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new("info,dropship=debug"));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| DeployError::Other(format!("logging setup failed: {e}")))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_timestamp() {
        let started = Local
            .with_ymd_and_hms(2026, 3, 9, 14, 5, 7)
            .single()
            .expect("unambiguous local time");

        assert_eq!(log_file_name(started), "deploy_20260309_140507.log");
    }
}
