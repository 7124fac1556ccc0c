//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use crate::config::LogConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "RESTDECK_LOG";

const LOG_FILE: &str = "restdeck.log";

/// Install the global subscriber writing to `<dir>/restdeck.log`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the writer thread.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let dir = log_dir(config)?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter(config))
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

fn filter(config: &LogConfig) -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
    let level = config.level.as_deref().unwrap_or("info");
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
  })
}

fn log_dir(config: &LogConfig) -> Result<PathBuf> {
  if let Some(dir) = &config.dir {
    return Ok(dir.clone());
  }
  dirs::data_local_dir()
    .map(|d| d.join("restdeck"))
    .ok_or_else(|| eyre!("Could not determine a log directory; set log.dir in the config"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_explicit_dir_wins() {
    let config = LogConfig {
      level: None,
      dir: Some(PathBuf::from("/tmp/restdeck-logs")),
    };
    assert_eq!(log_dir(&config).unwrap(), PathBuf::from("/tmp/restdeck-logs"));
  }

  #[test]
  fn test_bad_level_falls_back() {
    let config = LogConfig {
      level: Some("not a [valid filter".to_string()),
      dir: None,
    };
    // Must not panic
    let _ = filter(&config);
  }
}
