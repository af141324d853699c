// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature,
//! [`init_logging`] additionally writes per-run folders with one JSON log
//! file per crate and applies a retention policy to older runs.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

/// Install a console subscriber filtered by the debug flags.
///
/// `default_level` applies to every target without a debug flag. Fails if a
/// global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(debug_flags.to_filter_string_with(default_level))
        .map_err(|e| anyhow!("Invalid log filter: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install console logger: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{cleanup_old_logs, init_logging, init_logging_default, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use chrono::{NaiveDateTime, Utc};
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    use crate::cli::CrateDebugFlags;

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the file writers alive; logs are flushed when dropped
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Folder of this run's log files
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize logging with file output and console output
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── fibra-connectivity.log
    ///       ├── fibra-config.log
    ///       └── fibra.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `default_level` - Level of targets without a debug flag
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 30)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        default_level: &str,
        log_dir: Option<PathBuf>,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let run_name = format!("{}{}", RUN_PREFIX, Utc::now().format(RUN_FORMAT));
        let run_folder = base_log_dir.join(run_name);
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, retention_days, retention_runs)?;

        let filter = debug_flags.to_filter_string_with(default_level);
        let console_filter = EnvFilter::try_new(&filter).context("Invalid log filter")?;
        let combined_filter = EnvFilter::try_new(&filter).context("Invalid log filter")?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(console_filter);
        layers.push(console_layer.boxed());

        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!("{}=debug,off", crate_name)))
                .boxed();
            layers.push(file_layer);
        }

        let combined_appender = rolling::daily(&run_folder, "fibra.log");
        let (combined_non_blocking, combined_guard) =
            tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(combined_filter)
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to install file logger")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Initialize file logging with default settings
    pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
        init_logging(debug_flags, "info", None, None, None)
    }

    /// Remove run folders older than `retention_days`, then all but the newest `retention_runs`
    pub fn cleanup_old_logs(
        base_log_dir: &Path,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let retention_days = retention_days.unwrap_or(30);
        let retention_runs = retention_runs.unwrap_or(10);
        let cutoff = Utc::now().naive_utc() - chrono::Duration::days(retention_days as i64);

        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
                .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_FORMAT).ok());
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }

        // Oldest first
        runs.sort_by_key(|(_, stamp)| *stamp);

        let (expired, kept): (Vec<_>, Vec<_>) =
            runs.into_iter().partition(|(_, stamp)| *stamp < cutoff);
        let excess = kept.len().saturating_sub(retention_runs);
        for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
            if let Err(e) = std::fs::remove_dir_all(path) {
                eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_cleanup_keeps_newest_runs() {
            let dir = tempfile::tempdir().unwrap();
            let now = Utc::now().naive_utc();
            let mut names = Vec::new();
            for minutes in [1i64, 2, 3, 4] {
                let stamp = (now - chrono::Duration::minutes(minutes)).format(RUN_FORMAT);
                let name = format!("{}{}", RUN_PREFIX, stamp);
                std::fs::create_dir_all(dir.path().join(&name)).unwrap();
                names.push(name);
            }
            let old = format!(
                "{}{}",
                RUN_PREFIX,
                (now - chrono::Duration::days(90)).format(RUN_FORMAT)
            );
            std::fs::create_dir_all(dir.path().join(&old)).unwrap();
            std::fs::create_dir_all(dir.path().join("not_a_run")).unwrap();

            cleanup_old_logs(dir.path(), Some(30), Some(2)).unwrap();

            assert!(!dir.path().join(&old).exists());
            assert!(dir.path().join(&names[0]).exists());
            assert!(dir.path().join(&names[1]).exists());
            assert!(!dir.path().join(&names[2]).exists());
            assert!(!dir.path().join(&names[3]).exists());
            assert!(dir.path().join("not_a_run").exists());
        }

        #[test]
        fn test_cleanup_missing_dir_is_ok() {
            let dir = tempfile::tempdir().unwrap();
            assert!(cleanup_old_logs(&dir.path().join("absent"), None, None).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_reported() {
        let flags = CrateDebugFlags::default();
        assert!(init_console_logging(&flags, "fibra=loudest").is_err());
    }
}
