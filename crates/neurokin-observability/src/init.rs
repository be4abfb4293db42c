// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the neurokin tools
//!
//! Console output always goes to stderr so that stdout stays free for tool
//! output. With the `file-logging` feature and a log directory configured,
//! every run also writes JSON lines into its own timestamped folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── neurokin.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

pub const RUN_FOLDER_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Console line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Text,
    Json,
}

/// What to log and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Base level for everything not named by a debug flag
    pub level: String,
    pub format: ConsoleFormat,
    /// Base directory for per-run folders; ignored without `file-logging`
    pub log_dir: Option<PathBuf>,
    /// Number of run folders kept, the current one included
    pub retention_runs: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: ConsoleFormat::Text,
            log_dir: None,
            retention_runs: 10,
        }
    }
}

/// Keeps file writers alive; dropping it flushes them
#[derive(Debug)]
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder this run logs into, when file logging is active
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

/// `EnvFilter` combining the debug flags with the base level
pub fn build_filter(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&settings.level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed, the filter is
/// malformed, or the run folder cannot be created.
pub fn init_logging(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<LoggingGuard> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let console = match settings.format {
        ConsoleFormat::Text => console.with_filter(build_filter(debug_flags, settings)?).boxed(),
        ConsoleFormat::Json => console
            .json()
            .with_filter(build_filter(debug_flags, settings)?)
            .boxed(),
    };
    layers.push(console);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = match &settings.log_dir {
        Some(base) => {
            let run_dir = open_run_folder(base, settings.retention_runs)?;
            let appender = tracing_appender::rolling::never(&run_dir, "neurokin.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(build_filter(debug_flags, settings)?)
                .boxed();
            layers.push(file_layer);
            (vec![guard], Some(run_dir))
        }
        None => (Vec::new(), None),
    };
    #[cfg(not(feature = "file-logging"))]
    let run_dir: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if !cfg!(feature = "file-logging") {
        if let Some(base) = &settings.log_dir {
            tracing::warn!(
                log_dir = %base.display(),
                "File logging requested but the file-logging feature is disabled"
            );
        }
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_dir,
    })
}

/// Install a text console subscriber at `info`
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingSettings::default())
}

pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_FOLDER_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

/// Start time encoded in a run folder name
pub fn parse_run_folder_name(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix(RUN_FOLDER_PREFIX)?;
    NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(feature = "file-logging")]
fn open_run_folder(base: &Path, retention_runs: usize) -> Result<PathBuf> {
    let run_dir = base.join(run_folder_name(Utc::now()));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    cleanup_old_runs(base, retention_runs)?;
    Ok(run_dir)
}

/// Delete all but the `keep` newest run folders under `base`
///
/// Entries that are not run folders are left alone. At least one run is
/// always kept. Returns the number of folders removed.
pub fn cleanup_old_runs(base: &Path, keep: usize) -> Result<usize> {
    if !base.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    let entries = std::fs::read_dir(base)
        .with_context(|| format!("Failed to list log directory: {}", base.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_run_folder_name);
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    // newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in runs.iter().skip(keep.max(1)) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_run_folder_name_round_trip() {
        let started = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let name = run_folder_name(started);
        assert_eq!(name, "run_20250101_120000");
        assert_eq!(parse_run_folder_name(&name), Some(started));
        assert_eq!(parse_run_folder_name("images"), None);
        assert_eq!(parse_run_folder_name("run_yesterday"), None);
    }

    #[test]
    fn test_cleanup_keeps_newest_runs() {
        let dir = tempdir().unwrap();
        for day in 1..=4 {
            let started = Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap();
            std::fs::create_dir(dir.path().join(run_folder_name(started))).unwrap();
        }
        std::fs::create_dir(dir.path().join("keep_me")).unwrap();

        assert_eq!(cleanup_old_runs(dir.path(), 2).unwrap(), 2);
        assert!(dir.path().join("run_20250104_000000").exists());
        assert!(dir.path().join("run_20250103_000000").exists());
        assert!(!dir.path().join("run_20250101_000000").exists());
        assert!(dir.path().join("keep_me").exists());

        // zero still keeps the newest
        assert_eq!(cleanup_old_runs(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("run_20250104_000000").exists());
    }

    #[test]
    fn test_cleanup_missing_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(cleanup_old_runs(&dir.path().join("absent"), 3).unwrap(), 0);
    }

    #[test]
    fn test_build_filter() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neurokin-model".to_string()]);
        let filter = build_filter(&flags, &LoggingSettings::default()).unwrap();
        assert!(filter.to_string().contains("neurokin_model=debug"));
    }
}
