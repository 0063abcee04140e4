//! Logging configuration
//!
//! The engine itself only emits `tracing` events. This block describes where
//! the binary should send them and how many daily log files to keep.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset: trace, debug, info, warn, error
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    pub log_dir: PathBuf,
    /// File name prefix; files are named `<prefix>_<YYYY-MM-DD>.log`
    pub file_prefix: String,
    /// Number of log files to keep, 0 keeps everything
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            file_prefix: "mycolight".to_string(),
            max_files: 7,
        }
    }
}

impl LogConfig {
    /// Parse `level`, falling back to INFO
    pub fn parse_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.log_dir
            .join(format!("{}_{}.log", self.file_prefix, date))
    }

    /// Delete the oldest log files beyond `max_files`
    ///
    /// Only files matching this config's prefix are considered. Returns the
    /// number of files removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if self.max_files == 0 || !self.log_dir.is_dir() {
            return Ok(0);
        }

        let prefix = format!("{}_", self.file_prefix);
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix) && n.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        if logs.len() <= self.max_files {
            return Ok(0);
        }

        // Date-stamped names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_files;
        for path in &logs[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}
