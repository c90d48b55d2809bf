//! Fetcher configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the external download utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path of the download utility executable.
    pub executable: PathBuf,
    /// Extra arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Directory holding one working subdirectory per pid.
    pub download_dir: PathBuf,
    /// Hard per-download timeout in seconds (default: 3 hours).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Hours between scheduled cache refreshes; 0 disables the schedule
    /// (default: 4).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_hours: u64,
}

fn default_timeout() -> u64 {
    3 * 60 * 60
}

fn default_refresh_interval() -> u64 {
    4
}

impl FetcherConfig {
    /// Arguments for downloading one pid into its working directory.
    pub fn download_args(&self, pid: &str, work_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--pid".to_string(),
            pid.to_string(),
            "--output".to_string(),
            work_dir.to_string_lossy().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Arguments for the long-running cache-rebuild invocation.
    pub fn refresh_args(&self) -> Vec<String> {
        let mut args = vec!["--refresh".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Working directory for one pid.
    pub fn work_dir(&self, pid: &str) -> PathBuf {
        self.download_dir.join(pid)
    }
}
