use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
};

use chanlog_core::{RollingConfig, limits};
use serde::Deserialize;

use crate::error::InitError;

/// Sink configuration consumed by [`crate::LoggingSystem::initialise`].
///
/// Deserializable so it can sit inside an application's own config file:
///
/// ```
/// let config: chanlog::LogConfig = serde_json::from_str(r#"{
///     "directory": "/var/log/app",
///     "file": "app.log",
///     "size": 1048576,
///     "count": 10,
///     "levels": {"main": "debug", "DEFAULT": "warn"},
///     "console": false
/// }"#).unwrap();
/// assert_eq!(config.levels["main"], "debug");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory holding the log file; must already exist.
    pub directory: PathBuf,
    /// Bare file name inside `directory`.
    pub file: String,
    /// Rotation threshold in bytes.
    pub size: u64,
    /// Number of rotated files kept.
    pub count: u32,
    /// Tag to level name, merged into the default map.
    pub levels: HashMap<String, String>,
    /// Duplicate every line to stdout.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file: "chanlog.log".into(),
            size: 1_048_576,
            count: 10,
            levels: HashMap::new(),
            console: false,
        }
    }
}

impl LogConfig {
    pub fn new<P: Into<PathBuf>>(directory: P, file: &str) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            ..Self::default()
        }
    }
    /// Sets the rotation threshold.
    pub fn with_size(self, size: u64) -> Self {
        Self { size, ..self }
    }
    /// Sets the number of rotated files kept.
    pub fn with_count(self, count: u32) -> Self {
        Self { count, ..self }
    }
    /// Adds a tag level override.
    pub fn with_level(mut self, tag: &str, level: &str) -> Self {
        self.levels.insert(tag.into(), level.into());
        self
    }
    /// Dynamically set the console flag.
    pub fn with_console(self, console: bool) -> Self {
        Self { console, ..self }
    }

    /// Checks every field, then that the directory accepts new files.
    pub(crate) fn validate(&self) -> Result<RollingConfig, InitError> {
        if self.directory.as_os_str().is_empty() {
            return Err(invalid("directory", "must not be empty"));
        }
        if self.file.is_empty() {
            return Err(invalid("file", "must not be empty"));
        }
        if self.file.contains(['/', '\\']) || self.file == "." || self.file == ".." {
            return Err(invalid("file", "must be a bare file name"));
        }
        if self.size < limits::MIN_FILE_SIZE {
            return Err(invalid(
                "size",
                format!("must be at least {} bytes", limits::MIN_FILE_SIZE),
            ));
        }
        if self.count < limits::MIN_COUNT {
            return Err(invalid(
                "count",
                format!("must be at least {}", limits::MIN_COUNT),
            ));
        }
        if !self.directory.is_dir() {
            return Err(InitError::DirectoryMissing(self.directory.clone()));
        }
        WriteCheck::create(&self.directory)
            .map_err(|e| invalid("directory", format!("not writable: {e}")))?;
        Ok(RollingConfig {
            folder: self.directory.clone(),
            filename: self.file.clone(),
            max_size: self.size,
            max_rolls: self.count,
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> InitError {
    InitError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

/// A throwaway file that proves the directory accepts writes; removed on drop.
struct WriteCheck {
    path: PathBuf,
}

impl WriteCheck {
    fn create(directory: &Path) -> std::io::Result<Self> {
        let path = directory.join(format!(".chanlog-write-check-{}", std::process::id()));
        File::create(&path)?;
        Ok(Self { path })
    }
}

impl Drop for WriteCheck {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
