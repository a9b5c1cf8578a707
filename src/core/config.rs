//! Logger configuration
//!
//! A [`LoggerConfig`] can be built in code (usually through
//! [`LoggerBuilder`](super::LoggerBuilder)) or loaded from a JSON document:
//!
//! ```json
//! {
//!   "directory": "/var/log/api",
//!   "base_name": "api",
//!   "queue_capacity": 4096,
//!   "levels": {
//!     "ERRO": { "has_own_file": true, "duplicates_to_main": true },
//!     "ACES": { "has_own_file": true }
//!   },
//!   "call_site_levels": ["ERRO", "FATL"]
//! }
//! ```

use super::error::{LoggerError, Result};
use super::level::{LevelConfig, LevelRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default dispatch queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default drain wait used when a logger is dropped without `close`
pub const DEFAULT_CLOSE_WAIT_MILLIS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Directory holding every log file; created if missing
    pub directory: PathBuf,

    /// File name prefix, e.g. `app` for `app.2024-01-01.log`
    pub base_name: String,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_close_wait_millis")]
    pub close_wait_millis: u64,

    #[serde(default)]
    pub levels: BTreeMap<String, LevelConfig>,

    /// Levels that capture the call site, on top of `levels`
    #[serde(default)]
    pub call_site_levels: Vec<String>,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_close_wait_millis() -> u64 {
    DEFAULT_CLOSE_WAIT_MILLIS
}

impl LoggerConfig {
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            close_wait_millis: DEFAULT_CLOSE_WAIT_MILLIS,
            levels: BTreeMap::new(),
            call_site_levels: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(format!("reading config '{}'", path.display()), e)
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(LoggerError::config("directory", "must not be empty"));
        }
        if self.base_name.is_empty() {
            return Err(LoggerError::config("base_name", "must not be empty"));
        }
        if has_separator(&self.base_name) {
            return Err(LoggerError::config(
                "base_name",
                format!("'{}' must not contain a path separator", self.base_name),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(LoggerError::config("queue_capacity", "must be greater than zero"));
        }
        for (name, level) in &self.levels {
            if level.has_own_file && (name.is_empty() || has_separator(name)) {
                return Err(LoggerError::config(
                    "levels",
                    format!("'{}' cannot be used in a file name", name),
                ));
            }
        }
        Ok(())
    }

    /// Registry seeded from `levels` and `call_site_levels`
    pub fn registry(&self) -> LevelRegistry {
        let mut registry = LevelRegistry::new();
        for (name, level) in &self.levels {
            registry.set_level(name.clone(), *level);
        }
        registry.enable_call_site_for(self.call_site_levels.iter().cloned());
        registry
    }
}

fn has_separator(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}
