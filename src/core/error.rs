//! Error types for the logger

use std::path::Path;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A log file could not be opened
    #[error("Failed to open log file '{path}': {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Logger already stopped
    #[error("Logger already stopped")]
    LoggerStopped,

    /// The flush loop thread panicked instead of acknowledging shutdown
    #[error("Flush loop thread panicked: {0}")]
    WorkerPanicked(String),
}

impl LoggerError {
    /// Create a file open error for the given path
    pub fn file_open(path: &Path, source: std::io::Error) -> Self {
        LoggerError::FileOpen {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("queue_capacity", "must be greater than zero");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::file_open(
            Path::new("/var/log/app.2024-01-01.log"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, LoggerError::FileOpen { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("base_name", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for base_name: must not be empty"
        );

        let err = LoggerError::file_open(
            Path::new("/var/log/app.2024-01-01.log"),
            io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to open log file '/var/log/app.2024-01-01.log': no such directory"
        );

        assert_eq!(LoggerError::LoggerStopped.to_string(), "Logger already stopped");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk full");
        let err = LoggerError::io_operation("creating log directory", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("creating log directory"));
        assert!(err.to_string().contains("disk full"));
    }
}
