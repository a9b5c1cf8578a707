//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and queue the result.
//! Each expands to a call at the invocation site, so levels configured for
//! call-site capture record the line of the macro invocation.
//!
//! # Examples
//!
//! ```no_run
//! use daylog::{info, Logger};
//!
//! let logger = Logger::create("/tmp/logs", "app", 100)?;
//!
//! info!(logger, "Server started")?;
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port)?;
//! # Ok::<(), daylog::LoggerError>(())
//! ```

/// Log a formatted message at any level.
///
/// # Examples
///
/// ```no_run
/// # let logger = daylog::Logger::create("/tmp/logs", "app", 100).unwrap();
/// use daylog::log;
/// log!(logger, "AUDIT", "user {} signed in", 42).unwrap();
/// log!(logger, daylog::ERRO, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_fmt($level, format_args!($($arg)+))
    };
}

/// Log at `INFO`.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::INFO, $($arg)+)
    };
}

/// Log at `ERRO`.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::ERRO, $($arg)+)
    };
}

/// Log at `DEBG`.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::DEBG, $($arg)+)
    };
}

/// Log at `FATL`.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::FATL, $($arg)+)
    };
}

/// Log at `ACES`.
#[macro_export]
macro_rules! access {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::ACES, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::log_record::DATE_FORMAT;
    use crate::core::Logger;
    use tempfile::TempDir;

    fn logged_lines(run: impl FnOnce(&Logger)) -> Vec<String> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let logger = Logger::create(temp_dir.path(), "macros", 16).expect("create");
        run(&logger);
        logger.close(1000).expect("close");

        let today = chrono::Local::now().format(DATE_FORMAT).to_string();
        let content = std::fs::read_to_string(temp_dir.path().join(format!("macros.{}.log", today)))
            .expect("read log");
        content.lines().map(|line| line[20..].to_string()).collect()
    }

    #[test]
    fn test_level_macros() {
        let lines = logged_lines(|logger| {
            info!(logger, "Items: {}", 100).unwrap();
            error!(logger, "Code: {}", 500).unwrap();
            debug!(logger, "Count: {}", 5).unwrap();
            fatal!(logger, "Critical failure: {}", "system").unwrap();
            access!(logger, "GET {}", "/health").unwrap();
        });

        assert_eq!(
            lines,
            vec![
                "[INFO] Items: 100",
                "[ERRO] Code: 500",
                "[DEBG] Count: 5",
                "[FATL] Critical failure: system",
                "[ACES] GET /health",
            ]
        );
    }

    #[test]
    fn test_log_macro_custom_level() {
        let lines = logged_lines(|logger| {
            log!(logger, "AUDIT", "plain").unwrap();
            log!(logger, "AUDIT", "user {} did {}", 7, "login").unwrap();
        });

        assert_eq!(lines, vec!["[AUDIT] plain", "[AUDIT] user 7 did login"]);
    }

    #[test]
    fn test_macro_records_invocation_line() {
        let line = line!() + 3;
        let lines = logged_lines(|logger| {
            logger.enable_call_site_for([crate::ERRO]);
            error!(logger, "located").unwrap();
        });

        assert_eq!(lines, vec![format!("[ERRO] located [{}:{}]", file!(), line)]);
    }
}
