//! Reporting of the logger's own failures
//!
//! Nothing here ever writes to a log file: a failing destination must not
//! be asked to report its own failure.

use std::fmt;

/// Report every this-many occurrences after the first
const REPORT_EVERY: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Warning => "[DAYLOG WARNING]",
            Severity::Error => "[DAYLOG ERROR]",
            Severity::Critical => "[DAYLOG CRITICAL]",
        }
    }

    #[cfg(feature = "console")]
    fn colored_tag(self) -> colored::ColoredString {
        use colored::Colorize;
        match self {
            Severity::Warning => self.tag().yellow(),
            Severity::Error => self.tag().red(),
            Severity::Critical => self.tag().bright_red().bold(),
        }
    }
}

/// Write a diagnostic line to stderr
pub fn report(severity: Severity, message: fmt::Arguments<'_>) {
    #[cfg(feature = "console")]
    eprintln!("{} {}", severity.colored_tag(), message);

    #[cfg(not(feature = "console"))]
    eprintln!("{} {}", severity.tag(), message);
}

/// Whether the occurrence following `previous` should be reported.
///
/// `previous` is the counter value before this occurrence, as returned by
/// the `record_*` methods on [`LoggerMetrics`](super::LoggerMetrics).
pub fn should_report(previous: u64) -> bool {
    previous == 0 || (previous + 1) % REPORT_EVERY == 0
}

/// Best-effort text of a caught panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
