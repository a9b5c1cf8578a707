//! # daylog
//!
//! A non-blocking log writer. Callers push records onto a bounded queue and
//! return immediately; one background thread owns every file and writes
//! them out.
//!
//! ## Features
//!
//! - **Date rotation**: `{base}.{YYYY-MM-DD}.log`, switched when a record's date changes
//! - **Per-level files**: any level can get `{base}.{date}.{LEVEL}.log`, optionally duplicated into the main file
//! - **Backpressure**: a full queue blocks the producer instead of growing memory
//! - **Call sites**: selected levels append `[file:line]` of the logging call
//! - **Deterministic shutdown**: `close` drains, stops the writer and waits for every file to close

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        LevelConfig, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
        RecordCallback, Result, ShutdownReport, ACES, DEBG, ERRO, FATL, INFO,
    };
}

pub use core::{
    LevelConfig, LevelRegistry, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, RecordCallback, Result, ShutdownReport, ACES, DATE_FORMAT,
    DEFAULT_CLOSE_WAIT_MILLIS, DEFAULT_QUEUE_CAPACITY, DEBG, ERRO, FATL, INFO, TIME_FORMAT,
};
