//! Core logger types

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flush_loop;
pub mod level;
pub mod log_record;
pub mod logger;
pub mod metrics;

pub use config::{LoggerConfig, DEFAULT_CLOSE_WAIT_MILLIS, DEFAULT_QUEUE_CAPACITY};
pub use error::{LoggerError, Result};
pub use flush_loop::FLUSH_THREAD_NAME;
pub use level::{LevelConfig, LevelRegistry, ACES, DEBG, ERRO, FATL, INFO};
pub use log_record::{LogRecord, RecordCallback, DATE_FORMAT, TIME_FORMAT};
pub use logger::{Logger, LoggerBuilder, ShutdownReport};
pub use metrics::LoggerMetrics;
