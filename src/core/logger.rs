//! Main logger implementation

use super::{
    config::LoggerConfig,
    diagnostics::{panic_message, report, Severity},
    error::{LoggerError, Result},
    flush_loop::{Control, FlushLoop},
    level::{LevelConfig, LevelRegistry, ACES, DEBG, ERRO, FATL, INFO},
    log_record::{LogRecord, RecordCallback, DATE_FORMAT},
    metrics::LoggerMetrics,
};
use crate::appenders::DatedFile;
use chrono::Local;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Poll interval of the drain wait in [`Logger::close`]
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of [`Logger::close`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The queue was empty when the drain wait ended
    pub drained: bool,
    /// Records still queued when the flush loop stopped; never written
    pub abandoned: usize,
}

/// Non-blocking date-rotating log writer.
///
/// Producers format and stamp records on their own thread and push them
/// onto a bounded queue; a single flush loop thread owns every file and does
/// all writing. When the queue is full, producers block until there is room.
///
/// `Logger` is `Send + Sync`; share it through an `Arc` for multi-threaded use.
///
/// # Example
///
/// ```no_run
/// use daylog::{Logger, ERRO};
///
/// let logger = Logger::create("/var/log/api", "api", 1024)?;
/// logger.set_level(ERRO, true, true, true);
///
/// logger.info("server started")?;
/// logger.error("upstream timed out")?;
///
/// logger.close(1000)?;
/// # Ok::<(), daylog::LoggerError>(())
/// ```
pub struct Logger {
    directory: PathBuf,
    base_name: String,
    capacity: usize,
    close_wait_millis: u64,
    registry: Arc<RwLock<LevelRegistry>>,
    sender: Sender<LogRecord>,
    control: Sender<Control>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    closed: AtomicBool,
    /// Producers between the closed check and the end of their send
    in_flight: Arc<AtomicUsize>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Create a logger writing to `{directory}/{base_name}.{date}.log`.
    ///
    /// Today's main file is opened before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::FileOpen`] if today's file cannot be opened and
    /// [`LoggerError::InvalidConfiguration`] for an empty name or zero capacity.
    pub fn create(
        directory: impl Into<PathBuf>,
        base_name: impl Into<String>,
        queue_capacity: usize,
    ) -> Result<Self> {
        let mut config = LoggerConfig::new(directory, base_name);
        config.queue_capacity = queue_capacity;
        Self::from_config(config)
    }

    /// Create a logger from a validated [`LoggerConfig`], seeding its levels
    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.directory).map_err(|e| {
            LoggerError::io_operation(
                format!("creating log directory '{}'", config.directory.display()),
                e,
            )
        })?;

        let today = Local::now().format(DATE_FORMAT).to_string();
        let mut main = DatedFile::main(&config.directory, config.base_name.as_str());
        main.open(&today)?;

        let registry = Arc::new(RwLock::new(config.registry()));
        let metrics = Arc::new(LoggerMetrics::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = bounded(config.queue_capacity);
        let (control, control_rx) = bounded(1);

        let handle = FlushLoop::new(
            receiver,
            control_rx,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            Arc::clone(&in_flight),
            config.directory.clone(),
            config.base_name.clone(),
            main,
        )
        .spawn()
        .map_err(|e| LoggerError::io_operation("spawning flush loop thread", e))?;

        Ok(Self {
            directory: config.directory,
            base_name: config.base_name,
            capacity: config.queue_capacity,
            close_wait_millis: config.close_wait_millis,
            registry,
            sender,
            control,
            worker: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
            in_flight,
            metrics,
        })
    }

    /// Create or replace the routing of `name`
    pub fn set_level(
        &self,
        name: impl Into<String>,
        with_call_site: bool,
        has_own_file: bool,
        duplicates_to_main: bool,
    ) {
        self.registry.write().set_level(
            name,
            LevelConfig::new(with_call_site, has_own_file, duplicates_to_main),
        );
    }

    /// Turn on call-site capture for the given levels, keeping any other flags
    pub fn enable_call_site_for<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.write().enable_call_site_for(names);
    }

    /// Current routing of `name`, if it has been configured
    pub fn level_config(&self, name: &str) -> Option<LevelConfig> {
        self.registry.read().get(name)
    }

    /// Queue `text` at `level`.
    ///
    /// Blocks while the queue is full.
    ///
    /// # Errors
    ///
    /// [`LoggerError::LoggerStopped`] once [`close`](Self::close) has begun.
    #[track_caller]
    pub fn log(&self, level: &str, text: impl Into<String>) -> Result<()> {
        self.write(level, text.into(), None, Location::caller())
    }

    /// Queue pre-formatted arguments, as produced by `format_args!`
    #[track_caller]
    pub fn log_fmt(&self, level: &str, args: fmt::Arguments<'_>) -> Result<()> {
        self.write(level, args.to_string(), None, Location::caller())
    }

    /// Queue `text` and run `callback(text, "{date} {time}")` once it is written
    #[track_caller]
    pub fn log_with_callback(
        &self,
        level: &str,
        text: impl Into<String>,
        callback: RecordCallback,
    ) -> Result<()> {
        self.write(level, text.into(), Some(callback), Location::caller())
    }

    /// Queue `text` verbatim for the main file: no stamp, no level tag
    pub fn raw_write(&self, text: impl Into<String>) -> Result<()> {
        self.enqueue(LogRecord::raw(text))
    }

    /// Queue a record built by the caller. No call-site capture is applied.
    pub fn submit(&self, record: LogRecord) -> Result<()> {
        self.enqueue(record)
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, text: impl Into<String>) -> Result<()> {
        self.log(INFO, text)
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, text: impl Into<String>) -> Result<()> {
        self.log(ERRO, text)
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, text: impl Into<String>) -> Result<()> {
        self.log(DEBG, text)
    }

    #[track_caller]
    #[inline]
    pub fn fatal(&self, text: impl Into<String>) -> Result<()> {
        self.log(FATL, text)
    }

    #[track_caller]
    #[inline]
    pub fn access(&self, text: impl Into<String>) -> Result<()> {
        self.log(ACES, text)
    }

    #[track_caller]
    pub fn access_with_callback(
        &self,
        text: impl Into<String>,
        callback: RecordCallback,
    ) -> Result<()> {
        self.log_with_callback(ACES, text, callback)
    }

    /// `location` is the caller of the public logging method
    fn write(
        &self,
        level: &str,
        mut text: String,
        callback: Option<RecordCallback>,
        location: &'static Location<'static>,
    ) -> Result<()> {
        if self.registry.read().wants_call_site(level) {
            text = format!("{} [{}:{}]", text, location.file(), location.line());
        }

        let mut record = LogRecord::new(level, text);
        if let Some(callback) = callback {
            record = record.with_callback(callback);
        }
        self.enqueue(record)
    }

    fn enqueue(&self, record: LogRecord) -> Result<()> {
        // Counted before the closed check; the flush loop's stop waits for zero
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.send_record(record);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn send_record(&self, record: LogRecord) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LoggerError::LoggerStopped);
        }

        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                self.metrics.record_block();
                self.sender
                    .send(record)
                    .map_err(|_| LoggerError::LoggerStopped)?;
            }
            Err(TrySendError::Disconnected(_)) => return Err(LoggerError::LoggerStopped),
        }

        self.metrics.record_enqueued();
        Ok(())
    }

    /// Drain the queue for up to `max_wait_millis` milliseconds, then stop
    /// the flush loop and wait until every file is closed.
    ///
    /// Draining is best effort: records still queued when the wait runs out
    /// are abandoned and reported in [`ShutdownReport::abandoned`]. Once
    /// `close` has started, every logging call returns
    /// [`LoggerError::LoggerStopped`].
    ///
    /// # Errors
    ///
    /// [`LoggerError::LoggerStopped`] if the logger was already closed and
    /// [`LoggerError::WorkerPanicked`] if the flush loop died instead of
    /// acknowledging.
    pub fn close(&self, max_wait_millis: u64) -> Result<ShutdownReport> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(LoggerError::LoggerStopped);
        }

        let mut waited = 0;
        while !self.sender.is_empty() && waited < max_wait_millis {
            thread::sleep(DRAIN_POLL_INTERVAL);
            waited += 1;
        }
        let drained = self.sender.is_empty();

        let (ack, ack_rx) = bounded(1);
        let acknowledged = match self.control.send(Control::Shutdown { ack }) {
            Ok(()) => ack_rx.recv().ok(),
            Err(_) => None,
        };

        if let Some(handle) = self.worker.lock().take() {
            if let Err(payload) = handle.join() {
                return Err(LoggerError::WorkerPanicked(panic_message(payload.as_ref())));
            }
        }

        let abandoned = acknowledged.ok_or_else(|| {
            LoggerError::WorkerPanicked("flush loop exited without acknowledging".to_string())
        })?;

        Ok(ShutdownReport { drained, abandoned })
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Records currently waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    /// Maximum number of queued records before producers block
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Directory the log files are written to
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name prefix shared by every log file
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```no_run
    /// use daylog::Logger;
    ///
    /// let logger = Logger::create("/tmp/logs", "app", 100)?;
    ///
    /// // After logging operations...
    /// let metrics = logger.metrics();
    /// println!("Written: {}", metrics.written());
    /// println!("Dropped: {}", metrics.dropped());
    /// println!("Failure rate: {:.2}%", metrics.failure_rate());
    /// # Ok::<(), daylog::LoggerError>(())
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.is_closed() {
            match self.close(self.close_wait_millis) {
                Ok(ShutdownReport { abandoned, .. }) if abandoned > 0 => report(
                    Severity::Warning,
                    format_args!("Logger dropped with {} records abandoned", abandoned),
                ),
                Ok(_) => {}
                Err(e) => report(
                    Severity::Error,
                    format_args!("Failed to close logger on drop: {}", e),
                ),
            }
        }

        let dropped = self.metrics.dropped();
        if dropped > 0 {
            report(
                Severity::Warning,
                format_args!(
                    "Logger shutting down with {} dropped records (failure rate: {:.2}%)",
                    dropped,
                    self.metrics.failure_rate()
                ),
            );
        }
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
/// ```no_run
/// use daylog::{Logger, LevelConfig, ERRO, FATL};
///
/// let logger = Logger::builder()
///     .directory("/var/log/api")
///     .base_name("api")
///     .queue_capacity(4096)
///     .level(ERRO, LevelConfig::new(false, true, true))
///     .call_site_for([ERRO, FATL])
///     .build()?;
/// # Ok::<(), daylog::LoggerError>(())
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    /// Create a new builder writing `app.*.log` into the current directory
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::new(".", "app"),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: LoggerConfig) -> Self {
        Self { config }
    }

    #[must_use = "builder methods return a new value"]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = directory.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        self.config.base_name = base_name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Drain wait used when the logger is dropped without `close`
    #[must_use = "builder methods return a new value"]
    pub fn close_wait_millis(mut self, millis: u64) -> Self {
        self.config.close_wait_millis = millis;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, name: impl Into<String>, level: LevelConfig) -> Self {
        self.config.levels.insert(name.into(), level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn call_site_for<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .call_site_levels
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Build the Logger
    pub fn build(self) -> Result<Logger> {
        Logger::from_config(self.config)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
