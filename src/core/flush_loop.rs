//! The single consumer that owns every log file handle
//!
//! The loop waits on two sources at once: the record queue and the control
//! channel. Records are routed, written and their callbacks run in dequeue
//! order. A shutdown request stops the loop for good: whatever is still
//! queued is abandoned, every handle is flushed and closed once, and the
//! number of abandoned records is sent back as the acknowledgement.

use super::{
    diagnostics::{panic_message, report, should_report, Severity},
    error::LoggerError,
    level::LevelRegistry,
    log_record::LogRecord,
    metrics::LoggerMetrics,
};
use crate::appenders::DatedFile;
use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Thread name of the flush loop
pub const FLUSH_THREAD_NAME: &str = "daylog-flush";

/// How long `stop` waits for a record from a producer still inside `send`
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Messages from the owning [`Logger`](super::Logger) to the loop
pub(crate) enum Control {
    /// Stop, close all files, then reply with the abandoned record count
    Shutdown { ack: Sender<usize> },
}

pub(crate) struct FlushLoop {
    records: Receiver<LogRecord>,
    control: Receiver<Control>,
    registry: Arc<RwLock<LevelRegistry>>,
    metrics: Arc<LoggerMetrics>,
    /// Producers past the closed check whose send has not returned yet
    in_flight: Arc<AtomicUsize>,
    directory: PathBuf,
    base_name: String,
    main: DatedFile,
    level_files: HashMap<String, DatedFile>,
}

impl FlushLoop {
    /// `main` is normally already open on today's file
    pub(crate) fn new(
        records: Receiver<LogRecord>,
        control: Receiver<Control>,
        registry: Arc<RwLock<LevelRegistry>>,
        metrics: Arc<LoggerMetrics>,
        in_flight: Arc<AtomicUsize>,
        directory: PathBuf,
        base_name: String,
        main: DatedFile,
    ) -> Self {
        Self {
            records,
            control,
            registry,
            metrics,
            in_flight,
            directory,
            base_name,
            main,
            level_files: HashMap::new(),
        }
    }

    pub(crate) fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(FLUSH_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let control = self.control.clone();
        let records = self.records.clone();
        loop {
            select! {
                recv(control) -> msg => {
                    let abandoned = self.stop();
                    if let Ok(Control::Shutdown { ack }) = msg {
                        let _ = ack.send(abandoned);
                    }
                    return;
                }
                recv(records) -> msg => match msg {
                    Ok(record) => {
                        self.process(&record);
                        // Hand buffered lines to the OS whenever we catch up
                        if records.is_empty() {
                            self.flush_all();
                        }
                    }
                    Err(_) => {
                        self.stop();
                        return;
                    }
                },
            }
        }
    }

    /// Route one record to its destinations, then run its callback
    fn process(&mut self, record: &LogRecord) {
        let config = if record.is_raw() {
            None
        } else {
            self.registry.read().get(record.level())
        };

        let mut delivered = true;

        if config.is_some_and(|c| c.has_own_file) {
            let level = record.level();
            let directory = &self.directory;
            let base_name = &self.base_name;
            let file = self
                .level_files
                .entry(level.to_string())
                .or_insert_with(|| DatedFile::for_level(directory, base_name.as_str(), level));
            delivered &= deliver(file, record, &self.metrics);
        }

        if config.map_or(true, |c| c.writes_to_main()) {
            delivered &= deliver(&mut self.main, record, &self.metrics);
        }

        if delivered {
            self.metrics.record_written();
        } else {
            self.metrics.record_dropped();
        }

        self.run_callback(record);
    }

    fn run_callback(&self, record: &LogRecord) {
        let Some(callback) = record.callback() else {
            return;
        };

        let stamp = record.stamp();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            callback(record.text(), &stamp)
        }));

        if let Err(payload) = result {
            let previous = self.metrics.record_callback_panic();
            if should_report(previous) {
                report(
                    Severity::Critical,
                    format_args!(
                        "Record callback panicked ({} so far): {}. Flush loop continues.",
                        previous + 1,
                        panic_message(payload.as_ref())
                    ),
                );
            }
        }
    }

    fn flush_all(&mut self) {
        let results: Vec<_> = std::iter::once(self.main.flush())
            .chain(self.level_files.values_mut().map(DatedFile::flush))
            .collect();
        for result in results {
            if let Err(e) = result {
                report_write_failure(&self.metrics, &e);
            }
        }
    }

    /// Abandon queued records and close every handle exactly once.
    ///
    /// Producers that passed the closed check before shutdown may still be
    /// blocked in `send`; their records are received and counted too.
    fn stop(&mut self) -> usize {
        let mut abandoned = 0;
        loop {
            abandoned += self.records.try_iter().count();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                abandoned += self.records.try_iter().count();
                break;
            }
            if self.records.recv_timeout(STOP_POLL_INTERVAL).is_ok() {
                abandoned += 1;
            }
        }

        if abandoned > 0 {
            self.metrics.record_abandoned(abandoned as u64);
            report(
                Severity::Warning,
                format_args!(
                    "Flush loop stopped with {} records still queued; they were not written.",
                    abandoned
                ),
            );
        }

        if let Err(e) = self.main.close() {
            report_write_failure(&self.metrics, &e);
        }
        for file in self.level_files.values_mut() {
            if let Err(e) = file.close() {
                report_write_failure(&self.metrics, &e);
            }
        }

        abandoned
    }
}

/// Rotate `file` to the record's date if needed and write the record.
///
/// Returns false when the record did not reach this destination. A failed
/// rotation leaves the destination closed; the next record retries the open.
fn deliver(file: &mut DatedFile, record: &LogRecord, metrics: &LoggerMetrics) -> bool {
    if file.needs_rotation(record.date()) {
        if let Err(e) = file.close() {
            report_write_failure(metrics, &e);
        }
        if let Err(e) = file.open(record.date()) {
            let previous = metrics.record_rotation_failure();
            if should_report(previous) {
                report(
                    Severity::Error,
                    format_args!(
                        "Log rotation failed ({} so far): {}. Records for this file are dropped until it can be opened.",
                        previous + 1,
                        e
                    ),
                );
            }
            return false;
        }
    }

    match file.write_record(record) {
        Ok(()) => true,
        Err(e) => {
            report_write_failure(metrics, &e);
            false
        }
    }
}

fn report_write_failure(metrics: &LoggerMetrics, error: &LoggerError) {
    let previous = metrics.record_write_failure();
    if should_report(previous) {
        report(
            Severity::Error,
            format_args!("Log write failed ({} so far): {}", previous + 1, error),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::LevelConfig;
    use chrono::NaiveDate;
    use crossbeam_channel::bounded;
    use std::fs;
    use tempfile::TempDir;

    struct Harness {
        records: Sender<LogRecord>,
        control: Sender<Control>,
        registry: Arc<RwLock<LevelRegistry>>,
        metrics: Arc<LoggerMetrics>,
        handle: thread::JoinHandle<()>,
    }

    impl Harness {
        fn start(dir: &TempDir) -> Self {
            let (records, records_rx) = bounded(64);
            let (control, control_rx) = bounded(1);
            let registry = Arc::new(RwLock::new(LevelRegistry::new()));
            let metrics = Arc::new(LoggerMetrics::new());
            let main = DatedFile::main(dir.path(), "app");
            let handle = FlushLoop::new(
                records_rx,
                control_rx,
                Arc::clone(&registry),
                Arc::clone(&metrics),
                Arc::new(AtomicUsize::new(0)),
                dir.path().to_path_buf(),
                "app".to_string(),
                main,
            )
            .spawn()
            .expect("spawn flush loop");

            Self {
                records,
                control,
                registry,
                metrics,
                handle,
            }
        }

        fn send(&self, record: LogRecord) {
            self.records.send(record).expect("queue open");
        }

        fn wait_empty(&self) {
            while !self.records.is_empty() {
                thread::sleep(std::time::Duration::from_millis(1));
            }
        }

        fn stop(self) -> usize {
            let (ack, ack_rx) = bounded(1);
            self.control.send(Control::Shutdown { ack }).expect("control open");
            let abandoned = ack_rx.recv().expect("ack");
            self.handle.join().expect("join");
            abandoned
        }
    }

    fn on_day(day: u32, level: &str, text: &str) -> LogRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        LogRecord::at(level, text, ts)
    }

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap_or_default()
    }

    #[test]
    fn test_rotation_on_date_change() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::start(&dir);

        harness.send(on_day(1, "INFO", "first"));
        harness.send(on_day(2, "INFO", "second"));
        harness.send(on_day(2, "INFO", "third"));
        harness.wait_empty();
        assert_eq!(harness.stop(), 0);

        assert_eq!(read(&dir, "app.2024-01-01.log"), "2024-01-01 23:59:59 [INFO] first\n");
        assert_eq!(
            read(&dir, "app.2024-01-02.log"),
            "2024-01-02 23:59:59 [INFO] second\n2024-01-02 23:59:59 [INFO] third\n"
        );
    }

    #[test]
    fn test_own_file_without_duplicate() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::start(&dir);
        harness
            .registry
            .write()
            .set_level("ERRO", LevelConfig::new(false, true, false));

        harness.send(on_day(3, "ERRO", "boom"));
        harness.send(on_day(3, "INFO", "fine"));
        harness.wait_empty();
        harness.stop();

        assert_eq!(read(&dir, "app.2024-01-03.ERRO.log"), "2024-01-03 23:59:59 [ERRO] boom\n");
        assert_eq!(read(&dir, "app.2024-01-03.log"), "2024-01-03 23:59:59 [INFO] fine\n");
    }

    #[test]
    fn test_raw_record_ignores_level_routing() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::start(&dir);
        harness
            .registry
            .write()
            .set_level("", LevelConfig::new(false, true, false));

        let ts = NaiveDate::from_ymd_opt(2024, 1, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        harness.send(LogRecord::raw_at("X", ts));
        harness.wait_empty();
        harness.stop();

        assert_eq!(read(&dir, "app.2024-01-04.log"), "X\n");
        assert!(!dir.path().join("app.2024-01-04..log").exists());
    }

    #[test]
    fn test_failed_rotation_drops_and_recovers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app.2024-01-06.log")).unwrap();
        let harness = Harness::start(&dir);

        harness.send(on_day(5, "INFO", "day five"));
        harness.send(on_day(6, "INFO", "lost"));
        harness.send(on_day(7, "INFO", "day seven"));
        harness.wait_empty();
        let metrics = Arc::clone(&harness.metrics);
        harness.stop();

        assert_eq!(metrics.rotation_failures(), 1);
        assert_eq!(metrics.dropped(), 1);
        assert_eq!(metrics.written(), 2);
        assert_eq!(read(&dir, "app.2024-01-05.log"), "2024-01-05 23:59:59 [INFO] day five\n");
        assert_eq!(read(&dir, "app.2024-01-07.log"), "2024-01-07 23:59:59 [INFO] day seven\n");
    }

    #[test]
    fn test_callback_panic_is_isolated() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::start(&dir);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        harness.send(on_day(8, "ACES", "bad").with_callback(Arc::new(|_: &str, _: &str| panic!("callback failure"))));
        harness.send(on_day(8, "ACES", "good").with_callback(Arc::new(move |text: &str, stamp: &str| {
            assert_eq!(text, "good");
            assert_eq!(stamp, "2024-01-08 23:59:59");
            calls_clone.fetch_add(1, Ordering::SeqCst);
        })));
        harness.wait_empty();
        let metrics = Arc::clone(&harness.metrics);
        harness.stop();

        assert_eq!(metrics.callback_panics(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            read(&dir, "app.2024-01-08.log"),
            "2024-01-08 23:59:59 [ACES] bad\n2024-01-08 23:59:59 [ACES] good\n"
        );
    }

    #[test]
    fn test_stop_counts_abandoned_records() {
        let dir = TempDir::new().unwrap();
        let (records, records_rx) = bounded(8);
        let (control, control_rx) = bounded(1);
        let metrics = Arc::new(LoggerMetrics::new());
        let mut flush_loop = FlushLoop::new(
            records_rx,
            control_rx,
            Arc::new(RwLock::new(LevelRegistry::new())),
            Arc::clone(&metrics),
            Arc::new(AtomicUsize::new(0)),
            dir.path().to_path_buf(),
            "app".to_string(),
            DatedFile::main(dir.path(), "app"),
        );

        for i in 0..3 {
            records.send(on_day(9, "INFO", &format!("queued {}", i))).unwrap();
        }
        drop(control);

        assert_eq!(flush_loop.stop(), 3);
        assert_eq!(metrics.abandoned(), 3);
        assert!(!dir.path().join("app.2024-01-09.log").exists());
    }

    #[test]
    fn test_stop_waits_for_blocked_producer() {
        let dir = TempDir::new().unwrap();
        let (records, records_rx) = bounded(1);
        let (_control, control_rx) = bounded(1);
        let metrics = Arc::new(LoggerMetrics::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut flush_loop = FlushLoop::new(
            records_rx,
            control_rx,
            Arc::new(RwLock::new(LevelRegistry::new())),
            Arc::clone(&metrics),
            Arc::clone(&in_flight),
            dir.path().to_path_buf(),
            "app".to_string(),
            DatedFile::main(dir.path(), "app"),
        );

        records.send(on_day(10, "INFO", "queued")).unwrap();
        in_flight.fetch_add(1, Ordering::SeqCst);
        let producer = {
            let in_flight = Arc::clone(&in_flight);
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(20));
                // Blocks until stop frees the only slot
                records.send(on_day(10, "INFO", "blocked")).unwrap();
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        };

        assert_eq!(flush_loop.stop(), 2);
        producer.join().unwrap();
        assert_eq!(metrics.abandoned(), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }
}
