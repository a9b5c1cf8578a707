//! Log record structure

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::sync::Arc;

/// `strftime` pattern for the date part of a record (also used in file names)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `strftime` pattern for the time part of a record
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Hook run on the flush loop thread once a record has been written.
///
/// Receives the record text and its `"{date} {time}"` stamp. The hook runs
/// synchronously on the writer thread, so a slow hook delays every record
/// queued behind it.
pub type RecordCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// A single queued log line.
///
/// Date and time are captured when the record is built, on the producer
/// thread, and both rotation and the printed timestamp use those values.
#[derive(Clone)]
pub struct LogRecord {
    date: String,
    time: String,
    level: String,
    text: String,
    callback: Option<RecordCallback>,
    raw: bool,
}

impl LogRecord {
    /// Build a record stamped with the current local time
    pub fn new(level: impl Into<String>, text: impl Into<String>) -> Self {
        Self::at(level, text, Local::now().naive_local())
    }

    /// Build a record with an explicit timestamp
    pub fn at(level: impl Into<String>, text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            date: timestamp.format(DATE_FORMAT).to_string(),
            time: timestamp.format(TIME_FORMAT).to_string(),
            level: level.into(),
            text: text.into(),
            callback: None,
            raw: false,
        }
    }

    /// Build a "dry" record: written verbatim to the main file, no tag or stamp
    pub fn raw(text: impl Into<String>) -> Self {
        Self::raw_at(text, Local::now().naive_local())
    }

    /// Build a "dry" record with an explicit timestamp (used only for rotation)
    pub fn raw_at(text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            raw: true,
            ..Self::at(String::new(), text, timestamp)
        }
    }

    #[must_use]
    pub fn with_callback(mut self, callback: RecordCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn callback(&self) -> Option<&RecordCallback> {
        self.callback.as_ref()
    }

    /// `"{date} {time}"`, the stamp handed to callbacks
    pub fn stamp(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Render the record as it appears in a log file, newline included
    pub fn to_line(&self) -> String {
        if self.raw {
            format!("{}\n", self.text)
        } else {
            format!("{} {} [{}] {}\n", self.date, self.time, self.level, self.text)
        }
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("date", &self.date)
            .field("time", &self.time)
            .field("level", &self.level)
            .field("text", &self.text)
            .field("callback", &self.callback.is_some())
            .field("raw", &self.raw)
            .finish()
    }
}
