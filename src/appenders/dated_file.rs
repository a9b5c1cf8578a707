//! Date-stamped log file with rotation on date change
//!
//! One `DatedFile` is one destination: either the main file
//! `{base}.{date}.log` or a level's own file `{base}.{date}.{LEVEL}.log`.
//! It holds at most one open handle, and the handle always belongs to the
//! file named after the cached date.

use crate::core::error::{LoggerError, Result};
use crate::core::log_record::LogRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct DatedFile {
    directory: PathBuf,
    base_name: String,
    level: Option<String>,
    current_date: Option<String>,
    writer: Option<BufWriter<File>>,
}

impl DatedFile {
    /// The main destination, not opened yet
    pub fn main(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
            level: None,
            current_date: None,
            writer: None,
        }
    }

    /// A level's own destination, not opened yet
    pub fn for_level(
        directory: impl Into<PathBuf>,
        base_name: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
            level: Some(level.into()),
            current_date: None,
            writer: None,
        }
    }

    /// File name for `date`
    pub fn path_for(&self, date: &str) -> PathBuf {
        file_path(&self.directory, &self.base_name, date, self.level.as_deref())
    }

    pub fn current_date(&self) -> Option<&str> {
        self.current_date.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Whether a record dated `date` needs a different file than the open one
    pub fn needs_rotation(&self, date: &str) -> bool {
        self.writer.is_none() || self.current_date.as_deref() != Some(date)
    }

    /// Open (create or append) the file for `date`.
    ///
    /// The destination must be closed first; on failure it stays closed
    /// with no cached date.
    pub fn open(&mut self, date: &str) -> Result<()> {
        debug_assert!(self.writer.is_none(), "open called with a handle still installed");
        let path = self.path_for(date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::file_open(&path, e))?;

        self.writer = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());
        Ok(())
    }

    /// Flush and release the current handle, if any.
    ///
    /// The handle is released even when the flush fails.
    pub fn close(&mut self) -> Result<()> {
        self.current_date = None;
        match self.writer.take() {
            Some(mut writer) => writer
                .flush()
                .map_err(|e| LoggerError::io_operation("flushing log file before close", e)),
            None => Ok(()),
        }
    }

    /// Write the record's rendered line to the open file
    pub fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::io_operation("writing record", closed_error()))?;
        writer
            .write_all(record.to_line().as_bytes())
            .map_err(|e| LoggerError::io_operation("writing record", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer
                .flush()
                .map_err(|e| LoggerError::io_operation("flushing log file", e))?;
        }
        Ok(())
    }
}

impl Drop for DatedFile {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// `{directory}/{base}.{date}.log` or `{directory}/{base}.{date}.{LEVEL}.log`
pub fn file_path(directory: &Path, base_name: &str, date: &str, level: Option<&str>) -> PathBuf {
    let name = match level {
        Some(level) => format!("{}.{}.{}.log", base_name, date, level),
        None => format!("{}.{}.log", base_name, date),
    };
    directory.join(name)
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "log file is not open")
}
