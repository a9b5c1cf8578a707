//! File destinations written by the flush loop

pub mod dated_file;

pub use dated_file::{file_path, DatedFile};
