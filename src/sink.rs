//! Append-only log sinks
//!
//! Two sinks are shared across the pools: the requester log records every
//! name as it is read, the resolver log records `name,address` results.
//! Each sink has its own lock, separate from the pipeline's, and every line
//! goes out in a single write under that lock so records from different
//! threads never interleave.

use crate::error::SinkError;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, line-oriented output destination
pub struct LogSink {
    writer: Mutex<Box<dyn Write + Send>>,
    lines_written: AtomicU64,
}

impl LogSink {
    /// Open a log file, truncating it unless `append` is set
    pub fn create(path: &Path, append: bool) -> Result<Self, SinkError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options.open(path).map_err(|source| SinkError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Wrap any writer
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            lines_written: AtomicU64::new(0),
        }
    }

    /// Append one line; a trailing newline is added
    pub fn append_line(&self, line: &str) -> io::Result<()> {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let mut writer = self.writer.lock();
        writer.write_all(record.as_bytes())?;
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Flush buffered lines to the destination
    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    /// Lines successfully appended so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }
}
