//! Work source: the input data files
//!
//! Each data file holds one domain name per line. Before any worker starts,
//! every file is opened, its names are counted, and it is closed and
//! reopened for reading. The count feeds the pipeline's termination
//! predicate, so the pre-scan and [`WorkFile::read_name`] split lines the
//! same way: surrounding whitespace is trimmed and blank lines are skipped.
//!
//! No more than one byte past the name length limit is ever held for a
//! line; the rest of an overlong line is skipped in place.
//!
//! A file that cannot be opened is not an error. It is reported with a
//! warning and contributes zero names.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker stored in place of a name that exceeds the length limit
pub const OVERSIZED_MARKER: &str = "DOMAIN NAME EXCEEDED MAX LENGTH";

/// One buffer slot's worth of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainName {
    /// A name within the length limit
    Valid(String),

    /// A name that was too long; displays as [`OVERSIZED_MARKER`]
    Oversized,
}

impl DomainName {
    /// Classify a line against the length limit (in bytes)
    pub fn new(line: String, max_len: usize) -> Self {
        if line.len() > max_len {
            DomainName::Oversized
        } else {
            DomainName::Valid(line)
        }
    }

    /// Text written to the logs for this entry
    pub fn as_str(&self) -> &str {
        match self {
            DomainName::Valid(name) => name,
            DomainName::Oversized => OVERSIZED_MARKER,
        }
    }

    pub fn is_oversized(&self) -> bool {
        matches!(self, DomainName::Oversized)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read one line, storing at most `cap` bytes of it
///
/// Leading whitespace is not stored. Returns `None` at end of input,
/// otherwise whether a non-whitespace byte past the cap was dropped.
fn read_capped_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    cap: usize,
) -> io::Result<Option<bool>> {
    buf.clear();
    let mut read_any = false;
    let mut overflow = false;

    loop {
        let (used, line_done) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(read_any.then_some(overflow));
            }
            read_any = true;

            let (chunk, used, line_done) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => (&available[..end], end + 1, true),
                None => (available, available.len(), false),
            };

            for &b in chunk {
                if buf.is_empty() && b.is_ascii_whitespace() {
                    continue;
                }
                if buf.len() < cap {
                    buf.push(b);
                } else if !b.is_ascii_whitespace() {
                    overflow = true;
                }
            }

            (used, line_done)
        };

        reader.consume(used);
        if line_done {
            return Ok(Some(overflow));
        }
    }
}

/// Read the next non-blank, trimmed name
fn next_name<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_len: usize,
) -> io::Result<Option<DomainName>> {
    let cap = max_len.saturating_add(1);

    loop {
        let Some(overflow) = read_capped_line(reader, buf, cap)? else {
            return Ok(None);
        };
        if overflow {
            return Ok(Some(DomainName::Oversized));
        }

        let line = String::from_utf8_lossy(buf);
        let name = line.trim();
        if !name.is_empty() {
            return Ok(Some(DomainName::new(name.to_string(), max_len)));
        }
    }
}

/// Count the names in a data file
pub fn count_names(path: &Path, max_len: usize) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut count = 0;

    while next_name(&mut reader, &mut buf, max_len)?.is_some() {
        count += 1;
    }

    Ok(count)
}

/// A sequential, read-only handle to one data file
///
/// Owned by exactly one requester while it is being read. The underlying
/// file is closed as soon as the end is reached.
pub struct WorkFile {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    buf: Vec<u8>,
    exhausted: bool,
}

impl WorkFile {
    /// Open a data file for reading
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;

        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
            buf: Vec::new(),
            exhausted: false,
        })
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the underlying file is still open
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Whether every line has been read
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Read the next domain name, or `None` at end of file
    ///
    /// Names longer than `max_len` bytes come back as
    /// [`DomainName::Oversized`]. A read error ends the file early; it is
    /// logged, not returned.
    pub fn read_name(&mut self, max_len: usize) -> Option<DomainName> {
        let reader = self.reader.as_mut()?;

        match next_name(reader, &mut self.buf, max_len) {
            Ok(Some(name)) => Some(name),
            Ok(None) => {
                debug!(path = %self.path.display(), "Data file exhausted");
                self.close();
                None
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Read failed, treating as end of file"
                );
                self.close();
                None
            }
        }
    }

    fn close(&mut self) {
        self.reader = None;
        self.exhausted = true;
    }
}

impl fmt::Debug for WorkFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkFile")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// The ordered set of data files, pre-scanned and reopened
#[derive(Debug)]
pub struct WorkSource {
    files: Vec<WorkFile>,
    missing: Vec<PathBuf>,
    total_files: usize,
    total_names: u64,
}

impl WorkSource {
    /// Pre-scan every path and reopen the valid ones for reading
    pub fn prepare(paths: &[PathBuf], max_len: usize) -> Self {
        let mut files = Vec::with_capacity(paths.len());
        let mut missing = Vec::new();
        let mut total_names = 0;

        for path in paths {
            let count = match count_names(path, max_len) {
                Ok(count) => count,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Data file path is not valid; moving on to next file"
                    );
                    missing.push(path.clone());
                    continue;
                }
            };

            match WorkFile::open(path) {
                Ok(file) => {
                    debug!(path = %path.display(), names = count, "Data file scanned");
                    total_names += count;
                    files.push(file);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Data file could not be reopened; moving on to next file"
                    );
                    missing.push(path.clone());
                }
            }
        }

        Self {
            files,
            missing,
            total_files: paths.len(),
            total_names,
        }
    }

    /// Number of paths given, including missing ones
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Names counted across all readable files
    pub fn total_names(&self) -> u64 {
        self.total_names
    }

    /// Paths that could not be opened
    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    /// Hand over the readable files, in input order
    pub fn into_files(self) -> Vec<WorkFile> {
        self.files
    }
}
