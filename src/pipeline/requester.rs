//! Requester worker threads
//!
//! Each requester:
//! - Claims an unread data file from the coordinator
//! - Reads it line by line, outside any pipeline lock
//! - Records every name in the requester log
//! - Pushes every name into the bounded buffer, blocking while it is full
//! - Reports the file complete at end of file and claims the next one
//!
//! On exit it appends a `Thread <id> serviced <n> files` line to the
//! requester log.

use crate::error::{WorkerError, WorkerRole};
use crate::pipeline::Coordinator;
use crate::sink::LogSink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Statistics collected by a requester
#[derive(Debug, Default)]
pub struct RequesterStats {
    /// Data files read to the end
    pub files_serviced: AtomicU64,

    /// Names pushed into the buffer
    pub names_produced: AtomicU64,

    /// Names replaced by the oversized marker
    pub oversized: AtomicU64,

    /// Failed requester log writes
    pub log_errors: AtomicU64,
}

impl RequesterStats {
    fn record_file(&self) {
        self.files_serviced.fetch_add(1, Ordering::Relaxed);
    }

    fn record_name(&self) {
        self.names_produced.fetch_add(1, Ordering::Relaxed);
    }

    fn record_oversized(&self) {
        self.oversized.fetch_add(1, Ordering::Relaxed);
    }

    fn record_log_error(&self) {
        self.log_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_serviced(&self) -> u64 {
        self.files_serviced.load(Ordering::Relaxed)
    }
}

/// A requester thread
pub struct Requester {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<RequesterStats>,
}

impl Requester {
    /// Spawn a new requester thread
    pub fn spawn(
        id: usize,
        coordinator: Arc<Coordinator>,
        log: Arc<LogSink>,
        max_name_length: usize,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(RequesterStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("requester-{}", id))
            .spawn(move || requester_loop(id, &coordinator, &log, max_name_length, &stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                role: WorkerRole::Requester,
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &Arc<RequesterStats> {
        &self.stats
    }

    /// Wait for the requester to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                role: WorkerRole::Requester,
                id: self.id,
            }),
            None => Ok(()),
        }
    }
}

/// Main requester loop
fn requester_loop(
    id: usize,
    coordinator: &Coordinator,
    log: &LogSink,
    max_name_length: usize,
    stats: &RequesterStats,
) {
    info!(worker = id, "Requester starting");
    let _guard = coordinator.abandon_on_panic();

    while let Some(mut file) = coordinator.next_file() {
        debug!(worker = id, path = %file.path().display(), "Claimed data file");

        while let Some(name) = file.read_name(max_name_length) {
            if name.is_oversized() {
                stats.record_oversized();
                warn!(
                    worker = id,
                    path = %file.path().display(),
                    limit = max_name_length,
                    "Domain name exceeded max length"
                );
            }

            if let Err(e) = log.append_line(name.as_str()) {
                stats.record_log_error();
                warn!(worker = id, error = %e, "Failed to write requester log");
            }

            if !coordinator.produce(name) {
                debug!(worker = id, "Pipeline abandoned, requester stopping");
                return;
            }
            stats.record_name();
        }

        coordinator.complete_file();
        stats.record_file();
        debug!(worker = id, path = %file.path().display(), "Data file complete");
    }

    let serviced = stats.files_serviced();
    if let Err(e) = log.append_line(&format!("Thread {} serviced {} files", id, serviced)) {
        stats.record_log_error();
        warn!(worker = id, error = %e, "Failed to write requester log");
    }

    info!(
        worker = id,
        files = serviced,
        names = stats.names_produced.load(Ordering::Relaxed),
        "Requester finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DomainName, WorkFile, OVERSIZED_MARKER};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_requester_stats() {
        let stats = RequesterStats::default();

        stats.record_file();
        stats.record_name();
        stats.record_name();
        stats.record_oversized();
        stats.record_log_error();

        assert_eq!(stats.files_serviced(), 1);
        assert_eq!(stats.names_produced.load(Ordering::Relaxed), 2);
        assert_eq!(stats.oversized.load(Ordering::Relaxed), 1);
        assert_eq!(stats.log_errors.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_requester_reads_file_into_buffer() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "a.com").unwrap();
        writeln!(tmp, "{}", "x".repeat(20)).unwrap();
        writeln!(tmp, "b.com").unwrap();
        tmp.flush().unwrap();

        let file = WorkFile::open(tmp.path()).unwrap();
        // Capacity covers every name so the requester never blocks
        let coordinator = Arc::new(Coordinator::new(8, vec![file], 1, 3));
        let buf = SharedBuf::default();
        let log = Arc::new(LogSink::from_writer(buf.clone()));

        let requester = Requester::spawn(0, Arc::clone(&coordinator), log, 10).unwrap();
        assert_eq!(requester.id(), 0);
        let stats = Arc::clone(&requester.stats);
        requester.join().unwrap();

        assert_eq!(stats.files_serviced(), 1);
        assert_eq!(stats.oversized.load(Ordering::Relaxed), 1);

        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.counters.files_completed, 1);
        assert_eq!(snapshot.counters.names_produced, 3);
        assert_eq!(snapshot.occupied, 3);

        assert_eq!(coordinator.consume(), Some(DomainName::Valid("a.com".into())));
        assert_eq!(coordinator.consume(), Some(DomainName::Oversized));
        assert_eq!(coordinator.consume(), Some(DomainName::Valid("b.com".into())));
        assert_eq!(coordinator.consume(), None);

        assert_eq!(
            buf.contents(),
            format!("a.com\n{}\nb.com\nThread 0 serviced 1 files\n", OVERSIZED_MARKER)
        );
    }
}
