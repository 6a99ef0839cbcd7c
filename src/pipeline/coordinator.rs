//! Pipeline coordinator - the shared state both pools work against
//!
//! The coordinator is responsible for:
//! - Handing out unclaimed data files to requesters
//! - Blocking producers while the buffer is full
//! - Blocking consumers while the buffer is empty and input remains
//! - Tracking progress counters and the global completion predicate
//!
//! All of it lives behind one mutex with two condition variables. The lock
//! is held only for the duration of a single slot operation, never across
//! file I/O, log writes or name resolution.

use crate::pipeline::buffer::BoundedBuffer;
use crate::source::{DomainName, WorkFile};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::debug;

/// Shared progress counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    /// Data files given, including missing ones
    pub total_files: usize,

    /// Data files fully read (missing files count as read)
    pub files_completed: usize,

    /// Names found by the pre-scan
    pub total_names: u64,

    /// Names written into the buffer
    pub names_produced: u64,

    /// Names taken out of the buffer
    pub names_consumed: u64,
}

impl ProgressCounters {
    /// Every file read and every name consumed
    pub fn is_globally_done(&self) -> bool {
        self.files_completed == self.total_files && self.names_consumed == self.total_names
    }

    /// No requester will ever produce again
    fn input_finished(&self) -> bool {
        self.files_completed == self.total_files
    }
}

/// Point-in-time view of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSnapshot {
    pub counters: ProgressCounters,

    /// Occupied buffer slots
    pub occupied: usize,

    /// Buffer capacity
    pub capacity: usize,

    /// Files not yet claimed by a requester
    pub pending_files: usize,
}

struct SharedState {
    buffer: BoundedBuffer<DomainName>,
    pending: VecDeque<WorkFile>,
    counters: ProgressCounters,
    abandoned: bool,
}

impl SharedState {
    fn no_more_input(&self) -> bool {
        self.abandoned || self.counters.input_finished()
    }
}

/// Owner of the bounded buffer, the pending files and the counters
///
/// Shared by `Arc` between every worker. Locking is internal.
pub struct Coordinator {
    state: Mutex<SharedState>,

    /// Signalled when the buffer drains so producers can refill it
    not_full: Condvar,

    /// Signalled when the buffer fills or input ends
    not_empty: Condvar,
}

impl Coordinator {
    /// Create a coordinator over the readable files
    ///
    /// `total_files` includes files that could not be opened; those are
    /// counted as completed from the start. It is raised to the number of
    /// readable files if it is smaller.
    pub fn new(capacity: usize, files: Vec<WorkFile>, total_files: usize, total_names: u64) -> Self {
        let readable = files.len();
        let total_files = total_files.max(readable);

        Self {
            state: Mutex::new(SharedState {
                buffer: BoundedBuffer::new(capacity),
                pending: files.into(),
                counters: ProgressCounters {
                    total_files,
                    files_completed: total_files - readable,
                    total_names,
                    names_produced: 0,
                    names_consumed: 0,
                },
                abandoned: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Claim the next unread file
    ///
    /// Returns `None` once every file has been claimed or the pipeline is
    /// done. A claimed file belongs to the caller alone until it reports
    /// [`Coordinator::complete_file`].
    pub fn next_file(&self) -> Option<WorkFile> {
        let mut state = self.state.lock();
        if state.abandoned || state.counters.is_globally_done() {
            return None;
        }
        state.pending.pop_front()
    }

    /// Record that a claimed file has been read to the end
    pub fn complete_file(&self) {
        let mut state = self.state.lock();
        state.counters.files_completed += 1;
        debug_assert!(state.counters.files_completed <= state.counters.total_files);

        if state.counters.input_finished() {
            debug!(
                produced = state.counters.names_produced,
                total = state.counters.total_names,
                "All data files read"
            );
            // Consumers parked on an empty buffer must see the end of input
            self.not_empty.notify_all();
        }
    }

    /// Put a name into the buffer, blocking while it is full
    ///
    /// Returns `false` only if the pipeline was abandoned, in which case the
    /// name is dropped and the caller should stop.
    #[must_use]
    pub fn produce(&self, name: DomainName) -> bool {
        let mut state = self.state.lock();
        let mut name = name;

        loop {
            if state.abandoned {
                return false;
            }
            match state.buffer.push(name) {
                Ok(()) => break,
                Err(back) => {
                    name = back;
                    self.not_full.wait(&mut state);
                }
            }
        }

        state.counters.names_produced += 1;

        let last = state.counters.names_produced >= state.counters.total_names;
        if state.buffer.is_full() || last {
            self.not_empty.notify_all();
        }
        true
    }

    /// Take the next name, blocking while the buffer is empty and input
    /// remains
    ///
    /// Returns `None` once the buffer is empty and no more names can arrive.
    pub fn consume(&self) -> Option<DomainName> {
        let mut state = self.state.lock();

        loop {
            if let Some(name) = state.buffer.pop() {
                state.counters.names_consumed += 1;
                if state.buffer.is_empty() {
                    self.not_full.notify_all();
                }
                return Some(name);
            }

            if state.no_more_input() {
                return None;
            }

            self.not_empty.wait(&mut state);
        }
    }

    /// Every file read and every name consumed
    pub fn is_globally_done(&self) -> bool {
        self.state.lock().counters.is_globally_done()
    }

    /// Release every blocked worker without finishing the work
    ///
    /// Used when the pools cannot be fully started: producers stop and
    /// consumers see exhaustion, so the started threads can be joined.
    pub fn abandon(&self) {
        let mut state = self.state.lock();
        state.abandoned = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Guard that abandons the pipeline if the holding thread panics
    pub fn abandon_on_panic(&self) -> AbandonGuard<'_> {
        AbandonGuard { coordinator: self }
    }

    /// Current counters and buffer occupancy
    pub fn snapshot(&self) -> PipelineSnapshot {
        let state = self.state.lock();
        PipelineSnapshot {
            counters: state.counters,
            occupied: state.buffer.len(),
            capacity: state.buffer.capacity(),
            pending_files: state.pending.len(),
        }
    }
}

/// RAII guard held by every worker for the life of its loop
///
/// A worker that unwinds would otherwise leave its peers blocked forever on
/// a buffer nobody fills or drains.
pub struct AbandonGuard<'a> {
    coordinator: &'a Coordinator,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.coordinator.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn name(s: &str) -> DomainName {
        DomainName::Valid(s.to_string())
    }

    fn data_file(contents: &str) -> (NamedTempFile, WorkFile) {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp.flush().unwrap();
        let file = WorkFile::open(tmp.path()).unwrap();
        (tmp, file)
    }

    #[test]
    fn test_empty_pipeline_is_done() {
        let coordinator = Coordinator::new(5, Vec::new(), 2, 0);
        assert!(coordinator.is_globally_done());
        assert!(coordinator.next_file().is_none());
        assert_eq!(coordinator.consume(), None);
    }

    #[test]
    fn test_next_file_hands_out_each_file_once() {
        let (first_tmp, first) = data_file("a.com\n");
        let (second_tmp, second) = data_file("b.com\n");
        let coordinator = Coordinator::new(5, vec![first, second], 2, 2);

        let claimed = coordinator.next_file().unwrap();
        assert_eq!(claimed.path(), first_tmp.path());
        assert_eq!(coordinator.snapshot().pending_files, 1);

        let claimed = coordinator.next_file().unwrap();
        assert_eq!(claimed.path(), second_tmp.path());
        assert!(coordinator.next_file().is_none());

        // Claiming is not completion
        assert_eq!(coordinator.snapshot().counters.files_completed, 0);
    }

    #[test]
    fn test_total_files_covers_readable_files() {
        let (_first_tmp, first) = data_file("a.com\n");
        let (_second_tmp, second) = data_file("b.com\n");
        let coordinator = Coordinator::new(2, vec![first, second], 1, 2);

        let counters = coordinator.snapshot().counters;
        assert_eq!(counters.total_files, 2);
        assert_eq!(counters.files_completed, 0);

        let _first = coordinator.next_file().unwrap();
        let _second = coordinator.next_file().unwrap();
        assert!(coordinator.produce(name("a.com")));
        assert!(coordinator.produce(name("b.com")));
        coordinator.complete_file();
        coordinator.complete_file();

        assert_eq!(coordinator.consume(), Some(name("a.com")));
        assert_eq!(coordinator.consume(), Some(name("b.com")));
        assert_eq!(coordinator.consume(), None);
        assert!(coordinator.is_globally_done());
    }

    #[test]
    fn test_produce_consume_counts() {
        let (_tmp, file) = data_file("a.com\nb.com\n");
        let coordinator = Coordinator::new(2, vec![file], 1, 2);
        let _file = coordinator.next_file().unwrap();

        assert!(coordinator.produce(name("a.com")));
        assert!(coordinator.produce(name("b.com")));
        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.occupied, 2);
        assert_eq!(snapshot.counters.names_produced, 2);

        assert_eq!(coordinator.consume(), Some(name("a.com")));
        assert_eq!(coordinator.consume(), Some(name("b.com")));
        assert!(!coordinator.is_globally_done());

        coordinator.complete_file();
        assert!(coordinator.is_globally_done());
        assert_eq!(coordinator.consume(), None);
    }

    #[test]
    fn test_consumer_waits_for_last_file() {
        let (_tmp, file) = data_file("a.com\n");
        let coordinator = Arc::new(Coordinator::new(4, vec![file], 1, 1));
        let _file = coordinator.next_file().unwrap();

        let consumer = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(n) = coordinator.consume() {
                    seen.push(n);
                }
                seen
            })
        };

        // Buffer is not full, but this is the last name overall
        assert!(coordinator.produce(name("a.com")));
        thread::sleep(Duration::from_millis(20));
        coordinator.complete_file();

        assert_eq!(consumer.join().unwrap(), vec![name("a.com")]);
        assert!(coordinator.is_globally_done());
    }

    #[test]
    fn test_last_name_wakes_parked_consumer() {
        let (_tmp, file) = data_file("a.com\n");
        let coordinator = Arc::new(Coordinator::new(4, vec![file], 1, 1));
        let _file = coordinator.next_file().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();

        let consumer = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                while let Some(n) = coordinator.consume() {
                    tx.send(n).unwrap();
                }
            })
        };

        // Let the consumer park on the empty buffer
        thread::sleep(Duration::from_millis(20));
        assert!(coordinator.produce(name("a.com")));

        // Delivered before the file is reported complete
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(name("a.com")));
        assert_eq!(coordinator.snapshot().counters.files_completed, 0);

        coordinator.complete_file();
        consumer.join().unwrap();
        assert!(coordinator.is_globally_done());
    }

    #[test]
    fn test_producer_blocks_until_drained() {
        let (_tmp, file) = data_file("");
        let coordinator = Arc::new(Coordinator::new(1, vec![file], 1, 3));
        let _file = coordinator.next_file().unwrap();

        let producer = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                for n in ["a", "b", "c"] {
                    assert!(coordinator.produce(name(n)));
                    assert!(coordinator.snapshot().occupied <= 1);
                }
                coordinator.complete_file();
            })
        };

        let mut seen = Vec::new();
        while let Some(n) = coordinator.consume() {
            seen.push(n);
        }
        producer.join().unwrap();

        assert_eq!(seen, vec![name("a"), name("b"), name("c")]);
        let counters = coordinator.snapshot().counters;
        assert_eq!(counters.names_produced, 3);
        assert_eq!(counters.names_consumed, 3);
    }

    #[test]
    fn test_abandon_releases_blocked_producer() {
        let (_tmp, file) = data_file("");
        let coordinator = Arc::new(Coordinator::new(1, vec![file], 1, 2));
        let _file = coordinator.next_file().unwrap();
        assert!(coordinator.produce(name("a")));

        let producer = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.produce(name("b")))
        };

        thread::sleep(Duration::from_millis(20));
        coordinator.abandon();

        assert!(!producer.join().unwrap());
        assert!(coordinator.next_file().is_none());
    }

    #[test]
    fn test_panicking_worker_abandons() {
        let (_tmp, file) = data_file("");
        let coordinator = Arc::new(Coordinator::new(1, vec![file], 1, 1));

        let worker = {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let _guard = coordinator.abandon_on_panic();
                panic!("worker failed");
            })
        };
        assert!(worker.join().is_err());

        // Consumers no longer wait for the unfinished file
        assert_eq!(coordinator.consume(), None);
    }

    #[test]
    fn test_guard_is_inert_without_panic() {
        let coordinator = Coordinator::new(1, Vec::new(), 0, 0);
        drop(coordinator.abandon_on_panic());
        assert!(coordinator.produce(name("a")));
    }
}
