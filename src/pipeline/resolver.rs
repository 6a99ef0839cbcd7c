//! Resolver worker threads
//!
//! Each resolver:
//! - Takes the next name from the bounded buffer, blocking while it is empty
//! - Looks it up with no pipeline lock held
//! - Appends a `name,address` record to the resolver log
//!
//! A failed lookup is written as `name,` and the worker moves on. Names that
//! were replaced by the oversized marker are never looked up.

use crate::dns::Resolve;
use crate::error::{WorkerError, WorkerRole};
use crate::pipeline::Coordinator;
use crate::sink::LogSink;
use crate::source::DomainName;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// One line of the resolver log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub name: String,
    pub address: Option<IpAddr>,
}

impl ResultRecord {
    pub fn resolved(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            address: Some(address),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(addr) => write!(f, "{},{}", self.name, addr),
            None => write!(f, "{},", self.name),
        }
    }
}

/// Statistics collected by a resolver
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Names resolved to an address
    pub resolved: AtomicU64,

    /// Lookups that failed
    pub failed: AtomicU64,

    /// Oversized entries passed through without a lookup
    pub skipped: AtomicU64,

    /// Failed resolver log writes
    pub log_errors: AtomicU64,
}

impl ResolverStats {
    fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_log_error(&self) {
        self.log_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Names taken from the buffer by this worker
    pub fn consumed(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
            + self.failed.load(Ordering::Relaxed)
            + self.skipped.load(Ordering::Relaxed)
    }
}

/// A resolver thread
pub struct Resolver {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<ResolverStats>,
}

impl Resolver {
    /// Spawn a new resolver thread
    pub fn spawn(
        id: usize,
        coordinator: Arc<Coordinator>,
        resolver: Arc<dyn Resolve>,
        log: Arc<LogSink>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(ResolverStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("resolver-{}", id))
            .spawn(move || resolver_loop(id, &coordinator, resolver.as_ref(), &log, &stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                role: WorkerRole::Resolver,
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
    pub fn stats(&self) -> &Arc<ResolverStats> {
        &self.stats
    }

    /// Wait for the resolver to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                role: WorkerRole::Resolver,
                id: self.id,
            }),
            None => Ok(()),
        }
    }
}

/// Look up one buffer entry
fn resolve_entry(
    id: usize,
    name: &DomainName,
    resolver: &dyn Resolve,
    stats: &ResolverStats,
) -> ResultRecord {
    match name {
        DomainName::Valid(host) => match resolver.resolve(host) {
            Ok(addr) => {
                stats.record_resolved();
                ResultRecord::resolved(host.as_str(), addr)
            }
            Err(e) => {
                stats.record_failed();
                debug!(worker = id, name = e.name(), error = %e, "Lookup failed");
                ResultRecord::unresolved(host.as_str())
            }
        },
        DomainName::Oversized => {
            stats.record_skipped();
            ResultRecord::unresolved(name.as_str())
        }
    }
}

/// Main resolver loop
fn resolver_loop(
    id: usize,
    coordinator: &Coordinator,
    resolver: &dyn Resolve,
    log: &LogSink,
    stats: &ResolverStats,
) {
    info!(worker = id, "Resolver starting");
    let _guard = coordinator.abandon_on_panic();

    while let Some(name) = coordinator.consume() {
        let record = resolve_entry(id, &name, resolver, stats);

        if let Err(e) = log.append_line(&record.to_string()) {
            stats.record_log_error();
            warn!(worker = id, error = %e, "Failed to write resolver log");
        }
    }

    info!(
        worker = id,
        resolved = stats.resolved.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        "Resolver finished"
    );
}
