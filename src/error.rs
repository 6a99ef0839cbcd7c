//! Error types for multi-lookup
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Log sink errors
//! - Name resolution errors
//! - Worker thread errors
//!
//! Only startup failures are fatal. Everything that can go wrong once the
//! pools are running (missing input files, oversized names, failed lookups,
//! log write failures) is logged and counted, never propagated.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for multi-lookup
#[derive(Error, Debug)]
pub enum LookupError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Log sink errors
    #[error("Log error: {0}")]
    Sink(#[from] SinkError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (flushing logs, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid requester count
    #[error("Invalid requester count {count}: must be between 1 and {max}")]
    InvalidRequesterCount { count: usize, max: usize },

    /// Invalid resolver count
    #[error("Invalid resolver count {count}: must be between 1 and {max}")]
    InvalidResolverCount { count: usize, max: usize },

    /// Wrong number of input files
    #[error("Invalid number of data files {count}: must be between 1 and {max}")]
    InvalidFileCount { count: usize, max: usize },

    /// Buffer capacity of zero
    #[error("Invalid buffer size {size}: must be at least 1")]
    InvalidBufferSize { size: usize },

    /// Name length limit of zero
    #[error("Invalid maximum name length {length}: must be at least 1")]
    InvalidMaxNameLength { length: usize },

    /// Log path error
    #[error("Invalid {log} log path '{path}': {reason}")]
    InvalidLogPath {
        log: &'static str,
        path: PathBuf,
        reason: String,
    },
}

/// Log sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Failed to open the log file
    #[error("Failed to open log '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Name resolution errors
///
/// These are never fatal: the resolver pool writes an empty address field
/// and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Lookup succeeded but returned no addresses
    #[error("No address found for '{name}'")]
    NoAddress { name: String },

    /// Lookup failed
    #[error("Lookup of '{name}' failed: {reason}")]
    Lookup { name: String, reason: String },
}

impl ResolveError {
    /// The name that failed to resolve
    pub fn name(&self) -> &str {
        match self {
            ResolveError::NoAddress { name } => name,
            ResolveError::Lookup { name, .. } => name,
        }
    }
}

/// Which pool a worker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Requester,
    Resolver,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Requester => f.write_str("requester"),
            WorkerRole::Resolver => f.write_str("resolver"),
        }
    }
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread could not be spawned
    #[error("Failed to spawn {role} {id}: {reason}")]
    SpawnFailed {
        role: WorkerRole,
        id: usize,
        reason: String,
    },

    /// Worker panicked
    #[error("{role} {id} panicked")]
    Panicked { role: WorkerRole, id: usize },
}

/// Result type alias for LookupError
pub type Result<T> = std::result::Result<T, LookupError>;

/// Result type alias for ResolveError
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
