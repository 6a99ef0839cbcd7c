//! Configuration types for multi-lookup
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Maximum number of requester threads
pub const MAX_REQUESTERS: usize = 5;

/// Maximum number of resolver threads
pub const MAX_RESOLVERS: usize = 10;

/// Maximum number of input data files
pub const MAX_INPUT_FILES: usize = 10;

/// Default bounded buffer capacity
pub const DEFAULT_BUFFER_SIZE: usize = 5;

/// Default domain name length limit (bytes)
pub const DEFAULT_MAX_NAME_LENGTH: usize = 1025;

/// Resolve domain names from files with pools of requester and resolver threads
#[derive(Parser, Debug, Clone)]
#[command(
    name = "multi-lookup",
    version,
    about = "Resolve domain names from files with pools of requester and resolver threads",
    long_about = "Requester threads read domain names from the data files into a shared bounded buffer.\n\
                  Resolver threads drain the buffer, look up each name and write 'name,address'\n\
                  records to the resolver log. Every name read is also recorded in the requester log.",
    after_help = "EXAMPLES:\n    \
        multi-lookup 1 1 serviced.txt results.txt names1.txt names2.txt\n    \
        multi-lookup 5 10 serviced.txt results.txt input/*.txt -q\n    \
        multi-lookup 2 4 serviced.txt results.txt names.txt --buffer-size 1"
)]
pub struct CliArgs {
    /// Number of requester threads
    #[arg(value_name = "REQUESTERS")]
    pub requesters: usize,

    /// Number of resolver threads
    #[arg(value_name = "RESOLVERS")]
    pub resolvers: usize,

    /// Requester log (every name read)
    #[arg(value_name = "REQUESTER_LOG")]
    pub requester_log: PathBuf,

    /// Resolver log (name,address results)
    #[arg(value_name = "RESOLVER_LOG")]
    pub resolver_log: PathBuf,

    /// Data files containing one domain name per line
    #[arg(value_name = "DATA_FILE", required = true, num_args = 1..)]
    pub data_files: Vec<PathBuf>,

    /// Shared buffer capacity
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, value_name = "NUM")]
    pub buffer_size: usize,

    /// Names longer than this are replaced by a marker
    #[arg(long, default_value_t = DEFAULT_MAX_NAME_LENGTH, value_name = "BYTES")]
    pub max_name_length: usize,

    /// Append to existing logs instead of truncating them
    #[arg(long)]
    pub append: bool,

    /// Record an IPv6 address when a name has both families
    #[arg(long)]
    pub prefer_ipv6: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Number of requester threads
    pub requester_count: usize,

    /// Number of resolver threads
    pub resolver_count: usize,

    /// Input files, in order
    pub input_files: Vec<PathBuf>,

    /// Requester (audit) log path
    pub requester_log: PathBuf,

    /// Resolver (results) log path
    pub resolver_log: PathBuf,

    /// Bounded buffer capacity
    pub buffer_size: usize,

    /// Domain name length limit in bytes
    pub max_name_length: usize,

    /// Append to logs instead of truncating
    pub append_logs: bool,

    /// Prefer IPv6 answers from the system resolver
    pub prefer_ipv6: bool,

    /// Show progress indicator
    pub show_progress: bool,
}

impl LookupConfig {
    /// Build a configuration with default buffer and name limits
    ///
    /// The result is not validated; call [`LookupConfig::validate`] when the
    /// values come from outside the program.
    pub fn new(
        requester_count: usize,
        resolver_count: usize,
        input_files: Vec<PathBuf>,
        requester_log: impl Into<PathBuf>,
        resolver_log: impl Into<PathBuf>,
    ) -> Self {
        Self {
            requester_count,
            resolver_count,
            input_files,
            requester_log: requester_log.into(),
            resolver_log: resolver_log.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            append_logs: false,
            prefer_ipv6: false,
            show_progress: false,
        }
    }

    /// Set the buffer capacity
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the name length limit
    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let config = Self {
            requester_count: args.requesters,
            resolver_count: args.resolvers,
            input_files: args.data_files,
            requester_log: args.requester_log,
            resolver_log: args.resolver_log,
            buffer_size: args.buffer_size,
            max_name_length: args.max_name_length,
            append_logs: args.append,
            prefer_ipv6: args.prefer_ipv6,
            show_progress: !args.quiet,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check every limit the pipeline relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requester_count == 0 || self.requester_count > MAX_REQUESTERS {
            return Err(ConfigError::InvalidRequesterCount {
                count: self.requester_count,
                max: MAX_REQUESTERS,
            });
        }

        if self.resolver_count == 0 || self.resolver_count > MAX_RESOLVERS {
            return Err(ConfigError::InvalidResolverCount {
                count: self.resolver_count,
                max: MAX_RESOLVERS,
            });
        }

        if self.input_files.is_empty() || self.input_files.len() > MAX_INPUT_FILES {
            return Err(ConfigError::InvalidFileCount {
                count: self.input_files.len(),
                max: MAX_INPUT_FILES,
            });
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize {
                size: self.buffer_size,
            });
        }

        if self.max_name_length == 0 {
            return Err(ConfigError::InvalidMaxNameLength {
                length: self.max_name_length,
            });
        }

        validate_log_path("requester", &self.requester_log)?;
        validate_log_path("resolver", &self.resolver_log)?;

        Ok(())
    }
}

fn validate_log_path(log: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Err(ConfigError::InvalidLogPath {
            log,
            path: path.to_path_buf(),
            reason: "Path is a directory".to_string(),
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidLogPath {
                log,
                path: path.to_path_buf(),
                reason: format!("Parent directory '{}' does not exist", parent.display()),
            });
        }
    }

    Ok(())
}
