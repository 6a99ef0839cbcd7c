//! Lookup runner - orchestrates one complete run
//!
//! The runner is responsible for:
//! - Opening both logs and pre-scanning the data files
//! - Building the coordinator and spawning both pools
//! - Joining the pools once the input is drained
//! - Final statistics and log flushing

use crate::config::LookupConfig;
use crate::dns::{Resolve, SystemResolver};
use crate::error::Result;
use crate::pipeline::requester::{Requester, RequesterStats};
use crate::pipeline::resolver::{Resolver, ResolverStats};
use crate::pipeline::Coordinator;
use crate::progress::ProgressMonitor;
use crate::sink::LogSink;
use crate::source::WorkSource;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the progress bar is refreshed
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Data files given
    pub total_files: usize,

    /// Data files that could not be opened
    pub missing_files: usize,

    /// Data files read to the end, missing ones included
    pub files_completed: usize,

    /// Names found by the pre-scan
    pub total_names: u64,

    /// Names written into the buffer
    pub names_produced: u64,

    /// Names taken out of the buffer
    pub names_consumed: u64,

    /// Names resolved to an address
    pub resolved: u64,

    /// Names that failed to resolve
    pub failed: u64,

    /// Names replaced by the oversized marker
    pub oversized: u64,

    /// Failed log writes across both pools
    pub log_errors: u64,

    /// Workers that panicked
    pub panicked_workers: usize,

    /// Lines written to the requester log
    pub requester_lines: u64,

    /// Lines written to the resolver log
    pub resolver_lines: u64,

    /// Wall time of the run
    pub duration: Duration,
}

impl RunReport {
    /// Throughput over the whole run
    pub fn names_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.names_consumed as f64 / secs
        } else {
            0.0
        }
    }

    /// Every file drained and every produced name resolved or recorded
    pub fn is_complete(&self) -> bool {
        self.panicked_workers == 0
            && self.files_completed == self.total_files
            && self.names_consumed == self.names_produced
    }
}

/// Runs both pools over one set of data files
pub struct LookupRunner {
    /// Configuration
    config: LookupConfig,

    /// Name resolution backend
    resolver: Arc<dyn Resolve>,

    /// Audit log of every name read
    requester_log: Arc<LogSink>,

    /// `name,address` results
    resolver_log: Arc<LogSink>,

    /// Requester threads
    requesters: Vec<Requester>,

    /// Resolver threads
    resolvers: Vec<Resolver>,
}

impl LookupRunner {
    /// Create a runner that writes the configured log files and resolves
    /// through the operating system
    ///
    /// The configuration is validated before either log is opened, so a
    /// rejected configuration never truncates an existing log.
    pub fn new(config: LookupConfig) -> Result<Self> {
        config.validate()?;
        let requester_log = LogSink::create(&config.requester_log, config.append_logs)?;
        let resolver_log = LogSink::create(&config.resolver_log, config.append_logs)?;

        let resolver = Arc::new(SystemResolver::new().prefer_ipv6(config.prefer_ipv6));
        Ok(Self::with_parts(
            config,
            resolver,
            requester_log,
            resolver_log,
        ))
    }

    /// Create a runner from explicit parts
    ///
    /// The log paths in `config` are validated but not opened.
    pub fn with_parts(
        config: LookupConfig,
        resolver: Arc<dyn Resolve>,
        requester_log: LogSink,
        resolver_log: LogSink,
    ) -> Self {
        Self {
            config,
            resolver,
            requester_log: Arc::new(requester_log),
            resolver_log: Arc::new(resolver_log),
            requesters: Vec::new(),
            resolvers: Vec::new(),
        }
    }

    /// Run until every data file is drained and every name is resolved
    pub fn run(mut self) -> Result<RunReport> {
        self.config.validate()?;
        let start_time = Instant::now();

        info!(
            requesters = self.config.requester_count,
            resolvers = self.config.resolver_count,
            files = self.config.input_files.len(),
            capacity = self.config.buffer_size,
            "Starting lookup"
        );

        let source = WorkSource::prepare(&self.config.input_files, self.config.max_name_length);
        let total_files = source.total_files();
        let total_names = source.total_names();
        let missing_files = source.missing().len();

        debug!(
            files = total_files,
            missing = missing_files,
            names = total_names,
            "Pre-scan complete"
        );

        let coordinator = Arc::new(Coordinator::new(
            self.config.buffer_size,
            source.into_files(),
            total_files,
            total_names,
        ));

        let monitor = if self.config.show_progress {
            match ProgressMonitor::start(Arc::clone(&coordinator), PROGRESS_INTERVAL) {
                Ok(monitor) => Some(monitor),
                Err(e) => {
                    warn!(error = %e, "Failed to start progress display");
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = self.spawn_workers(&coordinator) {
            warn!(error = %e, "Startup failed, releasing started workers");
            coordinator.abandon();
            self.join_workers();
            if let Some(monitor) = monitor {
                monitor.stop();
            }
            return Err(e);
        }

        let (requester_stats, resolver_stats, panicked_workers) = self.join_workers();

        if let Some(monitor) = monitor {
            monitor.stop();
        }

        self.requester_log.flush()?;
        self.resolver_log.flush()?;

        let counters = coordinator.snapshot().counters;
        let duration = start_time.elapsed();

        let report = RunReport {
            total_files,
            missing_files,
            files_completed: counters.files_completed,
            total_names,
            names_produced: counters.names_produced,
            names_consumed: counters.names_consumed,
            resolved: sum(&resolver_stats, |s| s.resolved.load(Ordering::Relaxed)),
            failed: sum(&resolver_stats, |s| s.failed.load(Ordering::Relaxed)),
            oversized: sum(&requester_stats, |s| s.oversized.load(Ordering::Relaxed)),
            log_errors: sum(&requester_stats, |s| s.log_errors.load(Ordering::Relaxed))
                + sum(&resolver_stats, |s| s.log_errors.load(Ordering::Relaxed)),
            panicked_workers,
            requester_lines: self.requester_log.lines_written(),
            resolver_lines: self.resolver_log.lines_written(),
            duration,
        };

        if counters.names_produced != total_names {
            // A data file changed between the pre-scan and the read
            warn!(
                expected = total_names,
                produced = counters.names_produced,
                "Name count differs from pre-scan"
            );
        }

        info!(
            names = report.names_consumed,
            resolved = report.resolved,
            failed = report.failed,
            duration_secs = duration.as_secs_f64(),
            "Lookup completed"
        );

        Ok(report)
    }

    /// Spawn both pools
    fn spawn_workers(&mut self, coordinator: &Arc<Coordinator>) -> Result<()> {
        for id in 0..self.config.requester_count {
            let requester = Requester::spawn(
                id,
                Arc::clone(coordinator),
                Arc::clone(&self.requester_log),
                self.config.max_name_length,
            )?;
            self.requesters.push(requester);
        }

        for id in 0..self.config.resolver_count {
            let resolver = Resolver::spawn(
                id,
                Arc::clone(coordinator),
                Arc::clone(&self.resolver),
                Arc::clone(&self.resolver_log),
            )?;
            self.resolvers.push(resolver);
        }

        info!(
            requesters = self.requesters.len(),
            resolvers = self.resolvers.len(),
            "Workers spawned"
        );
        Ok(())
    }

    /// Join every started worker and collect their statistics
    ///
    /// Requesters are joined first; resolvers only finish once the last
    /// file is complete and the buffer is drained.
    fn join_workers(
        &mut self,
    ) -> (Vec<Arc<RequesterStats>>, Vec<Arc<ResolverStats>>, usize) {
        let mut panicked = 0;

        let requesters = std::mem::take(&mut self.requesters);
        let mut requester_stats = Vec::with_capacity(requesters.len());
        for worker in requesters {
            requester_stats.push(Arc::clone(worker.stats()));
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                panicked += 1;
            }
        }

        let resolvers = std::mem::take(&mut self.resolvers);
        let mut resolver_stats = Vec::with_capacity(resolvers.len());
        for worker in resolvers {
            resolver_stats.push(Arc::clone(worker.stats()));
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                panicked += 1;
            }
        }

        (requester_stats, resolver_stats, panicked)
    }
}

fn sum<S>(stats: &[Arc<S>], field: impl Fn(&S) -> u64) -> u64 {
    stats.iter().map(|s| field(s)).sum()
}

/// Run a lookup with the system resolver and the configured log files
pub fn run(config: LookupConfig) -> Result<RunReport> {
    LookupRunner::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::StaticResolver;
    use crate::error::{ConfigError, LookupError};
    use std::io::Write;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::{NamedTempFile, TempDir};

    fn data_file(names: &[&str]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        for name in names {
            writeln!(tmp, "{}", name).unwrap();
        }
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_report_rate() {
        let report = RunReport {
            names_consumed: 50,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(report.names_per_second(), 25.0);
        assert_eq!(RunReport::default().names_per_second(), 0.0);
    }

    #[test]
    fn test_run_writes_both_logs() {
        let input = data_file(&["a.com", "b.com", "c.com"]);
        let dir = TempDir::new().unwrap();
        let req_log = dir.path().join("serviced.txt");
        let res_log = dir.path().join("results.txt");

        let config = LookupConfig::new(
            2,
            3,
            vec![input.path().to_path_buf()],
            &req_log,
            &res_log,
        )
        .with_buffer_size(1);

        let resolver = StaticResolver::new().with_entry("a.com", IpAddr::V4(Ipv4Addr::LOCALHOST));
        let runner = LookupRunner::with_parts(
            config,
            Arc::new(resolver),
            LogSink::create(&req_log, false).unwrap(),
            LogSink::create(&res_log, false).unwrap(),
        );

        let report = runner.run().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.total_names, 3);
        assert_eq!(report.names_consumed, 3);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.failed, 2);
        // Three names plus one serviced line per requester
        assert_eq!(report.requester_lines, 5);
        assert_eq!(report.resolver_lines, 3);

        let results = std::fs::read_to_string(&res_log).unwrap();
        assert!(results.lines().any(|l| l == "a.com,127.0.0.1"));
        assert!(results.lines().any(|l| l == "b.com,"));
    }

    #[test]
    fn test_rejected_config_keeps_existing_logs() {
        let input = data_file(&["a.com"]);
        let dir = TempDir::new().unwrap();
        let req_log = dir.path().join("serviced.txt");
        let res_log = dir.path().join("results.txt");
        std::fs::write(&req_log, "earlier.com\n").unwrap();
        std::fs::write(&res_log, "earlier.com,10.0.0.1\n").unwrap();

        let config = LookupConfig::new(0, 1, vec![input.path().to_path_buf()], &req_log, &res_log);
        let err = run(config).unwrap_err();
        assert!(matches!(
            err,
            LookupError::Config(ConfigError::InvalidRequesterCount { count: 0, .. })
        ));

        assert_eq!(std::fs::read_to_string(&req_log).unwrap(), "earlier.com\n");
        assert_eq!(std::fs::read_to_string(&res_log).unwrap(), "earlier.com,10.0.0.1\n");
    }

    #[test]
    fn test_run_with_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = LookupConfig::new(
            1,
            1,
            vec![dir.path().join("does-not-exist.txt")],
            dir.path().join("req.txt"),
            dir.path().join("res.txt"),
        );

        let report = run(config).unwrap();
        assert_eq!(report.missing_files, 1);
        assert_eq!(report.files_completed, 1);
        assert_eq!(report.names_consumed, 0);
        assert_eq!(report.resolver_lines, 0);
        assert!(report.is_complete());
    }
}
