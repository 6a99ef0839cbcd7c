//! Progress reporting for a lookup run
//!
//! Provides a live progress bar over the pre-scanned name count, refreshed
//! from coordinator snapshots by a small monitor thread.

use crate::pipeline::{Coordinator, PipelineSnapshot, RunReport};
use console::style;
use crossbeam_channel::{bounded, select, tick, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Progress bar over resolved names
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a reporter expecting `total_names` names
    pub fn new(total_names: u64) -> Self {
        let bar = ProgressBar::new(total_names);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(style);

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, snapshot: &PipelineSnapshot) {
        let counters = &snapshot.counters;

        self.bar.set_position(counters.names_consumed);

        let msg = format!(
            "Files: {}/{} | Buffer: {}/{} | Queued files: {}",
            counters.files_completed,
            counters.total_files,
            snapshot.occupied,
            snapshot.capacity,
            snapshot.pending_files,
        );
        self.bar.set_message(msg);
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Thread that refreshes a [`ProgressReporter`] on a fixed interval
pub struct ProgressMonitor {
    /// Dropping the sender stops the monitor
    done: Option<Sender<()>>,

    handle: Option<JoinHandle<()>>,
}

impl ProgressMonitor {
    /// Start refreshing from `coordinator` every `interval`
    pub fn start(coordinator: Arc<Coordinator>, interval: Duration) -> io::Result<Self> {
        let (done_tx, done_rx) = bounded::<()>(0);
        let reporter = ProgressReporter::new(coordinator.snapshot().counters.total_names);

        let handle = thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || {
                let ticker = tick(interval);

                loop {
                    select! {
                        recv(ticker) -> _ => reporter.update(&coordinator.snapshot()),
                        recv(done_rx) -> _ => break,
                    }
                }

                let snapshot = coordinator.snapshot();
                reporter.update(&snapshot);
                if snapshot.counters.is_globally_done() {
                    reporter.finish("Lookup completed");
                } else {
                    reporter.finish("Lookup stopped");
                }
            })?;

        Ok(Self {
            done: Some(done_tx),
            handle: Some(handle),
        })
    }

    /// Stop the monitor and draw the final state
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.done.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the run
pub fn print_summary(report: &RunReport, requester_log: &Path, resolver_log: &Path) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    if report.is_complete() {
        println!("{}", style("Lookup Complete").green().bold());
    } else {
        println!("{}", style("Lookup Incomplete").red().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} of {}",
        style("Files:").bold(),
        report.total_files - report.missing_files,
        report.total_files
    );
    println!("  {} {}", style("Names:").bold(), format_number(report.names_consumed));
    println!("  {} {}", style("Resolved:").bold(), format_number(report.resolved));
    if report.failed > 0 {
        println!(
            "  {} {}",
            style("Unresolved:").yellow().bold(),
            format_number(report.failed)
        );
    }
    if report.oversized > 0 {
        println!(
            "  {} {}",
            style("Oversized:").yellow().bold(),
            format_number(report.oversized)
        );
    }
    if report.missing_files > 0 {
        println!(
            "  {} {}",
            style("Missing files:").yellow().bold(),
            report.missing_files
        );
    }
    if report.log_errors > 0 {
        println!(
            "  {} {}",
            style("Log errors:").red().bold(),
            format_number(report.log_errors)
        );
    }
    println!(
        "  {} {:.1}s ({:.0} names/sec)",
        style("Duration:").bold(),
        duration_secs,
        report.names_per_second()
    );
    println!(
        "  {} {} ({} lines)",
        style("Requester log:").bold(),
        requester_log.display(),
        format_number(report.requester_lines)
    );
    println!(
        "  {} {} ({} lines)",
        style("Resolver log:").bold(),
        resolver_log.display(),
        format_number(report.resolver_lines)
    );
    println!();
}

/// Print a header at the start of the run
pub fn print_header(requesters: usize, resolvers: usize, files: usize, buffer_size: usize) {
    println!();
    println!(
        "{} {}",
        style("multi-lookup").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Requesters:").bold(), requesters);
    println!("  {} {}", style("Resolvers:").bold(), resolvers);
    println!("  {} {}", style("Data files:").bold(), files);
    println!("  {} {}", style("Buffer:").bold(), buffer_size);
    println!();
}
