//! multi-lookup - Concurrent Domain Name Resolver
//!
//! Reads domain names from a set of data files with a pool of requester
//! threads, hands them through a shared bounded buffer to a pool of resolver
//! threads, and writes one `name,address` record per name.
//!
//! # Features
//!
//! - **Bounded Buffer**: A fixed-capacity circular buffer guarded by one
//!   mutex and two condition variables. Producers block only while it is
//!   full, consumers only while it is empty and input remains.
//!
//! - **Exact Termination**: Names are counted before any worker starts, so
//!   every pool exits once the last file is drained and the buffer is empty.
//!   No name is lost or processed twice.
//!
//! - **Two Logs**: The requester log records every name read plus one
//!   `Thread <id> serviced <n> files` line per requester. The resolver log
//!   holds the results.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Data Files                           │
//! │             (one domain name per line, ≤ 10 files)           │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │  pre-scan, then claim per file
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Requester 0   Requester 1   ...   Requester N (≤ 5)        │──► requester log
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!                 ┌──────────────────────────────┐
//!                 │        Bounded Buffer        │
//!                 │  mutex + not_full/not_empty  │
//!                 └──────────────┬───────────────┘
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Resolver 0    Resolver 1    ...   Resolver M (≤ 10)        │──► resolver log
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # One requester, one resolver
//! multi-lookup 1 1 serviced.txt results.txt names1.txt names2.txt
//!
//! # Full pools, no progress bar
//! multi-lookup 5 10 serviced.txt results.txt input/*.txt -q
//! ```

pub mod config;
pub mod dns;
pub mod error;
pub mod paging;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod source;

pub use config::{CliArgs, LookupConfig};
pub use error::{LookupError, Result};
pub use pipeline::{run, LookupRunner, RunReport};
