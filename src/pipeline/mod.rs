//! The requester/resolver pipeline
//!
//! ```text
//!   data files ──► ┌────────────┐        ┌────────────────────┐        ┌────────────┐
//!                  │ Requester 0│──┐     │   Bounded Buffer   │     ┌──│ Resolver 0 │──┐
//!                  │ Requester 1│──┼────►│ (circular, cap C)  │────►┼──│ Resolver 1 │──┼──► resolver log
//!                  │ Requester N│──┘     │ mutex + 2 condvars │     └──│ Resolver M │──┘    (name,address)
//!                  └────────────┘        └────────────────────┘        └────────────┘
//!                        │
//!                        └──► requester log (every name read)
//! ```
//!
//! Requesters block only while the buffer is full, resolvers only while it
//! is empty and input remains. Every wait re-checks its predicate in a loop.

mod buffer;
mod coordinator;
mod requester;
mod resolver;
mod runner;

pub use buffer::BoundedBuffer;
pub use coordinator::{AbandonGuard, Coordinator, PipelineSnapshot, ProgressCounters};
pub use requester::{Requester, RequesterStats};
pub use resolver::{Resolver, ResolverStats, ResultRecord};
pub use runner::{run, LookupRunner, RunReport};
