//! Name resolution
//!
//! The pipeline treats resolution as an opaque blocking call behind the
//! [`Resolve`] trait. Resolver workers call it without holding any pipeline
//! lock, so a slow lookup only ever stalls the thread that made it.
//!
//! # Example
//!
//! ```no_run
//! use multi_lookup::dns::{Resolve, SystemResolver};
//!
//! let resolver = SystemResolver::new();
//! match resolver.resolve("example.com") {
//!     Ok(addr) => println!("example.com,{}", addr),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod resolver;

pub use resolver::{StaticResolver, SystemResolver};

use crate::error::ResolveResult;
use std::net::IpAddr;

/// A blocking name-to-address lookup
pub trait Resolve: Send + Sync {
    /// Resolve `name` to a single address
    fn resolve(&self, name: &str) -> ResolveResult<IpAddr>;
}
