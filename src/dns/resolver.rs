//! Resolver implementations
//!
//! - [`SystemResolver`] asks the platform resolver (getaddrinfo through
//!   `ToSocketAddrs`) and prefers an IPv4 answer when there is one
//! - [`StaticResolver`] answers from a fixed table, for tests and benches

use crate::dns::Resolve;
use crate::error::{ResolveError, ResolveResult};
use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::trace;

/// Resolver backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver {
    /// Return an IPv6 answer even when an IPv4 one exists
    prefer_ipv6: bool,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer IPv6 answers over IPv4
    pub fn prefer_ipv6(mut self, prefer: bool) -> Self {
        self.prefer_ipv6 = prefer;
        self
    }
}

/// Pick one address, honoring the family preference
fn pick_address(addrs: impl IntoIterator<Item = IpAddr>, prefer_ipv6: bool) -> Option<IpAddr> {
    let mut fallback = None;

    for addr in addrs {
        if addr.is_ipv6() == prefer_ipv6 {
            return Some(addr);
        }
        fallback.get_or_insert(addr);
    }

    fallback
}

impl Resolve for SystemResolver {
    fn resolve(&self, name: &str) -> ResolveResult<IpAddr> {
        // Port is required by ToSocketAddrs and ignored
        let addrs = (name, 0u16)
            .to_socket_addrs()
            .map_err(|e| ResolveError::Lookup {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let addr = pick_address(addrs.map(|sa| sa.ip()), self.prefer_ipv6).ok_or_else(|| {
            ResolveError::NoAddress {
                name: name.to_string(),
            }
        })?;

        trace!(name = %name, addr = %addr, "Resolved");
        Ok(addr)
    }
}

/// Resolver that answers from a fixed table
///
/// Names not in the table fail with [`ResolveError::NoAddress`]. An optional
/// per-lookup delay stands in for network latency.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, IpAddr>,
    delay: Option<Duration>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name to the table
    pub fn with_entry(mut self, name: impl Into<String>, addr: IpAddr) -> Self {
        self.table.insert(name.into(), addr);
        self
    }

    /// Sleep this long on every lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of names in the table
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, IpAddr)> for StaticResolver {
    fn from_iter<I: IntoIterator<Item = (S, IpAddr)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().map(|(name, addr)| (name.into(), addr)).collect(),
            delay: None,
        }
    }
}

impl Resolve for StaticResolver {
    fn resolve(&self, name: &str) -> ResolveResult<IpAddr> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        self.table
            .get(name)
            .copied()
            .ok_or_else(|| ResolveError::NoAddress {
                name: name.to_string(),
            })
    }
}
