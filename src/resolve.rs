//! Domain name resolution
//!
//! The command dispatcher hands domain destinations to a [`Resolver`]
//! before any handler runs.

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::{IpAddr, SocketAddr};

/// Turns a host name into an IP address.
#[async_trait]
pub trait Resolver: Send + Sync + Debug {
    /// Resolve `name` to a single address
    async fn resolve(&self, name: &str) -> io::Result<IpAddr>;
}

/// Pick the address to dial from a lookup answer.
///
/// The first IPv4 address wins; otherwise the first address of any family.
pub fn select_address(addrs: &[SocketAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .map(|addr| addr.ip())
}

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver
    pub fn new() -> Self {
        SystemResolver
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> io::Result<IpAddr> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name, 0)).await?.collect();
        select_address(&addrs).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", name),
            )
        })
    }
}
