//! # socks5d - SOCKS5 proxy server
//!
//! socks5d implements the server side of the SOCKS5 protocol (RFC 1928)
//! with username/password authentication (RFC 1929). Authentication
//! methods and the domain resolver are pluggable.
//!
//! ## Features
//!
//! - **Method Negotiation**: the client's first offered method that is registered wins
//! - **Pluggable Authentication**: no-auth and username/password out of the box
//! - **CONNECT and BIND**: outbound tunnels and single inbound connections
//! - **Bidirectional Relay**: both directions run until each reaches EOF
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socks5d::config::load_config;
//! use socks5d::server::Server;
//! use tokio::net::TcpListener;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let server = Server::from_config(&config)?;
//!     let listener = TcpListener::bind(config.server.socket_addr().map_err(anyhow::Error::msg)?).await?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     server.run(listener, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! accept -> method negotiation -> authenticator -> command dispatcher -> relay
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod resolve;
pub mod server;
pub mod socks;
pub mod store;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ReplyCode, Result, Socks5Error};
pub use resolve::{Resolver, SystemResolver};
pub use server::Server;
pub use store::MemoryStore;

/// Version of the socks5d library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
