//! SOCKS5 protocol engine
//!
//! Method negotiation, authentication, command dispatch and relay for a
//! single client connection. The engine works on any byte stream; the
//! [`Server`](crate::server::Server) feeds it accepted TCP connections.

pub mod auth;
pub mod command;
pub mod consts;
pub mod message;
pub mod relay;
pub mod types;

pub use auth::{Authenticator, AuthenticatorRegistry, CredentialStore, NoAuth, PasswordAuth};
pub use command::CommandDispatcher;
pub use message::{
    write_message, AuthReply, CommandReply, CommandRequest, Encode, MethodReply, MethodRequest,
    UserPasswordRequest,
};
pub use relay::{relay, RelayStats};
pub use types::{Address, SocksCommand};

use tokio::io::{AsyncRead, AsyncWrite};

/// A client connection as seen by the protocol engine.
///
/// Authenticators and command handlers take `&mut dyn SocksStream` so
/// they stay object safe and independent of the transport.
pub trait SocksStream: AsyncRead + AsyncWrite + Unpin + Send {}

/// Blanket implementation: any type implementing the required traits is a SocksStream.
impl<T: AsyncRead + AsyncWrite + Unpin + Send + ?Sized> SocksStream for T {}
