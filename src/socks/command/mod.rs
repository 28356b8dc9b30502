//! SOCKS5 command dispatch
//!
//! Reads the command request, resolves domain destinations and routes the
//! request to the CONNECT, BIND or ASSOCIATE handler.

mod associate;
mod bind;
mod connect;
mod reply;

pub use associate::handle_associate;
pub use bind::handle_bind;
pub use connect::handle_connect;
pub use reply::{send_failure, send_io_error, send_reply, send_success};

use crate::error::{ReplyCode, Result, Socks5Error};
use crate::resolve::Resolver;
use crate::socks::message::CommandRequest;
use crate::socks::types::{Address, SocksCommand};
use crate::socks::SocksStream;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes authenticated connections to command handlers
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    resolver: Arc<dyn Resolver>,
}

impl CommandDispatcher {
    /// Create a dispatcher that resolves domains with `resolver`
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        CommandDispatcher { resolver }
    }

    /// Resolve a domain destination to an IP destination.
    ///
    /// IP destinations are returned unchanged.
    pub async fn resolve(&self, dest: Address) -> Result<SocketAddr> {
        match dest {
            Address::Ip(addr) => Ok(addr),
            Address::Domain(name, port) => {
                let ip = self
                    .resolver
                    .resolve(&name)
                    .await
                    .map_err(|source| Socks5Error::Resolve { name, source })?;
                Ok(SocketAddr::new(ip, port))
            }
        }
    }

    /// Handle one command request on an authenticated connection.
    ///
    /// Returns once the command's relay has finished, or with the error
    /// that ended the connection.
    pub async fn process(&self, stream: &mut dyn SocksStream) -> Result<()> {
        let request = CommandRequest::read_from(stream).await?;
        debug!("Command {:#04x} to {}", request.command, request.dest);

        let dest = match self.resolve(request.dest).await {
            Ok(dest) => dest,
            Err(e) => {
                warn!("{}", e);
                return send_failure(stream, ReplyCode::HostUnreachable, e).await;
            }
        };

        self.handle_command(stream, request.command, dest).await
    }

    /// Run the handler for `command` against a resolved destination
    pub async fn handle_command(
        &self,
        stream: &mut dyn SocksStream,
        command: u8,
        dest: SocketAddr,
    ) -> Result<()> {
        match SocksCommand::from_byte(command) {
            Some(SocksCommand::Connect) => handle_connect(stream, dest).await,
            Some(SocksCommand::Bind) => handle_bind(stream, dest).await,
            Some(SocksCommand::UdpAssociate) => handle_associate(stream, dest).await,
            None => {
                warn!("Unknown command {:#04x}", command);
                reply::send_command_not_supported(stream, command).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::consts::*;
    use crate::socks::message::{CommandReply, Encode};
    use async_trait::async_trait;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::AsyncWriteExt;

    #[derive(Debug)]
    struct StaticResolver(Option<IpAddr>);

    #[async_trait]
    impl Resolver for StaticResolver {
        async fn resolve(&self, name: &str) -> io::Result<IpAddr> {
            self.0.ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("unknown host {}", name))
            })
        }
    }

    fn dispatcher(answer: Option<IpAddr>) -> CommandDispatcher {
        CommandDispatcher::new(Arc::new(StaticResolver(answer)))
    }

    #[tokio::test]
    async fn test_resolve_ip_passthrough() {
        let addr: SocketAddr = "192.0.2.1:80".parse().unwrap();
        let resolved = dispatcher(None).resolve(Address::Ip(addr)).await.unwrap();
        assert_eq!(resolved, addr);
    }

    #[tokio::test]
    async fn test_resolve_domain() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3));
        let resolved = dispatcher(Some(ip))
            .resolve(Address::domain("example.com", 8080))
            .await
            .unwrap();
        assert_eq!(resolved, SocketAddr::new(ip, 8080));
    }

    #[tokio::test]
    async fn test_resolver_failure_replies_host_unreachable() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let request = CommandRequest::new(SOCKS5_CMD_TCP_CONNECT, Address::domain("nowhere", 80));
        client.write_all(&request.to_bytes()).await.unwrap();

        let err = dispatcher(None).process(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Resolve { ref name, .. } if name == "nowhere"));

        let reply = CommandReply::read_from(&mut client).await.unwrap();
        assert_eq!(reply.reply, ReplyCode::HostUnreachable);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let request = CommandRequest::new(0x7F, Address::ipv4(Ipv4Addr::LOCALHOST, 80));
        client.write_all(&request.to_bytes()).await.unwrap();

        let err = dispatcher(None).process(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::CommandNotSupported(0x7F)));

        let reply = CommandReply::read_from(&mut client).await.unwrap();
        assert_eq!(reply.reply, ReplyCode::CommandNotSupported);
        assert_eq!(reply.bind, Address::unspecified());
    }

    #[tokio::test]
    async fn test_associate_not_supported() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let request = CommandRequest::new(
            SOCKS5_CMD_UDP_ASSOCIATE,
            Address::ipv4(Ipv4Addr::UNSPECIFIED, 0),
        );
        client.write_all(&request.to_bytes()).await.unwrap();

        let err = dispatcher(None).process(&mut server).await.unwrap_err();
        assert!(matches!(
            err,
            Socks5Error::CommandNotSupported(SOCKS5_CMD_UDP_ASSOCIATE)
        ));

        let reply = CommandReply::read_from(&mut client).await.unwrap();
        assert_eq!(reply.reply, ReplyCode::CommandNotSupported);
    }

    #[tokio::test]
    async fn test_bad_request_version_is_fatal_without_reply() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&[0x04, SOCKS5_CMD_TCP_CONNECT, 0x00])
            .await
            .unwrap();
        drop(client);

        let err = dispatcher(None).process(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedVersion(0x04)));
    }
}
