//! UDP ASSOCIATE command handler
//!
//! UDP relaying is not provided; the client always gets an answer.

use super::reply::send_command_not_supported;
use crate::error::Result;
use crate::socks::types::SocksCommand;
use crate::socks::SocksStream;
use std::net::SocketAddr;
use tracing::warn;

/// Handle UDP ASSOCIATE command by replying "command not supported"
pub async fn handle_associate(stream: &mut dyn SocksStream, dest: SocketAddr) -> Result<()> {
    warn!("UDP ASSOCIATE for {} rejected", dest);
    send_command_not_supported(stream, SocksCommand::UdpAssociate.to_byte()).await
}
