//! SOCKS5 reply builder
//!
//! Sends command replies and translates handler failures into reply codes.

use crate::error::{ReplyCode, Result, Socks5Error};
use crate::socks::message::{write_message, CommandReply};
use crate::socks::types::Address;
use crate::socks::SocksStream;
use std::io;
use std::net::SocketAddr;
use tracing::debug;

/// Build and send a SOCKS5 reply
pub async fn send_reply(
    stream: &mut dyn SocksStream,
    reply_code: ReplyCode,
    bind_addr: Address,
) -> Result<()> {
    write_message(stream, &CommandReply::new(reply_code, bind_addr)).await
}

/// Send a success reply carrying `bind_addr`
pub async fn send_success(stream: &mut dyn SocksStream, bind_addr: SocketAddr) -> Result<()> {
    send_reply(
        stream,
        ReplyCode::Succeeded,
        Address::from_socket_addr(bind_addr),
    )
    .await
}

/// Send a failure reply with the zero address, then fail with `cause`.
///
/// A write error on the reply is logged; `cause` is still what is returned.
pub async fn send_failure(
    stream: &mut dyn SocksStream,
    reply_code: ReplyCode,
    cause: Socks5Error,
) -> Result<()> {
    if let Err(e) = send_reply(stream, reply_code, Address::unspecified()).await {
        debug!("Failed to send {} reply: {}", reply_code, e);
    }
    Err(cause)
}

/// Send the reply code matching an IO error, then fail with it
pub async fn send_io_error(stream: &mut dyn SocksStream, error: io::Error) -> Result<()> {
    let reply_code = ReplyCode::from(&error);
    send_failure(stream, reply_code, error.into()).await
}

/// Answer an unknown or unimplemented command
pub async fn send_command_not_supported(stream: &mut dyn SocksStream, command: u8) -> Result<()> {
    send_failure(
        stream,
        ReplyCode::CommandNotSupported,
        Socks5Error::CommandNotSupported(command),
    )
    .await
}
