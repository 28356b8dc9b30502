//! CONNECT command handler

use super::reply::{send_failure, send_io_error, send_success};
use crate::error::{ReplyCode, Result};
use crate::socks::relay::relay;
use crate::socks::SocksStream;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Handle TCP CONNECT command
///
/// Dials `dest`, reports the outbound connection's local address to the
/// client and relays until both directions end. A dial failure is answered
/// with the reply code matching the error kind.
pub async fn handle_connect(stream: &mut dyn SocksStream, dest: SocketAddr) -> Result<()> {
    debug!("Connecting to target: {}", dest);

    let mut target = match TcpStream::connect(dest).await {
        Ok(target) => target,
        Err(e) => {
            error!("Failed to connect to {}: {}", dest, e);
            return send_io_error(stream, e).await;
        }
    };

    let local_addr = match target.local_addr() {
        Ok(addr) => addr,
        Err(e) => return send_failure(stream, ReplyCode::GeneralFailure, e.into()).await,
    };
    send_success(stream, local_addr).await?;

    info!("SOCKS5 tunnel established to {}", dest);

    let stats = relay(stream, &mut target).await;
    debug!(
        "Tunnel to {} closed: {} bytes up, {} bytes down",
        dest, stats.client_to_remote, stats.remote_to_client
    );
    Ok(())
}
