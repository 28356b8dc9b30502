//! BIND command handler

use super::reply::{send_failure, send_success};
use crate::error::{ReplyCode, Result, Socks5Error};
use crate::socks::relay::relay;
use crate::socks::SocksStream;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Handle TCP BIND command
///
/// Listens on `dest` and sends two replies: the first with the listening
/// address, the second with the address of the peer that connected. The
/// client connection is then relayed to that peer. Only one inbound
/// connection is accepted.
pub async fn handle_bind(stream: &mut dyn SocksStream, dest: SocketAddr) -> Result<()> {
    let listener = match TcpListener::bind(dest).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to listen on {}: {}", dest, e);
            return send_failure(stream, ReplyCode::GeneralFailure, e.into()).await;
        }
    };

    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => return send_failure(stream, ReplyCode::GeneralFailure, e.into()).await,
    };
    send_success(stream, local_addr).await?;
    debug!("BIND listening on {}", local_addr);

    let (mut peer, _) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(e) => {
            error!("BIND accept on {} failed: {}", local_addr, e);
            return send_failure(stream, ReplyCode::GeneralFailure, e.into()).await;
        }
    };
    drop(listener);

    let peer_addr = match peer.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            debug!("BIND peer address unavailable: {}", e);
            return send_failure(
                stream,
                ReplyCode::AddressTypeNotSupported,
                Socks5Error::AddressTypeNotSupported,
            )
            .await;
        }
    };
    send_success(stream, peer_addr).await?;

    info!("BIND on {} accepted {}", local_addr, peer_addr);

    let stats = relay(stream, &mut peer).await;
    debug!(
        "BIND tunnel with {} closed: {} bytes up, {} bytes down",
        peer_addr, stats.client_to_remote, stats.remote_to_client
    );
    Ok(())
}
