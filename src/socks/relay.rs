//! Bidirectional TCP relay
//!
//! Copies bytes between the client connection and the remote peer until
//! both directions have finished.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Copy buffer size per direction
const RELAY_BUFFER_SIZE: usize = 8 * 1024;

/// Bytes moved in each direction by a finished relay.
///
/// A direction that ends with an error still reports what it delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes copied from the client to the remote peer
    pub client_to_remote: u64,
    /// Bytes copied from the remote peer to the client
    pub remote_to_client: u64,
}

/// Copy one direction; on EOF the destination's write half is shut down.
///
/// Errors end this direction only and are logged. Returns the bytes
/// written to `writer`.
async fn pipe<R, W>(mut reader: R, mut writer: W, direction: &'static str) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!("{} read error after {} bytes: {}", direction, total, e);
                return total;
            }
        };
        if let Err(e) = writer.write_all(&buf[..n]).await {
            debug!("{} write error after {} bytes: {}", direction, total, e);
            return total;
        }
        total += n as u64;
    }

    debug!("{} finished: {} bytes", direction, total);
    if let Err(e) = writer.shutdown().await {
        debug!("{} shutdown error: {}", direction, e);
    }
    total
}

/// Relay data between `client` and `remote` in both directions.
///
/// The two copies run concurrently and the call returns only after both
/// have ended. A direction that reaches EOF half-closes its destination,
/// so the opposite direction keeps flowing until its own source closes.
pub async fn relay<A, B>(client: A, remote: B) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (remote_read, remote_write) = tokio::io::split(remote);

    let (client_to_remote, remote_to_client) = tokio::join!(
        pipe(client_read, remote_write, "client->remote"),
        pipe(remote_read, client_write, "remote->client"),
    );

    RelayStats {
        client_to_remote,
        remote_to_client,
    }
}
