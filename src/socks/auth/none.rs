//! No authentication handler
//!
//! Handles the case when no authentication is required.

use super::Authenticator;
use crate::error::Result;
use crate::socks::consts::SOCKS5_AUTH_METHOD_NONE;
use crate::socks::SocksStream;
use async_trait::async_trait;

/// No authentication handler
///
/// Accepts every client; there is no sub-negotiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    fn method(&self) -> u8 {
        SOCKS5_AUTH_METHOD_NONE
    }

    async fn authenticate(&self, _stream: &mut dyn SocksStream) -> Result<()> {
        Ok(())
    }
}
