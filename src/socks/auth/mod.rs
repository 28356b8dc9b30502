//! SOCKS5 authentication module
//!
//! Handles method negotiation and dispatches to pluggable authenticators.

mod none;
mod password;

pub use none::NoAuth;
pub use password::{CredentialStore, PasswordAuth};

use super::message::{write_message, MethodReply, MethodRequest};
use super::SocksStream;
use crate::error::{Result, Socks5Error};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// A SOCKS5 authentication method.
///
/// `authenticate` runs the method-specific sub-exchange on the client
/// connection after the method reply has been sent.
#[async_trait]
pub trait Authenticator: Send + Sync + Debug {
    /// Method identifier advertised in the method reply
    fn method(&self) -> u8;

    /// Run the sub-negotiation; `Ok(())` lets the connection proceed
    async fn authenticate(&self, stream: &mut dyn SocksStream) -> Result<()>;
}

/// Method identifier to authenticator table shared by all connections.
///
/// Registration normally happens once at startup; lookups take a read
/// lock and clone the `Arc` out so no lock is held across an await.
#[derive(Debug, Default)]
pub struct AuthenticatorRegistry {
    authenticators: RwLock<HashMap<u8, Arc<dyn Authenticator>>>,
}

impl AuthenticatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticator under its method identifier.
    ///
    /// A later registration for the same identifier replaces the earlier one.
    pub fn register(&self, authenticator: Arc<dyn Authenticator>) {
        let method = authenticator.method();
        let mut table = self
            .authenticators
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if table.insert(method, authenticator).is_some() {
            debug!("Replaced authenticator for method {:#04x}", method);
        }
    }

    /// Look up the authenticator for a method
    pub fn get(&self, method: u8) -> Option<Arc<dyn Authenticator>> {
        self.authenticators
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&method)
            .cloned()
    }

    /// Registered method identifiers, in ascending order
    pub fn methods(&self) -> Vec<u8> {
        let mut methods: Vec<u8> = self
            .authenticators
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .copied()
            .collect();
        methods.sort_unstable();
        methods
    }

    /// First offered method that is registered, in client order
    pub fn select(&self, offered: &[u8]) -> Option<Arc<dyn Authenticator>> {
        offered.iter().find_map(|method| self.get(*method))
    }

    /// Answer the client's method request and run the chosen authenticator.
    ///
    /// With no registered method among the offered ones, replies 0xFF and
    /// fails with [`Socks5Error::NoAcceptableMethod`] without authenticating.
    pub async fn negotiate(
        &self,
        stream: &mut dyn SocksStream,
        request: &MethodRequest,
    ) -> Result<u8> {
        debug!("Client offered methods: {:?}", request.methods);

        let authenticator = match self.select(&request.methods) {
            Some(authenticator) => authenticator,
            None => {
                warn!("No acceptable method among {:?}", request.methods);
                write_message(stream, &MethodReply::not_acceptable()).await?;
                return Err(Socks5Error::NoAcceptableMethod);
            }
        };

        let method = authenticator.method();
        write_message(stream, &MethodReply::new(method)).await?;
        authenticator.authenticate(stream).await?;

        Ok(method)
    }
}
