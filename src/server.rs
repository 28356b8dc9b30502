//! SOCKS5 server
//!
//! Accepts TCP clients and supervises each connection through method
//! negotiation, authentication and command dispatch.

use crate::config::{AuthConfig, Config};
use crate::error::Result;
use crate::resolve::SystemResolver;
use crate::socks::{
    AuthenticatorRegistry, CommandDispatcher, CredentialStore, MethodRequest, NoAuth,
    PasswordAuth, SocksStream,
};
use crate::store::MemoryStore;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Build the authenticator table described by `auth`.
///
/// Configured users are loaded into a fresh [`MemoryStore`].
pub fn build_registry(auth: &AuthConfig) -> Result<AuthenticatorRegistry> {
    let registry = AuthenticatorRegistry::new();

    if auth.no_auth {
        registry.register(Arc::new(NoAuth));
    }

    if auth.has_users() {
        let store = Arc::new(MemoryStore::new());
        for user in &auth.users {
            store.create(&user.username, &user.password)?;
        }
        info!("Loaded {} user(s) for password authentication", store.len());
        registry.register(Arc::new(PasswordAuth::new(store)));
    }

    Ok(registry)
}

/// The SOCKS5 server
#[derive(Debug, Clone)]
pub struct Server {
    registry: Arc<AuthenticatorRegistry>,
    dispatcher: Arc<CommandDispatcher>,
}

impl Server {
    /// Create a server from an authenticator table and a command dispatcher
    pub fn new(registry: Arc<AuthenticatorRegistry>, dispatcher: CommandDispatcher) -> Self {
        Server {
            registry,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Create a server with the configured methods and the system resolver
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = build_registry(&config.auth)?;
        let dispatcher = CommandDispatcher::new(Arc::new(SystemResolver::new()));
        Ok(Server::new(Arc::new(registry), dispatcher))
    }

    /// Serve one client connection to completion.
    ///
    /// The stream is dropped, and so closed, on every return path.
    pub async fn serve_conn<S>(&self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let stream: &mut dyn SocksStream = &mut stream;

        let request = MethodRequest::read_from(stream).await?;
        let method = self.registry.negotiate(stream, &request).await?;
        debug!("Authenticated with method {:#04x}", method);

        self.dispatcher.process(stream).await
    }

    /// Accept connections on `listener` until shutdown.
    ///
    /// Each connection runs on its own task. An accept error stops the loop
    /// and is returned.
    pub async fn run(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<bool>,
    ) -> Result<()> {
        match listener.local_addr() {
            Ok(addr) => info!("SOCKS5 server listening on {}", addr),
            Err(e) => warn!("Listener address unavailable: {}", e),
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (conn, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            return Err(e.into());
                        }
                    };

                    let server = self.clone();
                    let span = info_span!("conn", id = %connection_id(), %peer);
                    tokio::spawn(
                        async move {
                            debug!("Accepted connection");
                            match server.serve_conn(conn).await {
                                Ok(()) => debug!("Connection closed"),
                                Err(e) => warn!("Connection error: {}", e),
                            }
                        }
                        .instrument(span),
                    );
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Random per-connection tag for log correlation
fn connection_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}
