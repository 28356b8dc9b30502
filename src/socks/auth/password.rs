//! Username/password authentication handler
//!
//! Runs the username/password sub-negotiation and checks the credentials
//! against an external [`CredentialStore`].

use super::Authenticator;
use crate::error::{Result, Socks5Error};
use crate::socks::consts::SOCKS5_AUTH_METHOD_PASSWORD;
use crate::socks::message::{write_message, AuthReply, UserPasswordRequest};
use crate::socks::SocksStream;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Backing store for username/password credentials.
///
/// The authenticator only calls [`validate`](CredentialStore::validate);
/// the other operations are administrative.
pub trait CredentialStore: Send + Sync {
    /// Add a new user
    fn create(&self, username: &str, password: &str) -> Result<()>;

    /// Replace an existing user's password
    fn update(&self, username: &str, password: &str) -> Result<()>;

    /// Remove a user
    fn delete(&self, username: &str) -> Result<()>;

    /// Check a username/password pair; unknown users are `Ok(false)`
    fn validate(&self, username: &str, password: &str) -> Result<bool>;
}

/// Username/password authentication handler
#[derive(Clone)]
pub struct PasswordAuth {
    store: Arc<dyn CredentialStore>,
}

impl PasswordAuth {
    /// Create an authenticator backed by `store`
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        PasswordAuth { store }
    }

    /// Add a user to the backing store
    pub fn create(&self, username: &str, password: &str) -> Result<()> {
        self.store.create(username, password)
    }

    /// Change a user's password in the backing store
    pub fn update(&self, username: &str, password: &str) -> Result<()> {
        self.store.update(username, password)
    }

    /// Remove a user from the backing store
    pub fn delete(&self, username: &str) -> Result<()> {
        self.store.delete(username)
    }

    /// Check credentials against the backing store
    pub fn validate(&self, username: &str, password: &str) -> Result<bool> {
        self.store.validate(username, password)
    }
}

impl fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAuth").finish_non_exhaustive()
    }
}

/// Send the failure status; `cause` is what the caller sees.
async fn reject(stream: &mut dyn SocksStream, cause: Socks5Error) -> Result<()> {
    if let Err(e) = write_message(stream, &AuthReply::failure()).await {
        debug!("Failed to send auth failure reply: {}", e);
    }
    Err(cause)
}

#[async_trait]
impl Authenticator for PasswordAuth {
    fn method(&self) -> u8 {
        SOCKS5_AUTH_METHOD_PASSWORD
    }

    /// Perform username/password authentication
    ///
    /// Client sends:
    /// ```text
    /// +----+------+----------+------+----------+
    /// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    /// +----+------+----------+------+----------+
    /// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    /// +----+------+----------+------+----------+
    /// ```
    ///
    /// Server responds:
    /// ```text
    /// +----+--------+
    /// |VER | STATUS |
    /// +----+--------+
    /// | 1  |   1    |
    /// +----+--------+
    /// ```
    async fn authenticate(&self, stream: &mut dyn SocksStream) -> Result<()> {
        let request = match UserPasswordRequest::read_from(stream).await {
            Ok(request) => request,
            Err(e) => return reject(stream, e).await,
        };

        match self.store.validate(&request.username, &request.password) {
            Ok(true) => {
                write_message(stream, &AuthReply::success()).await?;
                debug!("Authentication successful for user: {}", request.username);
                Ok(())
            }
            Ok(false) => {
                warn!("Authentication failed for user: {}", request.username);
                reject(stream, Socks5Error::InvalidCredentials).await
            }
            Err(e) => {
                warn!("Credential store error for user {}: {}", request.username, e);
                reject(stream, e).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::consts::*;
    use crate::store::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_auth_request(username: &str, password: &str) -> Vec<u8> {
        let mut request = Vec::new();
        request.push(SOCKS5_AUTH_VERSION);
        request.push(username.len() as u8);
        request.extend_from_slice(username.as_bytes());
        request.push(password.len() as u8);
        request.extend_from_slice(password.as_bytes());
        request
    }

    fn test_auth() -> PasswordAuth {
        let store = Arc::new(MemoryStore::new());
        store.create("test", "SecAbc@123").unwrap();
        PasswordAuth::new(store)
    }

    #[derive(Debug)]
    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn create(&self, _: &str, _: &str) -> Result<()> {
            Err(Socks5Error::Store("read only".to_string()))
        }
        fn update(&self, _: &str, _: &str) -> Result<()> {
            Err(Socks5Error::Store("read only".to_string()))
        }
        fn delete(&self, _: &str) -> Result<()> {
            Err(Socks5Error::Store("read only".to_string()))
        }
        fn validate(&self, _: &str, _: &str) -> Result<bool> {
            Err(Socks5Error::Store("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&create_auth_request("test", "SecAbc@123"))
            .await
            .unwrap();

        let result = test_auth().authenticate(&mut server).await;
        assert!(result.is_ok());

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [SOCKS5_AUTH_VERSION, SOCKS5_AUTH_SUCCESS]);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&create_auth_request("test", "wrongpass"))
            .await
            .unwrap();

        let err = test_auth().authenticate(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidCredentials));

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [SOCKS5_AUTH_VERSION, SOCKS5_AUTH_FAILURE]);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&create_auth_request("nobody", "SecAbc@123"))
            .await
            .unwrap();

        let err = test_auth().authenticate(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_version() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let mut request = create_auth_request("test", "SecAbc@123");
        request[0] = 0x01;
        client.write_all(&request).await.unwrap();

        let err = test_auth().authenticate(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::UnsupportedVersion(0x01)));

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], SOCKS5_AUTH_FAILURE);
    }

    #[tokio::test]
    async fn test_authenticate_store_error() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&create_auth_request("user", "pass"))
            .await
            .unwrap();

        let auth = PasswordAuth::new(Arc::new(BrokenStore));
        let err = auth.authenticate(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Store(_)));

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], SOCKS5_AUTH_FAILURE);
    }

    #[tokio::test]
    async fn test_authenticate_truncated_request() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client
            .write_all(&[SOCKS5_AUTH_VERSION, 4, b'u'])
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let err = test_auth().authenticate(&mut server).await.unwrap_err();
        assert!(matches!(err, Socks5Error::Io(_)));
    }

    #[test]
    fn test_management_operations_forward_to_store() {
        let auth = test_auth();
        auth.create("alice", "one").unwrap();
        assert!(auth.validate("alice", "one").unwrap());

        auth.update("alice", "two").unwrap();
        assert!(!auth.validate("alice", "one").unwrap());
        assert!(auth.validate("alice", "two").unwrap());

        auth.delete("alice").unwrap();
        assert!(!auth.validate("alice", "two").unwrap());
    }

    #[test]
    fn test_password_auth_method() {
        assert_eq!(test_auth().method(), SOCKS5_AUTH_METHOD_PASSWORD);
    }
}
