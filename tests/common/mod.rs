//! Test utilities and mocks for socks5d
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socks5d::config::{AuthConfig, Config, ServerConfig, UserConfig};
use socks5d::Server;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start an echo server that serves connections until the test ends
pub async fn start_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
                let _ = writer.shutdown().await;
            });
        }
    });

    addr
}

/// A running socks5d instance
pub struct TestServer {
    /// Address clients connect to
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Start a server for `config` on an ephemeral loopback port
pub async fn start_server(config: Config) -> TestServer {
    let server = Server::from_config(&config).unwrap();
    let (listener, addr) = create_test_listener().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        let _ = server.run(listener, shutdown_rx).await;
    });

    TestServer { addr, shutdown_tx }
}

/// Test configuration builder
pub struct TestConfigBuilder {
    no_auth: bool,
    users: Vec<(String, String)>,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            no_auth: true,
            users: Vec::new(),
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the no-auth method
    pub fn no_auth(mut self, enabled: bool) -> Self {
        self.no_auth = enabled;
        self
    }

    /// Add a username/password account
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users.push((username.to_string(), password.to_string()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        Config {
            server: ServerConfig {
                bind_addr: "127.0.0.1:0".to_string(),
            },
            auth: AuthConfig {
                no_auth: self.no_auth,
                users: self
                    .users
                    .into_iter()
                    .map(|(username, password)| UserConfig { username, password })
                    .collect(),
            },
        }
    }
}

/// Connect to the server and complete a no-auth handshake
pub async fn connect_no_auth(server: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(server).await.unwrap();
    stream
        .write_all(&socks5_mock::create_auth_request_no_auth())
        .await
        .unwrap();

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);
    stream
}

/// Read one command reply, returning the reply code and the raw address part
pub async fn read_command_reply(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(header[0], 0x05);
    assert_eq!(header[2], 0x00);

    let addr_len = match header[3] {
        0x01 => 4,
        0x04 => 16,
        0x03 => stream.read_u8().await.unwrap() as usize,
        other => panic!("unexpected address type {}", other),
    };
    let mut addr = vec![0u8; addr_len + 2];
    stream.read_exact(&mut addr).await.unwrap();
    (header[1], addr)
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socks5d::socks::consts::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a username/password sub-negotiation request
    pub fn create_user_pass(username: &str, password: &str) -> Vec<u8> {
        let mut request = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        request.extend_from_slice(username.as_bytes());
        request.push(password.len() as u8);
        request.extend_from_slice(password.as_bytes());
        request
    }

    /// Create a command to an IPv4 address
    pub fn create_command_ipv4(command: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![SOCKS5_VERSION, command, SOCKS5_RESERVED, SOCKS5_ADDR_TYPE_IPV4];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        create_command_ipv4(SOCKS5_CMD_TCP_CONNECT, ip, port)
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_echo_server() {
        let addr = start_echo_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_config_builder() {
        let config = TestConfigBuilder::new()
            .no_auth(false)
            .user("test", "SecAbc@123")
            .build();

        assert!(!config.auth.no_auth);
        assert_eq!(config.auth.users.len(), 1);
        assert!(config.validate().is_ok());
    }
}
