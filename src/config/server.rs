//! Server configuration types
//!
//! Defines the configuration structures for the socks5d server.

use crate::socks::consts::MAX_DOMAIN_LEN;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default listening address
fn default_bind_addr() -> String {
    "127.0.0.1:1080".to_string()
}

/// Default no-auth setting
fn default_no_auth() -> bool {
    true
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.auth.validate()
    }
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to accept SOCKS5 clients on (e.g., "0.0.0.0:1080")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerConfig {
    /// Parsed listening address
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        self.bind_addr
            .parse()
            .map_err(|e| format!("Invalid bind address {:?}: {}", self.bind_addr, e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.socket_addr().map(|_| ())
    }
}

/// Authentication configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Offer the "no authentication" method
    #[serde(default = "default_no_auth")]
    pub no_auth: bool,

    /// Accounts for username/password authentication
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            no_auth: default_no_auth(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Whether the username/password method should be offered
    pub fn has_users(&self) -> bool {
        !self.users.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.no_auth && !self.has_users() {
            return Err("No authentication method enabled".to_string());
        }
        for user in &self.users {
            user.validate()?;
        }
        Ok(())
    }
}

/// A username/password account
#[derive(Serialize, Deserialize, Clone)]
pub struct UserConfig {
    /// Login name
    pub username: String,

    /// Plain-text password, hashed when loaded into the store
    pub password: String,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl UserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("Username must not be empty".to_string());
        }
        // Both fields travel behind a one-byte length prefix
        if self.username.len() > MAX_DOMAIN_LEN {
            return Err(format!("Username too long: {}", self.username));
        }
        if self.password.len() > MAX_DOMAIN_LEN {
            return Err(format!("Password too long for user {}", self.username));
        }
        Ok(())
    }
}
