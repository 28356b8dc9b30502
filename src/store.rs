//! In-memory credential store
//!
//! Backs the username/password authenticator for the bundled binary.
//! Passwords are never kept in clear: each user gets a random salt and
//! the SHA-256 digest of salt and password.

use crate::error::{Result, Socks5Error};
use crate::socks::CredentialStore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// Salt length in bytes
const SALT_LEN: usize = 16;

#[derive(Clone)]
struct HashedPassword {
    salt: [u8; SALT_LEN],
    hash: [u8; 32],
}

impl HashedPassword {
    fn new(password: &str) -> Self {
        let salt: [u8; SALT_LEN] = rand::random();
        HashedPassword {
            salt,
            hash: digest(&salt, password),
        }
    }

    fn matches(&self, password: &str) -> bool {
        constant_time_compare(&self.hash, &digest(&self.salt, password))
    }
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Constant-time comparison of two byte slices
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Thread-safe user table kept in process memory
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, HashedPassword>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users in the store
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the store has no users
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Socks5Error {
    Socks5Error::Store("user table lock poisoned".to_string())
}

impl CredentialStore for MemoryStore {
    fn create(&self, username: &str, password: &str) -> Result<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.contains_key(username) {
            return Err(Socks5Error::Store(format!("user {} already exists", username)));
        }
        users.insert(username.to_string(), HashedPassword::new(password));
        Ok(())
    }

    fn update(&self, username: &str, password: &str) -> Result<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.get_mut(username) {
            Some(entry) => {
                *entry = HashedPassword::new(password);
                Ok(())
            }
            None => Err(Socks5Error::Store(format!("user {} not found", username))),
        }
    }

    fn delete(&self, username: &str) -> Result<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| Socks5Error::Store(format!("user {} not found", username)))
    }

    fn validate(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .get(username)
            .map(|entry| entry.matches(password))
            .unwrap_or(false))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("users", &self.len())
            .finish()
    }
}
