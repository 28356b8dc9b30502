//! Error types for Socks5d
//!
//! This module defines the error and reply-code types shared by the
//! protocol engine.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result alias used throughout the protocol engine
pub type Result<T> = std::result::Result<T, Socks5Error>;

/// SOCKS5 specific errors
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// IO error on the client or destination connection
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Unknown address type tag
    #[error("Invalid address type: {0}")]
    InvalidAddress(u8),

    /// Domain name that is not valid UTF-8
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Username or password rejected by the credential store
    #[error("User or password is invalid")]
    InvalidCredentials,

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Reply code outside the assigned 0x00..=0x08 range
    #[error("Unassigned reply code: {0}")]
    UnassignedReplyCode(u8),

    /// Peer address could not be expressed as a SOCKS5 address
    #[error("Address type not supported")]
    AddressTypeNotSupported,

    /// Domain name resolution failed
    #[error("Failed to resolve domain {name}: {source}")]
    Resolve {
        /// Domain that was looked up
        name: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Store(String),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyCode::Succeeded),
            0x01 => Ok(ReplyCode::GeneralFailure),
            0x02 => Ok(ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(ReplyCode::NetworkUnreachable),
            0x04 => Ok(ReplyCode::HostUnreachable),
            0x05 => Ok(ReplyCode::ConnectionRefused),
            0x06 => Ok(ReplyCode::TtlExpired),
            0x07 => Ok(ReplyCode::CommandNotSupported),
            0x08 => Ok(ReplyCode::AddressTypeNotSupported),
            other => Err(Socks5Error::UnassignedReplyCode(other)),
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReplyCode::Succeeded => "succeeded",
            ReplyCode::GeneralFailure => "general SOCKS server failure",
            ReplyCode::ConnectionNotAllowed => "connection not allowed by ruleset",
            ReplyCode::NetworkUnreachable => "network unreachable",
            ReplyCode::HostUnreachable => "host unreachable",
            ReplyCode::ConnectionRefused => "connection refused",
            ReplyCode::TtlExpired => "TTL expired",
            ReplyCode::CommandNotSupported => "command not supported",
            ReplyCode::AddressTypeNotSupported => "address type not supported",
        };
        f.write_str(text)
    }
}

/// Classify a transport failure by its structured kind.
impl From<&io::Error> for ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
            io::ErrorKind::HostUnreachable => ReplyCode::HostUnreachable,
            io::ErrorKind::TimedOut => ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => ReplyCode::ConnectionNotAllowed,
            _ => ReplyCode::GeneralFailure,
        }
    }
}
