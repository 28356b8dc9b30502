//! SOCKS5 type definitions
//!
//! Defines the command and address types shared by requests and replies,
//! together with the address wire codec.

use super::consts::*;
use crate::error::{Result, Socks5Error};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for an incoming connection
    Bind,
    /// UDP ASSOCIATE - establish UDP relay
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }

    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Endpoint carried in DST.ADDR/DST.PORT and BND.ADDR/BND.PORT.
///
/// On the wire:
///
/// ```text
/// +------+----------+------+
/// | ATYP |   ADDR   | PORT |
/// +------+----------+------+
/// |  1   | Variable |  2   |
/// +------+----------+------+
/// ```
///
/// IPv4 is 4 raw bytes, IPv6 is 16 raw bytes, a domain is a one byte
/// length followed by that many bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl Address {
    /// Create a new Address from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        Address::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new Address from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        Address::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new Address from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        Address::Domain(domain.into(), port)
    }

    /// The zero-valued address (`0.0.0.0:0`) sent with failure replies
    pub fn unspecified() -> Self {
        Address::ipv4(Ipv4Addr::UNSPECIFIED, 0)
    }

    /// Build a reply address from a socket endpoint.
    ///
    /// IPv4-mapped IPv6 addresses are reported with the IPv4 tag so the
    /// tag always reflects the shortest form of the IP.
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V6(v6) => match v6.ip().to_ipv4_mapped() {
                Some(v4) => Address::ipv4(v4, v6.port()),
                None => Address::Ip(addr),
            },
            SocketAddr::V4(_) => Address::Ip(addr),
        }
    }

    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            Address::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            Address::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            Address::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// The socket address, if this is an IP address
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            Address::Ip(addr) => Some(*addr),
            Address::Domain(_, _) => None,
        }
    }

    /// Number of bytes this address occupies on the wire, tag included
    pub fn encoded_len(&self) -> usize {
        match self {
            Address::Ip(SocketAddr::V4(_)) => 1 + 4 + 2,
            Address::Ip(SocketAddr::V6(_)) => 1 + 16 + 2,
            Address::Domain(domain, _) => 1 + 1 + domain.len() + 2,
        }
    }

    /// Append the wire encoding to `buf`.
    ///
    /// A domain longer than 255 bytes is the caller's bug; its length
    /// prefix is truncated to one byte.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u8(self.addr_type());
        match self {
            Address::Ip(SocketAddr::V4(addr)) => {
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            Address::Ip(SocketAddr::V6(addr)) => {
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            Address::Domain(domain, port) => {
                debug_assert!(domain.len() <= MAX_DOMAIN_LEN);
                buf.put_u8(domain.len() as u8);
                buf.put_slice(domain.as_bytes());
                buf.put_u16(*port);
            }
        }
    }

    /// Serialize the address to bytes for SOCKS5 protocol
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.to_vec()
    }

    /// Read an address, tag byte first, from the stream
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let addr_type = reader.read_u8().await?;

        match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut ip = [0u8; 4];
                reader.read_exact(&mut ip).await?;
                let port = reader.read_u16().await?;
                Ok(Address::ipv4(Ipv4Addr::from(ip), port))
            }

            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = reader.read_u8().await? as usize;
                let mut domain = vec![0u8; len];
                reader.read_exact(&mut domain).await?;
                let port = reader.read_u16().await?;
                let domain = String::from_utf8(domain).map_err(|e| {
                    Socks5Error::InvalidDomain(String::from_utf8_lossy(e.as_bytes()).into_owned())
                })?;
                Ok(Address::Domain(domain, port))
            }

            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut ip = [0u8; 16];
                reader.read_exact(&mut ip).await?;
                let port = reader.read_u16().await?;
                Ok(Address::ipv6(Ipv6Addr::from(ip), port))
            }

            other => Err(Socks5Error::InvalidAddress(other)),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ip(addr) => write!(f, "{}", addr),
            Address::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Ip(addr)
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::unspecified()
    }
}
