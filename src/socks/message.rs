//! SOCKS5 message codec
//!
//! Every message of the handshake, in both directions. Decoding reads
//! exactly one message off the stream and rejects a version byte other
//! than 5 before anything else is consumed. Encoding is byte-exact and
//! written with a single `write_all` followed by a flush.

use super::consts::*;
use super::types::Address;
use crate::error::{Result, ReplyCode, Socks5Error};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A message that has a byte-exact wire form
pub trait Encode {
    /// Append the wire form to `buf`
    fn encode(&self, buf: &mut BytesMut);

    /// Encode into a fresh buffer
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.to_vec()
    }
}

/// Write one message to the stream and flush it
pub async fn write_message<W, M>(writer: &mut W, message: &M) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    M: Encode + ?Sized,
{
    let mut buf = BytesMut::new();
    message.encode(&mut buf);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_version<R>(reader: &mut R, expected: u8) -> Result<u8>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let version = reader.read_u8().await?;
    if version != expected {
        return Err(Socks5Error::UnsupportedVersion(version));
    }
    Ok(version)
}

/// Version identifier/method selection message
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRequest {
    /// Offered methods, in client preference order
    pub methods: Vec<u8>,
}

impl MethodRequest {
    /// Create a request offering `methods`
    pub fn new(methods: Vec<u8>) -> Self {
        MethodRequest { methods }
    }

    /// Read a method request from the stream
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_VERSION).await?;
        let count = reader.read_u8().await? as usize;
        let mut methods = vec![0u8; count];
        reader.read_exact(&mut methods).await?;
        Ok(MethodRequest { methods })
    }
}

impl Encode for MethodRequest {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.methods.len() as u8);
        buf.put_slice(&self.methods);
    }
}

/// METHOD selection message
///
/// ```text
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodReply {
    /// Selected method, or [`SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE`]
    pub method: u8,
}

impl MethodReply {
    /// Create a reply selecting `method`
    pub fn new(method: u8) -> Self {
        MethodReply { method }
    }

    /// The "no acceptable methods" reply
    pub fn not_acceptable() -> Self {
        MethodReply::new(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE)
    }

    /// Read a method reply from the stream
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_VERSION).await?;
        let method = reader.read_u8().await?;
        Ok(MethodReply { method })
    }
}

impl Encode for MethodReply {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.method);
    }
}

/// Username/password request
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPasswordRequest {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl UserPasswordRequest {
    /// Create a request for the given credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        UserPasswordRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read a username/password request from the stream.
    ///
    /// Credentials that are not valid UTF-8 cannot match any stored user
    /// and are reported as invalid credentials.
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_AUTH_VERSION).await?;
        let username = read_short_string(reader).await?;
        let password = read_short_string(reader).await?;
        Ok(UserPasswordRequest { username, password })
    }
}

async fn read_short_string<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<String> {
    let len = reader.read_u8().await? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes).await?;
    String::from_utf8(bytes).map_err(|_| Socks5Error::InvalidCredentials)
}

impl Encode for UserPasswordRequest {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_AUTH_VERSION);
        buf.put_u8(self.username.len() as u8);
        buf.put_slice(self.username.as_bytes());
        buf.put_u8(self.password.len() as u8);
        buf.put_slice(self.password.as_bytes());
    }
}

/// Username/password reply
///
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthReply {
    /// [`SOCKS5_AUTH_SUCCESS`] or [`SOCKS5_AUTH_FAILURE`]
    pub status: u8,
}

impl AuthReply {
    /// Successful sub-negotiation
    pub fn success() -> Self {
        AuthReply {
            status: SOCKS5_AUTH_SUCCESS,
        }
    }

    /// Failed sub-negotiation
    pub fn failure() -> Self {
        AuthReply {
            status: SOCKS5_AUTH_FAILURE,
        }
    }

    /// Whether the status byte reports success
    pub fn is_success(&self) -> bool {
        self.status == SOCKS5_AUTH_SUCCESS
    }

    /// Read an auth reply from the stream
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_AUTH_VERSION).await?;
        let status = reader.read_u8().await?;
        Ok(AuthReply { status })
    }
}

impl Encode for AuthReply {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_AUTH_VERSION);
        buf.put_u8(self.status);
    }
}

/// The SOCKS request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// The command byte is kept raw: an unknown command still decodes so the
/// dispatcher can answer it with "command not supported".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Raw CMD byte
    pub command: u8,
    /// Destination
    pub dest: Address,
}

impl CommandRequest {
    /// Create a request
    pub fn new(command: u8, dest: Address) -> Self {
        CommandRequest { command, dest }
    }

    /// Read a command request from the stream
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_VERSION).await?;
        let command = reader.read_u8().await?;
        let _reserved = reader.read_u8().await?;
        let dest = Address::read_from(reader).await?;
        Ok(CommandRequest { command, dest })
    }
}

impl Encode for CommandRequest {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.command);
        buf.put_u8(SOCKS5_RESERVED);
        self.dest.encode(buf);
    }
}

/// The SOCKS reply
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Outcome
    pub reply: ReplyCode,
    /// Bound address, zero-valued on failure
    pub bind: Address,
}

impl CommandReply {
    /// Create a reply
    pub fn new(reply: ReplyCode, bind: Address) -> Self {
        CommandReply { reply, bind }
    }

    /// A failure reply carrying the zero address
    pub fn failure(reply: ReplyCode) -> Self {
        CommandReply::new(reply, Address::unspecified())
    }

    /// Read a command reply from the stream
    pub async fn read_from<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Self> {
        read_version(reader, SOCKS5_VERSION).await?;
        let reply = ReplyCode::try_from(reader.read_u8().await?)?;
        let _reserved = reader.read_u8().await?;
        let bind = Address::read_from(reader).await?;
        Ok(CommandReply { reply, bind })
    }
}

impl Encode for CommandReply {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(SOCKS5_VERSION);
        buf.put_u8(self.reply.into());
        buf.put_u8(SOCKS5_RESERVED);
        self.bind.encode(buf);
    }
}
