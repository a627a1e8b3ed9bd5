//! Transfer protocol encoding and decoding
//!
//! Message format:
//! - 4 bytes: message length (big-endian u32)
//! - N bytes: JSON payload
//!
//! Raw file bytes follow a [`FileHeader`](super::types::TransferMessage::FileHeader)
//! frame on the same stream, so the async helpers read frames with exact reads
//! and never consume bytes past the end of a frame.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum allowed message size (4MB)
///
/// A transfer request carries the full file list, which can be large for
/// deep directory trees.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Protocol errors
#[derive(Debug)]
pub enum ProtocolError {
    /// Message exceeds maximum allowed size
    MessageTooLarge(usize),
    /// JSON serialization/deserialization error
    JsonError(serde_json::Error),
    /// Incomplete message (need more data)
    Incomplete,
    /// Underlying stream error
    Io(std::io::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MessageTooLarge(size) => {
                write!(
                    f,
                    "Message too large: {} bytes (max: {})",
                    size, MAX_MESSAGE_SIZE
                )
            }
            ProtocolError::JsonError(e) => write!(f, "JSON error: {}", e),
            ProtocolError::Incomplete => write!(f, "Incomplete message"),
            ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::JsonError(e) => Some(e),
            ProtocolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::JsonError(err)
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err)
    }
}

/// Encode a message for transmission
///
/// Returns a byte vector containing:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded payload
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(json.len()));
    }

    let mut buf = Vec::with_capacity(4 + json.len());
    buf.put_u32(json.len() as u32);
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Decode a message from a buffer
///
/// Returns:
/// - `Ok(Some(msg))` - Complete message decoded, buffer advanced
/// - `Ok(None)` - Need more data (buffer unchanged)
/// - `Err(e)` - Protocol error
///
/// The buffer is only modified when a complete message is successfully decoded.
pub fn decode<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>, ProtocolError> {
    if buf.len() < 4 {
        return Ok(None);
    }

    // Peek at the length without consuming
    let length = (&buf[..4]).get_u32() as usize;

    if length > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(length));
    }

    if buf.len() < 4 + length {
        return Ok(None);
    }

    buf.advance(4);
    let json_bytes = buf.split_to(length);

    let msg = serde_json::from_slice(&json_bytes)?;
    Ok(Some(msg))
}

/// Write a single framed message and flush the stream
pub async fn write_message<S, T>(stream: &mut S, msg: &T) -> Result<(), ProtocolError>
where
    S: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = encode(msg)?;
    stream.write_all(&data).await?;
    stream.flush().await?;
    Ok(())
}

/// Read exactly one framed message
///
/// Returns `ProtocolError::Incomplete` when the peer closes the stream before
/// a full frame arrives.
pub async fn read_message<S, T>(stream: &mut S) -> Result<T, ProtocolError>
where
    S: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    if let Err(e) = stream.read_exact(&mut header).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::Incomplete,
            _ => ProtocolError::Io(e),
        });
    }

    let length = u32::from_be_bytes(header) as usize;
    if length > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(length));
    }

    let mut buf = BytesMut::with_capacity(4 + length);
    buf.extend_from_slice(&header);
    buf.resize(4 + length, 0);
    if let Err(e) = stream.read_exact(&mut buf[4..]).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::Incomplete,
            _ => ProtocolError::Io(e),
        });
    }

    decode(&mut buf)?.ok_or(ProtocolError::Incomplete)
}
