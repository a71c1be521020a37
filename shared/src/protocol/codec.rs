use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::error::ProtocolError;
use crate::protocol::message::{is_known_kind, Message};

/// Frame header: kind byte followed by little-endian body length.
pub const HEADER_LEN: usize = 5;

/// Upper bound on a frame body. Generous enough for a full-state sync of a
/// large tournament while rejecting garbage lengths outright.
pub const MAX_BODY_LEN: u32 = 16 * 1024 * 1024;

pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let body = bincode::serialize(message).map_err(ProtocolError::Encode)?;
    if body.len() > MAX_BODY_LEN as usize {
        return Err(ProtocolError::BodyTooLarge(body.len() as u32));
    }

    let mut header = [0u8; HEADER_LEN];
    header[0] = message.kind();
    header[1..].copy_from_slice(&(body.len() as u32).to_le_bytes());

    writer.write_all(&header).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame: header to completion, then the body. The decoded
/// message must agree with the header's kind byte.
pub async fn read_message<R>(reader: &mut R) -> Result<Message, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let kind_byte = header[0];
    if !is_known_kind(kind_byte) {
        return Err(ProtocolError::UnknownKind(kind_byte));
    }
    let body_len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    if body_len > MAX_BODY_LEN {
        return Err(ProtocolError::BodyTooLarge(body_len));
    }

    let mut body = vec![0u8; body_len as usize];
    reader.read_exact(&mut body).await?;

    let message: Message = bincode::deserialize(&body).map_err(ProtocolError::Decode)?;
    if message.kind() != kind_byte {
        return Err(ProtocolError::KindMismatch {
            header: kind_byte,
            body: message.kind(),
        });
    }
    Ok(message)
}
