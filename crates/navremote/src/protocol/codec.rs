//! Frame codec for the NavRemote action protocol.
//!
//! A frame is a 4-byte big-endian length followed by a JSON document.

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const LEN_SIZE: usize = 4;

/// Largest frame accepted in either direction (64 MiB)
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Error encoding or decoding a frame
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
}

/// Serialize `msg` into a complete frame, length prefix included.
///
/// Fails with [`CodecError::TooLarge`] when the payload is longer than `max_len`,
/// so callers can refuse a response before anything reaches the socket.
pub fn encode_frame<T: Serialize>(msg: &T, max_len: usize) -> Result<Vec<u8>, CodecError> {
    let max = max_len.min(MAX_FRAME_LEN as usize);
    let mut frame = vec![0u8; LEN_SIZE];
    serde_json::to_writer(&mut frame, msg)?;

    let len = frame.len() - LEN_SIZE;
    if len > max {
        return Err(CodecError::TooLarge { len, max });
    }

    frame[..LEN_SIZE].copy_from_slice(&(len as u32).to_be_bytes());
    Ok(frame)
}

/// Serialize `msg` and write it as a single frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(msg, MAX_FRAME_LEN as usize)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `Ok(None)` on a clean end of stream before a frame starts.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, CodecError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; LEN_SIZE];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {},
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN as usize {
        return Err(CodecError::TooLarge { len, max: MAX_FRAME_LEN as usize });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(serde_json::from_slice(&buf)?))
}
