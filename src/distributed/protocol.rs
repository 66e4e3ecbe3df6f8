//! Distributed mode protocol
//!
//! Defines the messages exchanged between the coordinator and worker
//! services. Messages are serialized with MessagePack (rmp-serde) for
//! compact binary framing with full serde feature support.
//!
//! # Message Flow
//!
//! ```text
//! Coordinator                     Worker
//!     |                              |
//!     |-------- KERNEL ------------->|   (broadcast: one per worker)
//!     |-------- CHUNK -------------->|
//!     |                              |
//!     |<------- CHUNK_RESULT --------|   (or ERROR)
//! ```
//!
//! Workers never talk to each other; each holds one stream back to the
//! coordinator and the collect step is a barrier over all of them.
//!
//! # Message Framing
//!
//! Each message is prefixed with a 4-byte length field (little-endian u32):
//!
//! ```text
//! [4 bytes: message length][N bytes: MessagePack-serialized message]
//! ```

use crate::filter::BoundaryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Protocol version
///
/// Checked on the kernel broadcast; coordinator and workers must match.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single frame
///
/// A chunk of an 8K frame is well under this; anything larger is a
/// corrupted length field, not a real payload.
pub const MAX_MESSAGE_BYTES: usize = 512 * 1024 * 1024;

/// Protocol message
///
/// All messages exchanged between coordinator and worker services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Kernel broadcast (Coordinator → Worker)
    ///
    /// Installs the convolution kernel and boundary policy for the
    /// exchanges that follow. Sent once per worker before any chunk.
    Kernel(KernelMessage),

    /// Halo-padded chunk payload (Coordinator → Worker)
    Chunk(ChunkMessage),

    /// Processed valid region (Worker → Coordinator)
    ChunkResult(ResultMessage),

    /// Error report (Worker → Coordinator)
    ///
    /// The coordinator aborts the run and discards partial results.
    Error(ErrorMessage),
}

/// Kernel broadcast message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelMessage {
    /// Protocol version (must match)
    pub protocol_version: u32,

    /// Kernel side length (odd)
    pub side: usize,

    /// Row-major flattened weights, `side * side` entries
    pub weights: Vec<f64>,

    /// Boundary policy every worker must apply
    pub boundary: BoundaryPolicy,
}

/// Chunk payload message
///
/// `pixels` covers the padded row range; the metadata locates the valid
/// region inside it and its destination in the output image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMessage {
    /// Image width (shared by every chunk)
    pub width: u32,

    /// Rows in this payload, halo included
    pub padded_height: u32,

    /// Destination row of the valid region in the output image
    pub valid_start: u32,

    /// Halo rows above the valid region
    pub padding_top: u32,

    /// Rows the worker owns
    pub valid_height: u32,

    /// Packed RGB pixels, `width * padded_height` entries
    pub pixels: Vec<u32>,
}

/// Processed chunk result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMessage {
    pub width: u32,
    pub valid_height: u32,

    /// Destination row in the output image; results may arrive in any
    /// order and each lands at its own offset
    pub valid_start: u32,

    /// Packed RGB pixels, `width * valid_height` entries
    pub pixels: Vec<u32>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Worker identifier (hostname)
    pub node_id: String,

    /// Error description
    pub error: String,
}

/// Serialize a message to bytes with the 4-byte length prefix
pub fn serialize_message(msg: &Message) -> Result<Vec<u8>> {
    let msg_bytes = rmp_serde::to_vec(msg).context("Failed to serialize message")?;

    let msg_len = msg_bytes.len() as u32;
    let mut framed = Vec::with_capacity(4 + msg_bytes.len());
    framed.extend_from_slice(&msg_len.to_le_bytes());
    framed.extend_from_slice(&msg_bytes);

    Ok(framed)
}

/// Deserialize a message from a framed byte buffer
///
/// Returns (message, bytes_consumed) where bytes_consumed includes the
/// length prefix.
pub fn deserialize_message(buf: &[u8]) -> Result<(Message, usize)> {
    if buf.len() < 4 {
        anyhow::bail!(
            "Buffer too small for message length (need 4 bytes, got {})",
            buf.len()
        );
    }

    let msg_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if buf.len() < 4 + msg_len {
        anyhow::bail!(
            "Incomplete message (need {} bytes, got {})",
            4 + msg_len,
            buf.len()
        );
    }

    let msg = rmp_serde::from_slice(&buf[4..4 + msg_len])
        .context("Failed to deserialize message")?;

    Ok((msg, 4 + msg_len))
}

/// Read a complete message from a TCP stream
///
/// Reads the length prefix, then the complete body. Handles partial reads.
pub async fn read_message(stream: &mut tokio::net::TcpStream) -> Result<Message> {
    use tokio::io::AsyncReadExt;

    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .context("Failed to read message length")?;

    let msg_len = u32::from_le_bytes(len_buf) as usize;

    if msg_len > MAX_MESSAGE_BYTES {
        anyhow::bail!("Message too large: {} bytes (max {})", msg_len, MAX_MESSAGE_BYTES);
    }

    let mut msg_buf = vec![0u8; msg_len];
    stream
        .read_exact(&mut msg_buf)
        .await
        .context("Failed to read message body")?;

    let msg = rmp_serde::from_slice(&msg_buf).context("Failed to deserialize message")?;

    Ok(msg)
}

/// Write a message to a TCP stream and flush it
pub async fn write_message(stream: &mut tokio::net::TcpStream, msg: &Message) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let framed = serialize_message(msg)?;

    stream
        .write_all(&framed)
        .await
        .context("Failed to write message")?;

    stream.flush().await.context("Failed to flush stream")?;

    Ok(())
}
