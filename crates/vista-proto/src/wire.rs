// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Checksummed packet framing for stream transports.
//!
//! Message-oriented transports carry one CBOR frame per message. Byte
//! streams (TCP, Unix sockets) wrap each frame in a packet:
//!
//! ``MAGIC(4) || VERSION(2) || FLAGS(2) || LENGTH(4) || PAYLOAD || CHECKSUM(32)``
//!
//! * LENGTH is the big-endian payload length.
//! * CHECKSUM = blake3-256 over HEADER (first 12 bytes) || PAYLOAD.

use blake3::Hasher;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::{codec, CodecError, Message};

/// Protocol magic constant "VSTA".
pub const MAGIC: [u8; 4] = *b"VSTA";
/// Wire protocol version (big-endian u16).
pub const VERSION: u16 = 0x0001;
/// Reserved flags (zero for v1).
pub const FLAGS: u16 = 0x0000;
/// Header length in bytes.
pub const HEADER_LEN: usize = 12;
/// Checksum length in bytes.
pub const CHECKSUM_LEN: usize = 32;
/// Default cap on a single payload (8 MiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 8 * 1024 * 1024;

/// Errors raised while framing or unframing packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The first four bytes are not [`MAGIC`].
    #[error("bad magic")]
    BadMagic,
    /// The version field is not [`VERSION`].
    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
    /// The declared payload exceeds the configured cap.
    #[error("payload of {len} bytes exceeds limit of {max}")]
    TooLarge {
        /// Declared payload length.
        len: usize,
        /// Configured cap.
        max: usize,
    },
    /// The checksum does not match header and payload.
    #[error("checksum mismatch")]
    Checksum,
    /// Fewer bytes than one full packet.
    #[error("incomplete packet")]
    Incomplete,
}

/// Errors raised by the message-level helpers.
#[derive(Debug, Error)]
pub enum WireError {
    /// Packet-level failure.
    #[error(transparent)]
    Packet(#[from] PacketError),
    /// Payload-level failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Wrap `payload` in a packet.
pub fn encode_packet(payload: &[u8]) -> Vec<u8> {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&MAGIC);
    header[4..6].copy_from_slice(&VERSION.to_be_bytes());
    header[6..8].copy_from_slice(&FLAGS.to_be_bytes());
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    header[8..12].copy_from_slice(&len.to_be_bytes());

    let mut hasher = Hasher::new();
    hasher.update(&header);
    hasher.update(payload);
    let checksum = hasher.finalize();

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    out.extend_from_slice(&header);
    out.extend_from_slice(payload);
    out.extend_from_slice(checksum.as_bytes());
    out
}

/// Encode a message and wrap it in a packet.
pub fn encode_message_packet(msg: &Message) -> Result<Vec<u8>, WireError> {
    Ok(encode_packet(&codec::encode(msg)?))
}

/// Total packet length announced by `buf`'s header.
///
/// Returns `Ok(None)` while fewer than [`HEADER_LEN`] bytes are buffered.
pub fn try_packet_len(buf: &[u8], max_payload: usize) -> Result<Option<usize>, PacketError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }
    if buf[0..4] != MAGIC {
        return Err(PacketError::BadMagic);
    }
    let version = u16::from_be_bytes([buf[4], buf[5]]);
    if version != VERSION {
        return Err(PacketError::UnsupportedVersion(version));
    }
    let len = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    if len > max_payload {
        return Err(PacketError::TooLarge {
            len,
            max: max_payload,
        });
    }
    HEADER_LEN
        .checked_add(len)
        .and_then(|n| n.checked_add(CHECKSUM_LEN))
        .map(Some)
        .ok_or(PacketError::TooLarge {
            len,
            max: max_payload,
        })
}

/// Validate one complete packet and return its payload.
pub fn decode_packet(packet: &[u8], max_payload: usize) -> Result<&[u8], PacketError> {
    let total = try_packet_len(packet, max_payload)?.ok_or(PacketError::Incomplete)?;
    if packet.len() < total {
        return Err(PacketError::Incomplete);
    }
    let (header, rest) = packet.split_at(HEADER_LEN);
    let (payload, checksum) = rest.split_at(total - HEADER_LEN - CHECKSUM_LEN);
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    if hasher.finalize().as_bytes() != &checksum[..CHECKSUM_LEN] {
        return Err(PacketError::Checksum);
    }
    Ok(payload)
}

/// Accumulates stream bytes and yields validated payloads in order.
#[derive(Debug)]
pub struct PacketReader {
    acc: BytesMut,
    max_payload: usize,
}

impl PacketReader {
    /// Reader that rejects payloads larger than `max_payload`.
    pub fn new(max_payload: usize) -> Self {
        Self {
            acc: BytesMut::with_capacity(16 * 1024),
            max_payload,
        }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.acc.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet consumed.
    pub fn buffered(&self) -> usize {
        self.acc.len()
    }

    /// Pop the next complete payload, if one is buffered.
    ///
    /// Errors are fatal for the stream: after a bad header or checksum the
    /// byte boundaries are lost.
    pub fn next_payload(&mut self) -> Result<Option<Bytes>, PacketError> {
        let Some(total) = try_packet_len(&self.acc, self.max_payload)? else {
            return Ok(None);
        };
        if self.acc.len() < total {
            return Ok(None);
        }
        let packet = self.acc.split_to(total).freeze();
        decode_packet(&packet, self.max_payload)?;
        Ok(Some(packet.slice(HEADER_LEN..total - CHECKSUM_LEN)))
    }
}
