//! Protocol codec
//!
//! Encoding and decoding functions for the RCON wire format.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────┬──────────┐
//! │ Len (4)  │  Id (4)  │ Type (4) │      Payload        │ 0x00 0x00│
//! └──────────┴──────────┴──────────┴─────────────────────┴──────────┘
//! ```
//! All integers are little-endian `i32`.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{RconError, Result};
use super::{Packet, PacketType};

/// Size of the leading length field
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Two NUL bytes closing every packet
pub const TERMINATOR: [u8; 2] = [0x00, 0x00];

/// Smallest legal body: id (4) + type (4) + terminator (2)
pub const MIN_BODY_SIZE: usize = 4 + 4 + TERMINATOR.len();

/// Largest body accepted when reading from a stream (16 MB)
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a packet to bytes
///
/// Format: len (4) + request_id (4) + type (4) + payload + 0x00 0x00
///
/// No payload limit is enforced here. The only failure is a body whose
/// length does not fit in the `i32` length prefix.
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    let body_len = MIN_BODY_SIZE + packet.payload.len();
    let declared = i32::try_from(body_len).map_err(|_| {
        RconError::Protocol(format!(
            "Packet too large: {} bytes does not fit the length prefix",
            body_len
        ))
    })?;

    let mut buf = BytesMut::with_capacity(LENGTH_FIELD_SIZE + body_len);
    buf.put_i32_le(declared);
    buf.put_i32_le(packet.request_id);
    buf.put_i32_le(packet.packet_type.value());
    buf.put_slice(&packet.payload);
    buf.put_slice(&TERMINATOR);

    Ok(buf.freeze())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a complete packet (length prefix included) from bytes
pub fn decode_packet(bytes: &[u8]) -> Result<Packet> {
    if bytes.len() < LENGTH_FIELD_SIZE {
        return Err(RconError::Protocol(format!(
            "Incomplete length prefix: expected {} bytes, got {}",
            LENGTH_FIELD_SIZE,
            bytes.len()
        )));
    }

    let mut prefix = &bytes[..LENGTH_FIELD_SIZE];
    let body_len = checked_body_len(prefix.get_i32_le(), usize::MAX)?;

    let available = bytes.len() - LENGTH_FIELD_SIZE;
    if available < body_len {
        return Err(RconError::Protocol(format!(
            "Incomplete packet: expected {} bytes, got {}",
            body_len, available
        )));
    }

    decode_body(&bytes[LENGTH_FIELD_SIZE..LENGTH_FIELD_SIZE + body_len])
}

/// Decode the bytes that follow the length prefix
///
/// The first 4 bytes are the request id, the next 4 the type, and everything
/// but the final 2 bytes is payload. The terminator is not checked; servers
/// are inconsistent about it.
fn decode_body(body: &[u8]) -> Result<Packet> {
    if body.len() < MIN_BODY_SIZE {
        return Err(RconError::Protocol(format!(
            "Packet body too short: expected at least {} bytes, got {}",
            MIN_BODY_SIZE,
            body.len()
        )));
    }

    let mut header = &body[..8];
    let request_id = header.get_i32_le();
    let packet_type = PacketType(header.get_i32_le());
    let payload = body[8..body.len() - TERMINATOR.len()].to_vec();

    Ok(Packet {
        request_id,
        packet_type,
        payload,
    })
}

/// Validate a declared body length
fn checked_body_len(declared: i32, max: usize) -> Result<usize> {
    let body_len = usize::try_from(declared)
        .map_err(|_| RconError::Protocol(format!("Negative packet length: {}", declared)))?;

    if body_len < MIN_BODY_SIZE {
        return Err(RconError::Protocol(format!(
            "Packet length {} is below the minimum of {}",
            body_len, MIN_BODY_SIZE
        )));
    }
    if body_len > max {
        return Err(RconError::Protocol(format!(
            "Packet too large: {} bytes (max {})",
            body_len, max
        )));
    }

    Ok(body_len)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete packet from a stream
///
/// Reads exactly 4 bytes of length, then exactly that many bytes of body.
/// A stream that ends early is a protocol error; timeouts and other socket
/// failures come back as `RconError::Io`.
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Packet> {
    let mut prefix = [0u8; LENGTH_FIELD_SIZE];
    read_exact_or_short(reader, &mut prefix, "length prefix")?;

    let body_len = checked_body_len(i32::from_le_bytes(prefix), MAX_BODY_SIZE)?;

    let mut body = vec![0u8; body_len];
    read_exact_or_short(reader, &mut body, "packet body")?;

    let packet = decode_body(&body)?;
    tracing::trace!(
        "Read packet id={} type={} payload_len={}",
        packet.request_id,
        packet.packet_type.value(),
        packet.payload.len()
    );
    Ok(packet)
}

/// Write a packet to a stream and flush it
pub fn write_packet<W: Write>(writer: &mut W, packet: &Packet) -> Result<()> {
    let bytes = encode_packet(packet)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    tracing::trace!(
        "Wrote packet id={} type={} payload_len={}",
        packet.request_id,
        packet.packet_type.value(),
        packet.payload.len()
    );
    Ok(())
}

fn read_exact_or_short<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(RconError::Protocol(format!(
            "Connection closed by server while reading {} ({} bytes expected)",
            what,
            buf.len()
        ))),
        Err(e) => Err(RconError::Io(e)),
    }
}
