//! Packet definitions
//!
//! One framed unit of the RCON protocol.

use std::borrow::Cow;

/// Request id the server sends back when authentication fails
pub const AUTH_FAILED_ID: i32 = -1;

/// Packet type field
///
/// A newtype rather than an enum: two protocol constants share the value 2,
/// and unknown values from the server must still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketType(pub i32);

impl PacketType {
    pub const AUTH: PacketType = PacketType(3);
    pub const AUTH_RESPONSE: PacketType = PacketType(2);
    pub const EXEC_COMMAND: PacketType = PacketType(2);
    pub const RESPONSE_VALUE: PacketType = PacketType(0);

    /// Raw wire value
    pub fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for PacketType {
    fn from(value: i32) -> Self {
        PacketType(value)
    }
}

/// A single RCON packet
///
/// The two-byte terminator is not stored; the codec adds and strips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Client-chosen id, echoed by the server
    pub request_id: i32,

    /// Packet type
    pub packet_type: PacketType,

    /// Raw payload bytes (UTF-8 text for commands)
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a packet with a text payload
    pub fn new(request_id: i32, packet_type: PacketType, payload: &str) -> Self {
        Self {
            request_id,
            packet_type,
            payload: payload.as_bytes().to_vec(),
        }
    }

    /// Create an AUTH packet carrying the password
    pub fn auth(request_id: i32, password: &str) -> Self {
        Self::new(request_id, PacketType::AUTH, password)
    }

    /// Create an EXEC_COMMAND packet
    pub fn command(request_id: i32, command: &str) -> Self {
        Self::new(request_id, PacketType::EXEC_COMMAND, command)
    }

    /// Payload decoded as UTF-8, invalid sequences replaced with U+FFFD
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Whether this is an auth response signalling a rejected password
    pub fn is_auth_failure(&self) -> bool {
        self.request_id == AUTH_FAILED_ID
    }
}
