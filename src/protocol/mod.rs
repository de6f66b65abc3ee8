//! Protocol Module
//!
//! Defines the RCON wire protocol spoken to the game server.
//!
//! ## Packet Format (all integers little-endian)
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────┬──────────┐
//! │ Len (4)  │  Id (4)  │ Type (4) │   Payload (UTF-8)   │ 0x00 0x00│
//! └──────────┴──────────┴──────────┴─────────────────────┴──────────┘
//! ```
//! `Len` counts everything after itself: 4 + 4 + payload + 2.
//!
//! ### Packet Types
//! - 3: AUTH            - Payload: password
//! - 2: AUTH_RESPONSE   - Id is -1 when the password was rejected
//! - 2: EXEC_COMMAND    - Payload: command text
//! - 0: RESPONSE_VALUE  - Payload: command output
//!
//! AUTH_RESPONSE and EXEC_COMMAND share the value 2 on the wire. Servers
//! rely on it, so it stays.

mod packet;
mod codec;

pub use packet::{Packet, PacketType, AUTH_FAILED_ID};
pub use codec::{
    decode_packet, encode_packet, read_packet, write_packet,
    LENGTH_FIELD_SIZE, MAX_BODY_SIZE, MIN_BODY_SIZE, TERMINATOR,
};
