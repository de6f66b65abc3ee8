//! Network Module
//!
//! TCP connection handling for the RCON client.
//!
//! ## Architecture
//! - `Connection`: one socket, one handshake, sequential round trips
//! - `ConnectionPool`: one cached connection per credential set, each
//!   behind its own lock, for the shared-connection mode

mod connection;
mod pool;

pub use connection::{Connection, ConnectionState};
pub use pool::ConnectionPool;
