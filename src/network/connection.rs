//! RCON Connection
//!
//! Owns one TCP stream and drives the authenticate-then-serve handshake.
//!
//! ```text
//! Disconnected → Connecting → Authenticating → Ready ⇄ Executing
//!                     │              │                    │
//!                     └──────────────┴──────→ Failed ←────┘
//! any state ── close() ──→ Closed
//! ```

use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::ServerConfig;
use crate::error::{RconError, Result};
use crate::protocol::{read_packet, write_packet, Packet};

/// Lifecycle state of a [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Executing,
    Closed,
    Failed,
}

/// Buffered read/write halves of the socket
struct Stream {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,
}

/// A single authenticated RCON session
///
/// Not shareable between threads without a lock; every command is one full
/// write-then-read round trip.
pub struct Connection {
    /// Socket halves, present from connect until close
    stream: Option<Stream>,

    /// Current lifecycle state
    state: ConnectionState,

    /// Last request id sent; pre-incremented before each packet
    request_id: i32,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a connection in the `Disconnected` state
    pub fn new() -> Self {
        Self {
            stream: None,
            state: ConnectionState::Disconnected,
            request_id: 0,
            peer_addr: String::from("unknown"),
        }
    }

    /// Connect and authenticate in one step
    pub fn open(config: &ServerConfig) -> Result<Self> {
        let mut connection = Self::new();
        connection.connect(config)?;
        Ok(connection)
    }

    /// Open the socket and run the AUTH handshake
    ///
    /// Only valid from `Disconnected`. On failure the connection is left in
    /// `Failed` with its socket released.
    pub fn connect(&mut self, config: &ServerConfig) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            return Err(RconError::NotConnected(self.state));
        }
        config.validate()?;

        self.peer_addr = config.address();
        self.state = ConnectionState::Connecting;
        tracing::debug!("Connecting to RCON at {}", self.peer_addr);

        let stream = match self.open_stream(config) {
            Ok(stream) => stream,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };
        self.stream = Some(stream);

        self.authenticate(&config.password)
    }

    /// Send one command and return its text output
    pub fn execute(&mut self, command: &str) -> Result<String> {
        if self.state != ConnectionState::Ready {
            return Err(RconError::NotConnected(self.state));
        }

        self.state = ConnectionState::Executing;
        tracing::debug!("Executing command on {}: {}", self.peer_addr, command);

        let id = self.next_request_id();
        match self.round_trip(&Packet::command(id, command)) {
            Ok(response) => {
                if response.request_id != id {
                    tracing::warn!(
                        "Response id {} from {} does not match request id {}",
                        response.request_id,
                        self.peer_addr,
                        id
                    );
                }
                self.state = ConnectionState::Ready;
                Ok(response.payload_text().into_owned())
            }
            Err(e) => {
                tracing::warn!("Command on {} failed: {}", self.peer_addr, e);
                self.fail();
                if e.is_io_timeout() {
                    Err(RconError::CommandTimeout)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Release the socket
    ///
    /// Idempotent: closing a closed or never-opened connection does nothing.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone; nothing useful to do on error.
            let _ = stream.reader.get_ref().shutdown(Shutdown::Both);
            tracing::debug!("Closed RCON connection to {}", self.peer_addr);
        }
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Closed;
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a command can be sent right now
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    // =========================================================================
    // Handshake
    // =========================================================================

    fn authenticate(&mut self, password: &str) -> Result<()> {
        self.state = ConnectionState::Authenticating;

        let id = self.next_request_id();
        let response = match self.round_trip(&Packet::auth(id, password)) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Handshake with {} failed: {}", self.peer_addr, e);
                self.fail();
                return Err(if e.is_io_timeout() {
                    RconError::ConnectTimeout {
                        addr: self.peer_addr.clone(),
                    }
                } else {
                    e
                });
            }
        };

        if response.is_auth_failure() {
            tracing::warn!("Authentication rejected by {}", self.peer_addr);
            self.fail();
            return Err(RconError::AuthenticationFailed);
        }

        self.state = ConnectionState::Ready;
        tracing::debug!("Connected and authenticated to {}", self.peer_addr);
        Ok(())
    }

    // =========================================================================
    // Socket plumbing
    // =========================================================================

    fn open_stream(&self, config: &ServerConfig) -> Result<Stream> {
        // Resolution counts against the same budget as the connect itself
        let deadline = Instant::now() + config.timeout;
        let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port)
            .to_socket_addrs()?
            .collect();

        let tcp = connect_any(&addrs, deadline)
            .map_err(|e| connect_error(e, &self.peer_addr))?;

        // Disable Nagle's algorithm: every packet is a complete request
        tcp.set_nodelay(true)?;
        tcp.set_read_timeout(Some(config.timeout))?;
        tcp.set_write_timeout(Some(config.timeout))?;

        // Clone stream for separate read/write handles
        let read_half = tcp.try_clone()?;
        Ok(Stream {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(tcp),
        })
    }

    /// Write one packet and read exactly one packet back
    fn round_trip(&mut self, packet: &Packet) -> Result<Packet> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(RconError::NotConnected(self.state))?;

        write_packet(&mut stream.writer, packet)?;
        read_packet(&mut stream.reader)
    }

    fn next_request_id(&mut self) -> i32 {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id
    }

    fn fail(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.reader.get_ref().shutdown(Shutdown::Both);
        }
        self.state = ConnectionState::Failed;
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a failed TCP connect to the connection error taxonomy
fn connect_error(err: io::Error, addr: &str) -> RconError {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => RconError::ConnectTimeout {
            addr: addr.to_string(),
        },
        ErrorKind::ConnectionRefused => RconError::ConnectionRefused {
            addr: addr.to_string(),
        },
        _ => RconError::Io(err),
    }
}

/// Try each resolved address in turn, keeping the last error
///
/// All attempts together finish by `deadline`: each address gets an even
/// share of whatever time is left when its turn comes.
fn connect_any(addrs: &[SocketAddr], deadline: Instant) -> io::Result<TcpStream> {
    let mut last_err = None;
    for (i, addr) in addrs.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(budget) = attempt_budget(remaining, addrs.len() - i) else {
            return Err(io::Error::new(ErrorKind::TimedOut, "connect deadline exceeded"));
        };
        match TcpStream::connect_timeout(addr, budget) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(ErrorKind::AddrNotAvailable, "host resolved to no addresses")
    }))
}

/// Share of `remaining` for the next of `addrs_left` attempts, `None` once spent
fn attempt_budget(remaining: Duration, addrs_left: usize) -> Option<Duration> {
    let share = remaining / u32::try_from(addrs_left.max(1)).unwrap_or(u32::MAX);
    (!share.is_zero()).then_some(share)
}
