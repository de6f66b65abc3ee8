//! # rconkit
//!
//! A blocking RCON client for game servers with:
//! - Bit-exact packet codec (little-endian, length-prefixed)
//! - Authenticated handshake with an explicit connection state machine
//! - Fresh-per-call or shared cached connections
//! - Failures returned as stable `"Error: ..."` strings, never panics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Web layer / CLI                            │
//! │        execute(), list_online_entities(), classify()         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Command Executor                            │
//! │        (typed errors → "Error: ..." strings)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │    Fresh    │          │  ConnectionPool  │
//!   │ (per call)  │          │ (Mutex per slot) │
//!   └──────┬──────┘          └────────┬─────────┘
//!          └────────────┬─────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │  Connection  │
//!               │ (handshake)  │
//!               └──────┬───────┘
//!                      ▼
//!               ┌──────────────┐
//!               │    Codec     │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod executor;
pub mod classifier;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RconError, Result};
pub use config::{ConnectionMode, ExecutorConfig, ServerConfig};
pub use executor::{execute, list_online_entities, Diagnostics, Executor};
pub use classifier::{classify, is_error, CommandResult, Verdict};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rconkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
