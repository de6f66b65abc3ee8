//! Command Executor
//!
//! The one entry point the web layer calls. Every call returns a string:
//! server output on success, or `"Error: ..."` describing what went wrong.
//!
//! ## Responsibilities
//! - Obtain a connection (fresh per call, or cached in shared mode)
//! - Send exactly one command and capture its text
//! - Release the connection on every exit path
//! - Convert typed failures to the stable `"Error: "` strings

use serde::Serialize;

use crate::config::{ConnectionMode, ExecutorConfig, ServerConfig};
use crate::error::{RconError, Result};
use crate::network::{Connection, ConnectionPool};

/// Prefix reserved for failures in every returned string
pub const ERROR_PREFIX: &str = "Error: ";

/// Returned when the TCP connect or the AUTH handshake times out
pub const CONNECT_TIMEOUT_MESSAGE: &str =
    "Error: Connection timed out. Is the Minecraft server running?";

/// Returned when nothing is listening on the RCON port
pub const CONNECTION_REFUSED_MESSAGE: &str =
    "Error: Connection refused. Make sure Minecraft server is running and RCON is enabled.";

/// Returned when the server rejects the password
pub const AUTHENTICATION_FAILED_MESSAGE: &str =
    "Error: Authentication failed. Check RCON password in settings.";

/// Command that lists online players
const LIST_COMMAND: &str = "list";

/// Marker preceding the player names in the `list` response
const ONLINE_MARKER: &str = "online:";

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub host: String,
    pub port: u16,
    pub password_set: bool,
    pub response: String,
    pub connected: bool,
}

/// Executes RCON commands on behalf of callers
///
/// `Sync`: share one executor (e.g. behind an `Arc`) across request threads.
pub struct Executor {
    config: ExecutorConfig,

    /// Only populated in shared mode
    pool: ConnectionPool,
}

impl Executor {
    /// Create an executor with the given config
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            pool: ConnectionPool::new(),
        }
    }

    /// Executor config
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `command` and return its output, or an `"Error: ..."` string
    pub fn execute(&self, command: &str, server: &ServerConfig) -> String {
        match self.try_execute(command, server) {
            Ok(text) => {
                tracing::debug!("Command executed successfully on {}", server.address());
                text
            }
            Err(e) => {
                tracing::warn!("RCON error on {}: {}", server.address(), e);
                describe_failure(&e)
            }
        }
    }

    /// Run `command`, keeping the typed error
    pub fn try_execute(&self, command: &str, server: &ServerConfig) -> Result<String> {
        match self.config.mode {
            ConnectionMode::Fresh => execute_fresh(command, server),
            ConnectionMode::Shared => {
                self.pool
                    .execute(server, command, self.config.effective_reconnect_attempts())
            }
        }
    }

    /// Names of players currently online, or empty on any failure
    pub fn list_online_entities(&self, server: &ServerConfig) -> Vec<String> {
        let response = self.execute(LIST_COMMAND, server);
        if response.contains("Error") {
            tracing::debug!("Could not get player list, returning empty");
            return Vec::new();
        }
        parse_online_entities(&response)
    }

    /// Send `list` and report what happened
    pub fn diagnose(&self, server: &ServerConfig) -> Diagnostics {
        let response = self.execute(LIST_COMMAND, server);
        Diagnostics {
            host: server.host.clone(),
            port: server.port,
            password_set: server.has_password(),
            connected: !response.starts_with("Error"),
            response,
        }
    }

    /// Drop the cached connection for `server` (no-op in fresh mode)
    pub fn reset(&self, server: &ServerConfig) {
        if self.config.mode == ConnectionMode::Shared {
            self.pool.reset(server);
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

/// Connect, authenticate, run one command, close
fn execute_fresh(command: &str, server: &ServerConfig) -> Result<String> {
    // Drop closes the socket if anything below returns early
    let mut connection = Connection::open(server)?;
    let result = connection.execute(command);
    connection.close();
    result
}

/// Map a typed failure to its user-facing string
pub fn describe_failure(error: &RconError) -> String {
    match error {
        RconError::ConnectTimeout { .. } => CONNECT_TIMEOUT_MESSAGE.to_string(),
        RconError::ConnectionRefused { .. } => CONNECTION_REFUSED_MESSAGE.to_string(),
        RconError::AuthenticationFailed => AUTHENTICATION_FAILED_MESSAGE.to_string(),
        other => format!("{}{}", ERROR_PREFIX, other),
    }
}

/// Extract player names from a `list` response
///
/// `"There are 2 of a max of 20 players online: Alice, Bob"` gives
/// `["Alice", "Bob"]`. Text without the marker, or with nothing after it,
/// gives an empty list.
pub fn parse_online_entities(text: &str) -> Vec<String> {
    let Some((_, names)) = text.split_once(ONLINE_MARKER) else {
        return Vec::new();
    };

    let names = names.trim();
    if names.is_empty() {
        return Vec::new();
    }

    names.split(',').map(|name| name.trim().to_string()).collect()
}

/// Run `command` with a default fresh-connection executor
pub fn execute(command: &str, server: &ServerConfig) -> String {
    Executor::default().execute(command, server)
}

/// List online players with a default fresh-connection executor
pub fn list_online_entities(server: &ServerConfig) -> Vec<String> {
    Executor::default().list_online_entities(server)
}
