//! Configuration for rconkit
//!
//! Centralized configuration with sensible defaults.
//!
//! - [`ServerConfig`]: where to connect and how to authenticate. Supplied per
//!   call by whatever stores per-user settings.
//! - [`ExecutorConfig`]: process-wide choices for the command executor.

use std::fmt;
use std::time::Duration;

use crate::error::{RconError, Result};

/// Default RCON port used by Minecraft servers
pub const DEFAULT_PORT: u16 = 25575;

/// Default timeout for connect, send, and receive
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection target and credentials for one RCON server
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Hostname or IP address of the game server
    pub host: String,

    /// RCON port
    pub port: u16,

    /// Plaintext RCON password (never logged)
    pub password: String,

    /// Bound on every blocking socket operation
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Hand-written so the password can never end up in a log line.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` string, used for logging and error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether a non-blank password is configured
    pub fn has_password(&self) -> bool {
        !self.password.trim().is_empty()
    }

    /// Load from `RCON_HOST`, `RCON_PORT`, `RCON_PASSWORD`, `RCON_TIMEOUT_SECS`
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (same keys as [`from_env`](Self::from_env))
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("RCON_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("RCON_PORT") {
            config.port = port.trim().parse().map_err(|_| {
                RconError::Config(format!("RCON_PORT is not a valid port: {:?}", port))
            })?;
        }
        if let Some(password) = lookup("RCON_PASSWORD") {
            config.password = password;
        }
        if let Some(secs) = lookup("RCON_TIMEOUT_SECS") {
            config.timeout = parse_timeout_secs(&secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the values a socket call would reject
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RconError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(RconError::Config("port must not be 0".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(RconError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        RconError::Config(format!("RCON_TIMEOUT_SECS is not a number: {:?}", raw))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(RconError::Config(format!(
            "RCON_TIMEOUT_SECS must be positive, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the RCON port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the RCON password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    /// Set the socket timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the config
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

// =============================================================================
// Executor Configuration
// =============================================================================

/// How the executor obtains connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Connect, authenticate, run one command, close. No retries.
    #[default]
    Fresh,

    /// Cache one authenticated connection per credential set.
    /// Callers on the same credentials serialize on its lock.
    Shared,
}

/// Process-wide executor settings
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Connection strategy
    pub mode: ConnectionMode,

    /// Reconnect-and-resend attempts after a transport error (shared mode only)
    pub reconnect_attempts: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::Fresh,
            reconnect_attempts: 1,
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Load from `RCON_MODE` (`fresh` | `shared`) and `RCON_RECONNECT_ATTEMPTS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (same keys as [`from_env`](Self::from_env))
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("RCON_MODE") {
            config.mode = match mode.trim().to_ascii_lowercase().as_str() {
                "fresh" => ConnectionMode::Fresh,
                "shared" => ConnectionMode::Shared,
                other => {
                    return Err(RconError::Config(format!(
                        "RCON_MODE must be 'fresh' or 'shared', got {:?}",
                        other
                    )))
                }
            };
        }
        if let Some(attempts) = lookup("RCON_RECONNECT_ATTEMPTS") {
            config.reconnect_attempts = attempts.trim().parse().map_err(|_| {
                RconError::Config(format!(
                    "RCON_RECONNECT_ATTEMPTS is not a count: {:?}",
                    attempts
                ))
            })?;
        }

        Ok(config)
    }

    /// Retries actually applied for the configured mode
    pub fn effective_reconnect_attempts(&self) -> u32 {
        match self.mode {
            ConnectionMode::Fresh => 0,
            ConnectionMode::Shared => self.reconnect_attempts,
        }
    }
}

/// Builder for ExecutorConfig
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the connection mode
    pub fn mode(mut self, mode: ConnectionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set reconnect attempts for shared mode
    pub fn reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.reconnect_attempts = attempts;
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}
