//! Shared connection cache
//!
//! Keeps one authenticated connection per credential set so repeated
//! commands skip the connect + auth round trip.
//!
//! ## Concurrency:
//! - `slots`: one Mutex over the map, held only to look up or insert a slot
//! - each slot: its own Mutex, held for a full command round trip, so two
//!   callers never interleave reads/writes on one socket
//! - callers with different credentials never block each other

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ServerConfig;
use crate::error::{RconError, Result};
use super::Connection;

/// Cache identity of a server: where it is and how we log in
#[derive(Clone, PartialEq, Eq, Hash)]
struct ServerKey {
    host: String,
    port: u16,
    password: String,
}

impl ServerKey {
    fn from_config(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            password: config.password.clone(),
        }
    }
}

type Slot = Arc<Mutex<Option<Connection>>>;

/// Cache of live connections keyed by credentials
pub struct ConnectionPool {
    slots: Mutex<HashMap<ServerKey, Slot>>,
}

impl ConnectionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run one command on the cached connection for `config`
    ///
    /// Connects on first use or after a previous failure. If the round trip
    /// hits a transport error, the connection is discarded and the command is
    /// resent on a fresh connection, up to `reconnect_attempts` times.
    pub fn execute(
        &self,
        config: &ServerConfig,
        command: &str,
        reconnect_attempts: u32,
    ) -> Result<String> {
        let slot = self.slot(config);
        let result = {
            let mut guard = slot.lock();
            run_on_slot(&mut guard, config, command, reconnect_attempts)
        };

        // Failed handshakes and discarded connections leave an empty slot
        if result.is_err() {
            self.prune(config, &slot);
        }
        result
    }

    /// Close and forget the cached connection for `config`, if any
    pub fn reset(&self, config: &ServerConfig) {
        let removed = self.slots.lock().remove(&ServerKey::from_config(config));
        if let Some(slot) = removed {
            if let Some(mut connection) = slot.lock().take() {
                connection.close();
            }
        }
    }

    /// Close every cached connection
    pub fn clear(&self) {
        let slots: Vec<Slot> = self.slots.lock().drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            if let Some(mut connection) = slot.lock().take() {
                connection.close();
            }
        }
    }

    /// Number of credential sets with a live, ready connection
    pub fn live_connections(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots
            .iter()
            .filter(|slot| {
                // A held lock means a round trip is in flight on a live connection
                slot.try_lock()
                    .map_or(true, |guard| matches!(&*guard, Some(c) if c.is_ready()))
            })
            .count()
    }

    /// Number of credential sets currently holding a slot
    pub fn cached_credentials(&self) -> usize {
        self.slots.lock().len()
    }

    /// Remove `slot` from the map if it is still the one stored for `config`
    /// and holds no connection. A slot another caller is using is left alone.
    fn prune(&self, config: &ServerConfig, slot: &Slot) {
        let key = ServerKey::from_config(config);
        let mut slots = self.slots.lock();

        let Some(stored) = slots.get(&key) else {
            return;
        };
        if !Arc::ptr_eq(stored, slot) {
            return;
        }
        let empty = slot.try_lock().is_some_and(|guard| guard.is_none());
        if empty {
            slots.remove(&key);
        }
    }

    fn slot(&self, config: &ServerConfig) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(
            slots
                .entry(ServerKey::from_config(config))
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }
}

/// Run one command on a locked slot, reconnecting on transport errors
///
/// On error the slot is always left empty.
fn run_on_slot(
    cached: &mut Option<Connection>,
    config: &ServerConfig,
    command: &str,
    reconnect_attempts: u32,
) -> Result<String> {
    let mut attempts_left = reconnect_attempts;
    loop {
        if !cached.as_ref().is_some_and(Connection::is_ready) {
            // Drop (and close) whatever is left before reconnecting
            *cached = None;
            *cached = Some(Connection::open(config)?);
        }

        let Some(connection) = cached.as_mut() else {
            return Err(RconError::Protocol(
                "cached connection vanished while locked".to_string(),
            ));
        };

        match connection.execute(command) {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transport() && attempts_left > 0 => {
                attempts_left -= 1;
                tracing::warn!(
                    "Shared connection to {} broke ({}), reconnecting",
                    config.address(),
                    e
                );
                *cached = None;
            }
            Err(e) => {
                *cached = None;
                return Err(e);
            }
        }
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}
