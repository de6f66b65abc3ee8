//! Connection Pool Tests
//!
//! Tests verify:
//! - One cached connection per credential set
//! - Reconnect-and-resend after a broken connection
//! - No retries for authentication failures
//! - Failed credential sets are not kept in the cache
//! - Concurrent callers never see each other's responses

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use common::{Behavior, MockServer};
use rconkit::network::ConnectionPool;
use rconkit::RconError;

// =============================================================================
// Caching Tests
// =============================================================================

#[test]
fn test_reuses_connection_for_same_credentials() {
    let server = MockServer::echo();
    let pool = ConnectionPool::new();
    let config = server.config();

    for i in 0..5 {
        let output = pool.execute(&config, &format!("say {}", i), 1).unwrap();
        assert_eq!(output, format!("echo: say {}", i));
    }

    assert_eq!(server.connection_count(), 1);
    assert_eq!(pool.live_connections(), 1);
}

#[test]
fn test_separate_connections_per_server() {
    let first = MockServer::echo();
    let second = MockServer::echo();
    let pool = ConnectionPool::new();

    pool.execute(&first.config(), "list", 1).unwrap();
    pool.execute(&second.config(), "list", 1).unwrap();
    pool.execute(&first.config(), "list", 1).unwrap();

    assert_eq!(first.connection_count(), 1);
    assert_eq!(second.connection_count(), 1);
    assert_eq!(pool.live_connections(), 2);
}

#[test]
fn test_reset_drops_cached_connection() {
    let server = MockServer::echo();
    let pool = ConnectionPool::new();
    let config = server.config();

    pool.execute(&config, "list", 1).unwrap();
    pool.reset(&config);
    assert_eq!(pool.live_connections(), 0);

    pool.execute(&config, "list", 1).unwrap();
    assert_eq!(server.connection_count(), 2);
}

#[test]
fn test_clear_closes_everything() {
    let first = MockServer::echo();
    let second = MockServer::echo();
    let pool = ConnectionPool::new();

    pool.execute(&first.config(), "list", 1).unwrap();
    pool.execute(&second.config(), "list", 1).unwrap();
    pool.clear();

    assert_eq!(pool.live_connections(), 0);
}

// =============================================================================
// Reconnect Tests
// =============================================================================

#[test]
fn test_reconnects_once_after_broken_connection() {
    let server = MockServer::with_behavior(Behavior::CloseAfterCommand, |command| {
        format!("done: {}", command)
    });
    let pool = ConnectionPool::new();
    let config = server.config();

    assert_eq!(pool.execute(&config, "first", 1).unwrap(), "done: first");
    // Server hung up after "first"; the cached socket is dead
    assert_eq!(pool.execute(&config, "second", 1).unwrap(), "done: second");

    assert_eq!(server.connection_count(), 2);
}

#[test]
fn test_no_reconnect_when_attempts_are_zero() {
    let server = MockServer::with_behavior(Behavior::TruncateCommands, |_| String::new());
    let pool = ConnectionPool::new();

    let result = pool.execute(&server.config(), "list", 0);

    assert!(matches!(result, Err(RconError::Protocol(_))));
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn test_gives_up_after_reconnect_attempts() {
    let server = MockServer::with_behavior(Behavior::TruncateCommands, |_| String::new());
    let pool = ConnectionPool::new();

    let result = pool.execute(&server.config(), "list", 1);

    assert!(matches!(result, Err(RconError::Protocol(_))));
    assert_eq!(server.connection_count(), 2);
    assert_eq!(pool.live_connections(), 0);
}

#[test]
fn test_authentication_failure_is_not_retried() {
    let server = MockServer::echo();
    let pool = ConnectionPool::new();

    let result = pool.execute(&server.config_with_password("nope"), "list", 3);

    assert!(matches!(result, Err(RconError::AuthenticationFailed)));
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn test_failed_credentials_do_not_accumulate() {
    let server = MockServer::echo();
    let pool = ConnectionPool::new();

    for i in 0..20 {
        let config = server.config_with_password(&format!("guess-{}", i));
        let result = pool.execute(&config, "list", 1);
        assert!(matches!(result, Err(RconError::AuthenticationFailed)));
    }

    assert_eq!(pool.cached_credentials(), 0);
    assert_eq!(pool.live_connections(), 0);
}

#[test]
fn test_broken_connection_is_forgotten_but_good_one_kept() {
    let broken = MockServer::with_behavior(Behavior::TruncateCommands, |_| String::new());
    let good = MockServer::echo();
    let pool = ConnectionPool::new();

    assert!(pool.execute(&broken.config(), "list", 1).is_err());
    pool.execute(&good.config(), "list", 1).unwrap();

    assert_eq!(pool.cached_credentials(), 1);
    assert_eq!(pool.live_connections(), 1);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_callers_never_interleave() {
    let server = MockServer::echo();
    let pool = Arc::new(ConnectionPool::new());
    let config = server.config();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let config = config.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let command = format!("say thread-{}-msg-{}", t, i);
                    let output = pool.execute(&config, &command, 1).unwrap();
                    assert_eq!(output, format!("echo: {}", command));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(server.connection_count(), 1);
}
