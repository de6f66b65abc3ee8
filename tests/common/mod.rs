//! In-process mock RCON server for tests
//!
//! Speaks the real wire format using the crate's own codec. Every received
//! packet is reported on a channel so tests can check ids and payloads.

#![allow(dead_code)]

use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, Sender};
use rconkit::protocol::{read_packet, write_packet, Packet, PacketType, AUTH_FAILED_ID};
use rconkit::ServerConfig;

pub const PASSWORD: &str = "hunter2";

/// How the mock server behaves on each connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Authenticate with PASSWORD, answer every command via the responder
    Normal,
    /// Read packets but never reply
    Silent,
    /// Reply to AUTH, never answer commands
    SilentCommands,
    /// Reply to AUTH, then send only a length prefix for a command and stop writing
    TruncateCommands,
    /// Answer one command, then close the socket
    CloseAfterCommand,
}

type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub struct MockServer {
    pub addr: SocketAddr,
    pub packets: Receiver<Packet>,
    connections: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl MockServer {
    /// Start a normal server that answers commands with `responder`
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::with_behavior(Behavior::Normal, responder)
    }

    /// Start a server that echoes each command as `echo: <command>`
    pub fn echo() -> Self {
        Self::start(|command| format!("echo: {}", command))
    }

    pub fn with_behavior<F>(behavior: Behavior, responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = unbounded();
        let connections = Arc::new(AtomicUsize::new(0));
        let disconnects = Arc::new(AtomicUsize::new(0));
        let responder: Responder = Arc::new(responder);

        let counter = Arc::clone(&connections);
        let hangups = Arc::clone(&disconnects);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let tx = tx.clone();
                let responder = Arc::clone(&responder);
                let hangups = Arc::clone(&hangups);
                thread::spawn(move || {
                    if serve(stream, behavior, tx, responder) == Ended::ClientClosed {
                        hangups.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        Self {
            addr,
            packets: rx,
            connections,
            disconnects,
        }
    }

    /// Number of TCP connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Number of connections the client has closed so far
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Wait up to five seconds for `expected` client disconnects
    pub fn wait_for_disconnects(&self, expected: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.disconnect_count() < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        self.disconnect_count()
    }

    /// Server config pointing at this mock with the right password
    pub fn config(&self) -> ServerConfig {
        self.config_with_password(PASSWORD)
    }

    pub fn config_with_password(&self, password: &str) -> ServerConfig {
        ServerConfig::builder()
            .host("127.0.0.1")
            .port(self.addr.port())
            .password(password)
            .timeout(Duration::from_secs(5))
            .build()
    }

    /// All packets received so far
    pub fn received(&self) -> Vec<Packet> {
        self.packets.try_iter().collect()
    }
}

/// Why a served connection ended
#[derive(Debug, PartialEq, Eq)]
enum Ended {
    /// The client closed its end (read hit EOF or reset)
    ClientClosed,
    /// The server gave up on the connection itself
    ServerClosed,
}

fn serve(stream: TcpStream, behavior: Behavior, tx: Sender<Packet>, responder: Responder) -> Ended {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;

    loop {
        let packet = match read_packet(&mut reader) {
            Ok(packet) => packet,
            Err(_) => return Ended::ClientClosed,
        };
        let _ = tx.send(packet.clone());

        if behavior == Behavior::Silent {
            continue;
        }

        if packet.packet_type == PacketType::AUTH {
            let id = if packet.payload == PASSWORD.as_bytes() {
                packet.request_id
            } else {
                AUTH_FAILED_ID
            };
            let reply = Packet::new(id, PacketType::AUTH_RESPONSE, "");
            if write_packet(&mut writer, &reply).is_err() {
                return Ended::ServerClosed;
            }
            continue;
        }

        match behavior {
            Behavior::SilentCommands => {}
            Behavior::TruncateCommands => {
                // Declare a 64-byte body, deliver none of it, then wait for the client to hang up
                let _ = writer.write_all(&64i32.to_le_bytes());
                let _ = writer.flush();
                let _ = writer.shutdown(Shutdown::Write);
            }
            _ => {
                let output = responder(&packet.payload_text());
                let reply = Packet::new(packet.request_id, PacketType::RESPONSE_VALUE, &output);
                if write_packet(&mut writer, &reply).is_err() {
                    return Ended::ServerClosed;
                }
                if behavior == Behavior::CloseAfterCommand {
                    return Ended::ServerClosed;
                }
            }
        }
    }
}

/// A local port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
