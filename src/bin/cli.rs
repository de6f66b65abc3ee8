//! rconkit CLI Client
//!
//! Command-line interface for sending RCON commands to a game server.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rconkit::{is_error, ConnectionMode, Executor, ExecutorConfig, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// rconkit CLI
///
/// Unset connection options fall back to RCON_HOST, RCON_PORT,
/// RCON_PASSWORD and RCON_TIMEOUT_SECS.
#[derive(Parser, Debug)]
#[command(name = "rconkit-cli")]
#[command(about = "CLI for talking to a game server over RCON")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// RCON port
    #[arg(short, long)]
    port: Option<u16>,

    /// RCON password
    #[arg(long)]
    password: Option<String>,

    /// Socket timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Reuse one connection for all commands in this process
    #[arg(long)]
    shared: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a command and print its output
    Exec {
        /// Command words, joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// List players currently online
    Players,

    /// Test the connection and print diagnostics
    Check,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rconkit=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let server = match server_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mode = if args.shared {
        ConnectionMode::Shared
    } else {
        ConnectionMode::Fresh
    };
    let executor = Executor::new(ExecutorConfig::builder().mode(mode).build());

    tracing::debug!("rconkit v{} targeting {}", rconkit::VERSION, server.address());

    match args.command {
        Commands::Exec { command } => {
            let output = executor.execute(&command.join(" "), &server);
            println!("{}", output);
            if is_error(&output) {
                return ExitCode::FAILURE;
            }
        }
        Commands::Players => {
            for name in executor.list_online_entities(&server) {
                println!("{}", name);
            }
        }
        Commands::Check => {
            let report = executor.diagnose(&server);
            println!("host:         {}", report.host);
            println!("port:         {}", report.port);
            println!("password set: {}", report.password_set);
            println!("connected:    {}", report.connected);
            println!("response:     {}", report.response);
            if !report.connected {
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Environment first, then explicit flags on top
fn server_config(args: &Args) -> rconkit::Result<ServerConfig> {
    let mut config = ServerConfig::from_env()?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}
