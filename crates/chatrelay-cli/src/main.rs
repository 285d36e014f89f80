//! Chatrelay entry point.
//!
//! One binary, two modes:
//!
//! ```text
//! chatrelay server          -- run the relay server (config from TOML + RUST_LOG)
//! chatrelay client [addr]   -- run the console client, default 127.0.0.1:8090
//! ```
//!
//! Anything else prints usage and performs no network action.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatrelay_client::{run_console, ClientConfig};
use chatrelay_server::{load_config, RelayServer};

/// Which half of the system this process runs as.
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Server,
    Client { addr: Option<SocketAddr> },
}

/// Classifies the command-line arguments (program name already stripped).
///
/// `None` means "print usage and touch nothing".
fn parse_mode(args: &[String]) -> Option<Mode> {
    match args {
        [mode] if mode == "server" => Some(Mode::Server),
        [mode] if mode == "client" => Some(Mode::Client { addr: None }),
        [mode, addr] if mode == "client" => {
            let addr = addr.parse().ok()?;
            Some(Mode::Client { addr: Some(addr) })
        }
        _ => None,
    }
}

fn print_usage() {
    eprintln!("usage: chatrelay <server|client> [addr]");
    eprintln!();
    eprintln!("  server         run the relay server");
    eprintln!("  client [addr]  run the console client (default 127.0.0.1:8090)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    // Logs go to stderr so relayed lines own stdout in client mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_mode(&args) {
        Some(Mode::Server) => run_server().await,
        Some(Mode::Client { addr }) => run_client(addr).await,
        None => {
            print_usage();
            Ok(())
        }
    }
}

async fn run_server() -> anyhow::Result<()> {
    let config = load_config().context("loading configuration")?;
    info!("chatrelay server starting on {}", config.network.listen_addr());

    let server = RelayServer::new(config.network);

    // Ctrl-C routes to the same idempotent shutdown as the `down` command.
    let on_signal = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            on_signal.shutdown().await;
        }
    });

    server.serve().await.context("running relay server")?;
    info!("chatrelay server stopped");
    Ok(())
}

async fn run_client(addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let mut config = ClientConfig::default();
    if let Some(addr) = addr {
        config.server_addr = addr;
    }

    run_console(config).await.context("running console client")?;
    info!("chatrelay client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_server_argument_selects_server_mode() {
        assert_eq!(parse_mode(&args(&["server"])), Some(Mode::Server));
    }

    #[test]
    fn test_client_argument_selects_client_mode_with_default_address() {
        assert_eq!(
            parse_mode(&args(&["client"])),
            Some(Mode::Client { addr: None })
        );
    }

    #[test]
    fn test_client_accepts_an_explicit_address() {
        assert_eq!(
            parse_mode(&args(&["client", "10.0.0.7:9001"])),
            Some(Mode::Client {
                addr: Some("10.0.0.7:9001".parse().unwrap())
            })
        );
    }

    #[test]
    fn test_missing_argument_means_usage() {
        assert_eq!(parse_mode(&[]), None);
    }

    #[test]
    fn test_unknown_argument_means_usage() {
        assert_eq!(parse_mode(&args(&["observer"])), None);
    }

    #[test]
    fn test_malformed_client_address_means_usage() {
        assert_eq!(parse_mode(&args(&["client", "not-an-address"])), None);
    }

    #[test]
    fn test_extra_arguments_mean_usage() {
        assert_eq!(parse_mode(&args(&["server", "extra"])), None);
    }
}
