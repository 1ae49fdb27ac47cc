//! ESP32 relay entry point.
//!
//! Accepts WebSocket connections from the browser control page and from the
//! ESP32 device on a single port, works out which is which from their first
//! message, and relays position commands one way and movement results the
//! other.
//!
//! # Usage
//!
//! ```text
//! esp32-relay [OPTIONS]
//!
//! Options:
//!   --bind              <IP>    Address to listen on        [default: 0.0.0.0]
//!   --port              <PORT>  Port to listen on           [default: 8080]
//!   --handshake-timeout <SECS>  WebSocket upgrade timeout   [default: 10]
//!   --close-timeout     <SECS>  Close handshake timeout     [default: 10]
//!   --idle-timeout      <SECS>  Close silent connections    [default: 0 = never]
//!   --config            <PATH>  TOML file with a [server] table
//! ```
//!
//! # Precedence
//!
//! A flag beats its environment variable, which beats the config file, which
//! beats the built-in default.
//!
//! | Variable                  | Flag                  |
//! |---------------------------|-----------------------|
//! | `RELAY_BIND`              | `--bind`              |
//! | `RELAY_PORT`              | `--port`              |
//! | `RELAY_HANDSHAKE_TIMEOUT` | `--handshake-timeout` |
//! | `RELAY_CLOSE_TIMEOUT`     | `--close-timeout`     |
//! | `RELAY_IDLE_TIMEOUT`      | `--idle-timeout`      |
//! | `RELAY_CONFIG`            | `--config`            |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use esp32_relay::domain::config::{
    DEFAULT_CLOSE_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PORT,
};
use esp32_relay::domain::RelayConfig;
use esp32_relay::infrastructure::{run_server, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket relay between a browser control page and one ESP32 device.
///
/// Every option is optional so that values coming from `--config` can be told
/// apart from values the user actually passed.
#[derive(Debug, Parser)]
#[command(
    name = "esp32-relay",
    about = "WebSocket relay between a browser control page and an ESP32 device",
    version
)]
struct Cli {
    /// IP address to listen on.  `0.0.0.0` accepts the device over the LAN.
    #[arg(long, env = "RELAY_BIND")]
    bind: Option<String>,

    /// TCP port shared by the browser and the device.
    #[arg(long, env = "RELAY_PORT")]
    port: Option<u16>,

    /// Seconds a new socket may take to complete the WebSocket upgrade.
    #[arg(long, env = "RELAY_HANDSHAKE_TIMEOUT")]
    handshake_timeout: Option<u64>,

    /// Seconds a finished session may spend flushing and closing the socket.
    #[arg(long, env = "RELAY_CLOSE_TIMEOUT")]
    close_timeout: Option<u64>,

    /// Close a connection after this many seconds without a frame (0 = never).
    #[arg(long, env = "RELAY_IDLE_TIMEOUT")]
    idle_timeout: Option<u64>,

    /// Path to a TOML config file.
    #[arg(long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (if any) and builds a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if the
    /// bind address is not an IP address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => FileConfig::default(),
        };
        self.resolve(file)
    }

    /// Merges CLI values over `file` over the defaults.
    fn resolve(self, file: FileConfig) -> anyhow::Result<RelayConfig> {
        let server = file.server;

        let ip: IpAddr = match self.bind.or(server.bind) {
            Some(bind) => bind
                .parse()
                .with_context(|| format!("invalid bind address: '{bind}'"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = self.port.or(server.port).unwrap_or(DEFAULT_PORT);

        let handshake_timeout = self
            .handshake_timeout
            .or(server.handshake_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT);

        let close_timeout = self
            .close_timeout
            .or(server.close_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CLOSE_TIMEOUT);

        let idle_timeout = self
            .idle_timeout
            .or(server.idle_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, port),
            handshake_timeout,
            close_timeout,
            idle_timeout,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from `RUST_LOG`, falling back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_relay_config()?;

    info!(
        "ESP32 relay starting: bind={}, handshake_timeout={:?}, close_timeout={:?}, idle_timeout={:?}",
        config.bind_addr, config.handshake_timeout, config.close_timeout, config.idle_timeout
    );

    // Cleared by Ctrl+C; the accept loop checks it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("ESP32 relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use esp32_relay::infrastructure::config_file::ServerSection;

    use super::*;

    fn file(server: ServerSection) -> FileConfig {
        FileConfig { server }
    }

    #[test]
    fn test_no_args_no_file_gives_defaults() {
        // Arrange: no arguments at all
        let cli = Cli::parse_from(["esp32-relay"]);

        // Act
        let config = cli.resolve(FileConfig::default()).unwrap();

        // Assert
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["esp32-relay", "--port", "9999"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.bind_addr.port(), 9999);
    }

    #[test]
    fn test_cli_bind_override() {
        let cli = Cli::parse_from(["esp32-relay", "--bind", "127.0.0.1"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_ipv6_bind_is_accepted() {
        let cli = Cli::parse_from(["esp32-relay", "--bind", "::1", "--port", "8081"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.bind_addr.to_string(), "[::1]:8081");
    }

    #[test]
    fn test_invalid_bind_returns_error() {
        let cli = Cli::parse_from(["esp32-relay", "--bind", "not.an.ip"]);
        assert!(cli.resolve(FileConfig::default()).is_err());
    }

    #[test]
    fn test_handshake_timeout_override() {
        let cli = Cli::parse_from(["esp32-relay", "--handshake-timeout", "3"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_close_timeout_override() {
        let cli = Cli::parse_from(["esp32-relay", "--close-timeout", "2"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.close_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_idle_timeout_zero_disables() {
        let cli = Cli::parse_from(["esp32-relay", "--idle-timeout", "0"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.idle_timeout, None);
    }

    #[test]
    fn test_idle_timeout_enabled() {
        let cli = Cli::parse_from(["esp32-relay", "--idle-timeout", "30"]);
        let config = cli.resolve(FileConfig::default()).unwrap();
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_file_values_used_when_cli_silent() {
        // Arrange
        let cli = Cli::parse_from(["esp32-relay"]);
        let file = file(ServerSection {
            bind: Some("127.0.0.1".to_string()),
            port: Some(7000),
            handshake_timeout_secs: Some(4),
            close_timeout_secs: Some(5),
            idle_timeout_secs: Some(60),
        });

        // Act
        let config = cli.resolve(file).unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:7000");
        assert_eq!(config.handshake_timeout, Duration::from_secs(4));
        assert_eq!(config.close_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_cli_beats_file() {
        let cli = Cli::parse_from(["esp32-relay", "--port", "9000", "--idle-timeout", "0"]);
        let file = file(ServerSection {
            port: Some(7000),
            idle_timeout_secs: Some(60),
            ..ServerSection::default()
        });

        let config = cli.resolve(file).unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.idle_timeout, None);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from([
            "esp32-relay",
            "--config",
            "/definitely/not/here/esp32-relay.toml",
        ]);
        assert!(cli.into_relay_config().is_err());
    }
}
