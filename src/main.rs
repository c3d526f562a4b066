//! Relay Server
//!
//! Run with: cargo run --bin relay -- --addr 0.0.0.0:8080
//!
//! # Configuration
//!
//! Settings are read from a TOML file (`--config`, or the first of
//! `~/.config/relay/config.toml`, `/etc/relay/config.toml`, `./relay.toml`),
//! then environment variables, then command-line flags.
//!
//! Environment variables:
//! - `RELAY_ADDR`: Address to listen on (default: 0.0.0.0:8080)
//! - `RELAY_ALLOWED_ORIGINS`: Comma-separated origin allow-list (default: any)
//! - `RELAY_WRITE_TIMEOUT_MS`: Per-write timeout (default: none)
//! - `RELAY_LOG_LEVEL`: Log level (default: info)
//! - `RELAY_LOG_FORMAT`: pretty or json (default: pretty)
//! - `RUST_LOG`: Full filter directive, overrides the log level

use anyhow::Context;
use clap::Parser;
use relay::config::{generate_default_config, Config, LogFormat, LoggingConfig};
use relay::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "WebSocket fan-out relay")]
struct Cli {
    /// Address to listen on (host:port)
    #[arg(long)]
    addr: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let (mut config, defaults) = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?;
            (config, None)
        }
        None => {
            let loaded = Config::load_default();
            (loaded.config.clone(), Some(loaded))
        }
    };

    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    init_logging(&config.logging);

    tracing::info!("Starting relay v{}", env!("CARGO_PKG_VERSION"));
    match defaults {
        Some(loaded) => loaded.log(),
        None => tracing::info!("Loaded config from {:?}", cli.config.unwrap_or_default()),
    }
    if config.server.allowed_origins.is_empty() {
        tracing::info!("Accepting connections from any origin");
    } else {
        tracing::info!("Allowed origins: {:?}", config.server.allowed_origins);
    }

    let server = Server::bind(&config)
        .await
        .with_context(|| format!("Failed to start listener on {}", config.server.addr))?;
    server.run().await?;

    tracing::info!("Relay stopped");
    Ok(())
}

/// Initialize tracing
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relay={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
