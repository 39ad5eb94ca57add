//! Hotel service - CLI
//!
//! Headless reservation and room lifecycle service suitable for deployment
//! as a systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/hotel-core/config.toml)
//! hotel-service
//!
//! # Custom config path
//! hotel-service --config /etc/hotel-core/config.toml
//!
//! # Validate config without starting
//! hotel-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use hotel_core::config::AppConfig;
use hotel_core::server::{init_tracing, ServerHandle, ServerOptions};

/// Hotel reservation service.
#[derive(Parser, Debug)]
#[command(
    name = "hotel-service",
    version,
    about = "Reservation, room and receivable lifecycle service",
    long_about = "Hotel reservation service: room state machine, reservation \
                  lifecycle and receivable ledger.\n\n\
                  Default config: ~/.config/hotel-core/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "HOTEL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Accept overlapping Pending reservations and enforce overlap at confirmation.
    #[arg(long)]
    tentative: bool,

    /// Validate the configuration file and exit without starting the service.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip registering the default room types.
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = AppConfig::resolve_path(cli.config.as_deref());

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            // Init tracing first so subsequent logs are formatted properly
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(url) = cli.database_url {
        info!("CLI override: database_url = {}", url);
        config.database.url = url;
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
        config.logging.level = level.clone();
    }
    if cli.tentative {
        info!("CLI override: tentative_overlap = true");
        let tentative = hotel_core::application::BookingPolicy::tentative_holds();
        config.booking.tentative_overlap = true;
        config.booking.blocking_states = tentative.blocking_states;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!("   Tentative   : {}", config.booking.tentative_overlap);
        println!("   Tax rate    : {}%", config.booking.tax_rate_percent);
        if config.metrics.enabled {
            println!("   Metrics     : http://{}/metrics", config.metrics.listen);
        }
        return Ok(());
    }

    // ── Start service ──────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_room_types: !cli.no_seed,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
