use broker_proxy::{CacheService, Config};
use clap::Parser;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Broker proxy - per-principal client cache in front of a broker cluster
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "broker-proxy")]
struct Cli {
    /// Path to configuration file
    #[arg(value_name = "CONFIG", default_value = "config.json")]
    config_path: String,

    /// Validate configuration and exit (doesn't start the proxy)
    #[arg(short = 'c', long)]
    validate: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load or create configuration (without logging first)
    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.validate {
                eprintln!("Configuration validation failed!");
                eprintln!("   Error: {}", e);
                process::exit(1);
            }

            warn!("Could not load config file from {}: {}", cli.config_path, e);
            info!("Creating example configuration at: {}", cli.config_path);

            if let Err(e) = Config::example().to_file(&cli.config_path) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and restart the proxy", cli.config_path);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully!");
        println!();
        println!("Configuration summary:");
        println!("  Brokers: {}", config.client.brokers.join(", "));
        println!("  Authentication: {}", config.authentication_method);
        println!("  Cache max size: {}", config.client_cache.max_size);
        println!("  Keep-alive: {}ms", config.client_cache.keep_alive_ms);
        println!("  Sweep interval: {}ms", config.client_cache.sweep_interval_ms);
        println!("  Log level: {}", config.log_level());
        process::exit(0);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Broker proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config_path);
    info!(
        brokers = %config.client.brokers.join(","),
        authentication = %config.authentication_method,
        "Backend cluster"
    );

    let service = match CacheService::start(&config) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to start client cache: {}", e);
            process::exit(1);
        }
    };

    info!("Proxy started, press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    service.shutdown().await;
}
