//! Weather-gateway: cached forecast serving layer over OpenWeather.
//!
//! Single-binary Tokio application that:
//! 1. Accepts forecast requests over HTTP
//! 2. Admits or blocks clients with a fixed-window rate limit
//! 3. Serves cached forecasts when fresh, fetches upstream otherwise
//! 4. Sanitizes and enriches upstream payloads before caching
//! 5. Reports seven days of usage counters

mod config;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use gateway_core::{MemoryStore, Orchestrator};
use openweather_client::OpenWeatherClient;

/// Cached forecast gateway
#[derive(Parser)]
#[command(name = "weather-gateway", about = "Cached forecast gateway over OpenWeather")]
struct Cli {
    /// Load and print the effective configuration, then exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_gateway=info,gateway_core=info,openweather_client=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("Weather gateway starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if cfg.api_key.trim().is_empty() {
        warn!("No OpenWeather API key configured; forecast requests will fail until one is set");
    }
    info!(
        "Cache: enabled={}, expiration={}h; rate limit: enabled={}, {}/h; style={:?}",
        cfg.cache_enabled,
        cfg.expiration_hours,
        cfg.rate_limit_enabled,
        cfg.rate_limit_per_hour,
        cfg.style_set,
    );

    // ── Check-config mode ────────────────────────────────────────────
    if cli.check_config {
        match serde_json::to_string_pretty(&cfg) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                error!("Failed to render configuration: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let upstream = match OpenWeatherClient::new() {
        Ok(c) => c,
        Err(e) => {
            error!("Upstream client initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    // Separate stores: flushing the forecast cache never resets rate
    // limit counters.
    let listen_addr = cfg.listen_addr.clone();
    let orchestrator = Arc::new(Orchestrator::new(
        cfg,
        Arc::new(upstream),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    ));

    let app = routes::create_router(orchestrator);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", listen_addr);

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                error!("Server exited: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Weather gateway shut down.");
}
