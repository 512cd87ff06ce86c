//! Configuration loader — merges env vars, .env file, and config.toml.

use common::types::StyleSet;
use common::{GatewayConfig, GatewayError};
use std::path::Path;

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

fn parse_style_set(raw: &str) -> Result<StyleSet, GatewayError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "plain_image" | "plain" => Ok(StyleSet::PlainImage),
        "icon_font" | "font" => Ok(StyleSet::IconFont),
        "vector_fill" | "fill" => Ok(StyleSet::VectorFill),
        "vector_outline" | "outline" => Ok(StyleSet::VectorOutline),
        _ => Err(GatewayError::Config(
            "UTW_STYLE_SET must be one of: plain_image, icon_font, vector_fill, vector_outline"
                .into(),
        )),
    }
}

/// Load gateway configuration from environment and optional config file.
///
/// Precedence, lowest to highest: built-in defaults, config.toml,
/// environment variables. Out-of-range values are clamped rather than
/// rejected; a missing API key is left empty so the pipeline can answer
/// requests with its not-configured error instead of refusing to start.
pub fn load_config() -> Result<GatewayConfig, GatewayError> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = GatewayConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| GatewayError::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
        config.api_key = key;
    }
    if let Ok(raw) = std::env::var("UTW_CACHE_ENABLED") {
        config.cache_enabled = parse_bool(&raw);
    }
    if let Ok(raw) = std::env::var("UTW_EXPIRATION_HOURS") {
        config.expiration_hours = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| GatewayError::Config("UTW_EXPIRATION_HOURS must be a number".into()))?;
    }
    if let Ok(raw) = std::env::var("UTW_STYLE_SET") {
        config.style_set = parse_style_set(&raw)?;
    }
    if let Ok(raw) = std::env::var("UTW_RATE_LIMIT_ENABLED") {
        config.rate_limit_enabled = parse_bool(&raw);
    }
    if let Ok(raw) = std::env::var("UTW_RATE_LIMIT_PER_HOUR") {
        config.rate_limit_per_hour = raw.trim().parse::<u32>().map_err(|_| {
            GatewayError::Config("UTW_RATE_LIMIT_PER_HOUR must be an integer > 0".into())
        })?;
    }
    if let Ok(raw) = std::env::var("UTW_LISTEN_ADDR") {
        config.listen_addr = raw.trim().to_string();
    }

    // 5. Validate what can't be clamped.
    if config.listen_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(GatewayError::Config(format!(
            "listen_addr {:?} is not a valid socket address",
            config.listen_addr
        )));
    }

    Ok(config.clamped())
}
