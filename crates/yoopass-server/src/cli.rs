//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};

use crate::config::{
    ServerConfig, StoreBackend, DEFAULT_MAX_EXPIRATION_HOURS, DEFAULT_MAX_MESSAGE_BYTES,
};

/// Yoopass - share one-time and expiring secrets by link.
#[derive(Parser, Debug, Clone)]
#[command(name = "yoopass")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long, env = "YOOPASS_BIND", default_value = "0.0.0.0:8082")]
    pub bind: SocketAddr,

    /// Storage backend: `memory`, `redb://<path>` or a `.redb` file path.
    #[arg(short, long, env = "YOOPASS_STORE", default_value = "memory")]
    pub store: StoreBackend,

    /// Deadline for each store operation, in milliseconds.
    #[arg(long, env = "YOOPASS_STORE_TIMEOUT_MS", default_value_t = 3000)]
    pub store_timeout_ms: u64,

    /// Deadline for handling a whole request, in milliseconds.
    #[arg(long, env = "YOOPASS_REQUEST_TIMEOUT_MS", default_value_t = 4000)]
    pub request_timeout_ms: u64,

    /// Seconds between expiry sweeps (0 disables the sweep).
    #[arg(long, env = "YOOPASS_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Largest accepted message, in bytes.
    #[arg(long, env = "YOOPASS_MAX_MESSAGE_BYTES", default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,

    /// Largest accepted expiration, in hours.
    #[arg(long, env = "YOOPASS_MAX_EXPIRATION_HOURS", default_value_t = DEFAULT_MAX_EXPIRATION_HOURS)]
    pub max_expiration_hours: u64,

    /// Allowed CORS origin; repeat for several (default: any origin).
    #[arg(
        long = "cors-origin",
        env = "YOOPASS_CORS_ORIGINS",
        value_delimiter = ',',
        value_parser = parse_origin
    )]
    pub cors_origins: Vec<String>,

    /// Log output format.
    #[arg(long, value_enum, env = "YOOPASS_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl Cli {
    /// Build the server configuration from the parsed arguments.
    #[must_use]
    pub fn to_config(&self) -> ServerConfig {
        self.cors_origins.iter().fold(
            ServerConfig::new(self.bind)
                .with_store(self.store.clone())
                .with_store_timeout(Duration::from_millis(self.store_timeout_ms))
                .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
                .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
                .with_max_message_bytes(self.max_message_bytes)
                .with_max_expiration_hours(self.max_expiration_hours),
            |config, origin| config.with_cors_origin(origin.as_str()),
        )
    }
}

/// Accept only origins that can be sent back in a CORS header.
fn parse_origin(origin: &str) -> Result<String, String> {
    HeaderValue::from_str(origin)
        .map(|_| origin.to_string())
        .map_err(|_| format!("'{origin}' is not a valid origin header value"))
}
