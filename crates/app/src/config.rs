//! Configuration
//!
//! Every setting can come from a flag or from the environment; `.env` is read
//! before parsing.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use storefront::local::GUEST_CART_KEY;

/// Database configuration
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Hosted identity provider configuration
#[derive(Debug, Clone, Args)]
pub struct AuthConfig {
    /// Base URL of the hosted auth service, e.g. `https://project.example.co`
    #[arg(long, env = "AUTH_URL")]
    pub auth_url: String,

    /// Public API key sent with every auth request
    #[arg(long, env = "AUTH_API_KEY", hide_env_values = true)]
    pub auth_api_key: String,
}

impl AuthConfig {
    /// Endpoint URL for `path` under `/auth/v1`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/auth/v1/{}",
            self.auth_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Device-local storage configuration
#[derive(Debug, Clone, Args)]
pub struct LocalStoreConfig {
    /// Directory holding the guest cart and the persisted session
    #[arg(long, env = "LOCAL_STORE_DIR", default_value = ".storefront")]
    pub local_store_dir: PathBuf,

    /// Key the guest cart is stored under
    #[arg(long, env = "GUEST_CART_KEY", default_value = GUEST_CART_KEY)]
    pub guest_cart_key: String,
}

/// Logging configuration
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level filter, used when `RUST_LOG` holds no directives
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single-line output
    Compact,

    /// One JSON object per event
    Json,
}
