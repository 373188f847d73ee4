//! Configuration management for the stock service.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application server configuration.
    pub server: ServerConfig,
    /// Stock ledger storage configuration.
    pub store: StoreConfig,
    /// Reservation hold configuration.
    pub holds: HoldConfig,
    /// Checkout order retention configuration.
    pub orders: OrderConfig,
    /// Client sync defaults (used by the bundled sync client).
    pub sync: SyncConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Stock ledger storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Postgres connection URL. When unset the service runs on the
    /// in-memory store (development only).
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

/// Reservation hold configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldConfig {
    /// Hold time-to-live in seconds (default: 15 minutes).
    pub ttl_secs: u64,
    /// Sweeper interval in seconds (default: 60).
    pub sweep_secs: u64,
}

impl HoldConfig {
    /// Hold time-to-live as a [`Duration`].
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval as a [`Duration`].
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_secs)
    }
}

/// Checkout order retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// How long settled orders are kept for webhook re-delivery, in seconds
    /// (default: 24 hours). The sweeper purges older ones.
    pub retention_secs: u64,
}

impl OrderConfig {
    /// Retention window as a [`Duration`].
    #[must_use]
    pub const fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Client sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the stock service, for the HTTP fetcher.
    pub base_url: String,
    /// Interval cadence in seconds (default: 30).
    pub interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            },
            store: StoreConfig {
                database_url: env::var("DATABASE_URL").ok(),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            holds: HoldConfig {
                ttl_secs: env::var("HOLD_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900), // 15 minutes
                sweep_secs: env::var("HOLD_SWEEP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
            orders: OrderConfig {
                retention_secs: env::var("ORDER_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400), // 24 hours
            },
            sync: SyncConfig {
                base_url: env::var("SYNC_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                interval_secs: env::var("SYNC_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
        }
    }
}
