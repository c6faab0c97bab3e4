//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string; absent means the
///   in-memory ledger
/// - `ORDER_DEADLINE_MS` — how long order placement waits on the
///   deduction call (default: `3000`)
/// - `SLOW_DEDUCT_TRIGGER_QTY` — order quantity that triggers the
///   injected deduction delay (default: `42`)
/// - `SLOW_DEDUCT_DELAY_MS` — length of the injected delay
///   (default: `5000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub order_deadline: Duration,
    pub slow_deduct_trigger_qty: u32,
    pub slow_deduct_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            order_deadline: Duration::from_millis(env_u64("ORDER_DEADLINE_MS", 3000)),
            slow_deduct_trigger_qty: std::env::var("SLOW_DEDUCT_TRIGGER_QTY")
                .ok()
                .and_then(|q| q.parse().ok())
                .unwrap_or(42),
            slow_deduct_delay: Duration::from_millis(env_u64("SLOW_DEDUCT_DELAY_MS", 5000)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            order_deadline: Duration::from_millis(3000),
            slow_deduct_trigger_qty: 42,
            slow_deduct_delay: Duration::from_millis(5000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.order_deadline, Duration::from_secs(3));
        assert_eq!(config.slow_deduct_trigger_qty, 42);
        assert_eq!(config.slow_deduct_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }
}
