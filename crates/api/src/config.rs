//! Application configuration loaded from environment variables.

use chrono::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOCK_TTL_SECS` — availability lock TTL (default: `300`)
/// - `PROMOTION_LEAD_SECS` — minimum lead before a freed interval's start
///   for waitlist promotion (default: `900`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub lock_ttl_secs: u64,
    pub promotion_lead_secs: u64,
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
            lock_ttl_secs: std::env::var("LOCK_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            promotion_lead_secs: std::env::var("PROMOTION_LEAD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::seconds(self.lock_ttl_secs as i64)
    }

    pub fn promotion_lead(&self) -> Duration {
        Duration::seconds(self.promotion_lead_secs as i64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            lock_ttl_secs: 300,
            promotion_lead_secs: 900,
        }
    }
}
