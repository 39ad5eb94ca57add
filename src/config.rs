//! Configuration module
//!
//! TOML file with per-section defaults. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::lifecycle::BookingPolicy;
use crate::domain::RoomState;
use crate::infrastructure::DatabaseConfig;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "HOTEL_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `~/.config/hotel-core/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotel-core")
        .join("config.toml")
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
    pub ledger: LedgerConfig,
    pub projection: ProjectionConfig,
    pub metrics: MetricsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter; `RUST_LOG` takes precedence
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub tax_rate_percent: Decimal,
    pub payment_grace_days: i64,
    pub open_receivable_on_create: bool,
    pub tentative_overlap: bool,
    pub blocking_states: Vec<RoomState>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        let strict = BookingPolicy::strict();
        Self {
            tax_rate_percent: strict.tax_rate_percent,
            payment_grace_days: strict.payment_grace_days,
            open_receivable_on_create: strict.open_receivable_on_create,
            tentative_overlap: strict.tentative_overlap,
            blocking_states: strict.blocking_states,
        }
    }
}

impl From<&BookingConfig> for BookingPolicy {
    fn from(cfg: &BookingConfig) -> Self {
        Self {
            tax_rate_percent: cfg.tax_rate_percent,
            payment_grace_days: cfg.payment_grace_days,
            open_receivable_on_create: cfg.open_receivable_on_create,
            tentative_overlap: cfg.tentative_overlap,
            blocking_states: cfg.blocking_states.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub overdue_sweep_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            overdue_sweep_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub refresh_interval_secs: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
        }
    }
}

/// Prometheus exporter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: "0.0.0.0:9100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Seconds allowed for background tasks to stop
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { shutdown_timeout: 30 }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Resolve the file from `explicit`, then `HOTEL_CONFIG`, then the
    /// per-user default location.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_config_path),
        }
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy::from(&self.booking)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        let rate = self.booking.tax_rate_percent;
        if rate < Decimal::ZERO || rate > Decimal::from(100) {
            return Err(ConfigError::Invalid(format!(
                "booking.tax_rate_percent must be within 0..=100, got {}",
                rate
            )));
        }
        if self.booking.payment_grace_days < 0 {
            return Err(ConfigError::Invalid(
                "booking.payment_grace_days must not be negative".into(),
            ));
        }
        if self.ledger.overdue_sweep_interval_secs == 0 || self.projection.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be at least one second".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_strict_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.booking_policy(), BookingPolicy::strict());
        assert_eq!(config.ledger.overdue_sweep_interval_secs, 3600);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "sqlite://./test.db?mode=rwc"

            [logging]
            format = "json"

            [booking]
            tax_rate_percent = "18"
            tentative_overlap = true
            blocking_states = ["Occupied", "Maintenance"]
            "#,
        )
        .unwrap();

        let policy = config.booking_policy();
        assert_eq!(policy.tax_rate_percent, Decimal::from(18));
        assert!(policy.tentative_overlap);
        assert!(!policy.blocks(RoomState::Cleaning));
        assert!(policy.blocks(RoomState::Maintenance));
        assert!(config.logging.is_json());
        assert_eq!(config.database.url, "sqlite://./test.db?mode=rwc");
    }

    #[test]
    fn rejects_out_of_range_tax() {
        let err = AppConfig::from_toml("[booking]\ntax_rate_percent = \"150\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/hotel-core.toml")).unwrap();
        assert_eq!(config.server.shutdown_timeout, 30);
    }

    #[test]
    fn explicit_path_wins() {
        let path = AppConfig::resolve_path(Some(Path::new("/etc/hotel.toml")));
        assert_eq!(path, PathBuf::from("/etc/hotel.toml"));
    }
}
