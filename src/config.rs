//! Run configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) is
//! a valid configuration:
//!
//! ```toml
//! book_capacity = 10
//! registry_size = 37
//! starting_base_balance = 0.0
//! starting_quote_balance = 10.0
//! standard_lot = 100000
//! support = 1.28
//! resistance = 1.35
//! feed_has_headers = false
//! telemetry_addr = "127.0.0.1:8888"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::orderbook::DEFAULT_CAPACITY;
use crate::registry::TABLE_SIZE;
use crate::types::ConfigError;

/// Settings for one simulated run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VenueConfig {
    /// Price levels kept per side
    pub book_capacity: usize,

    /// Slots in the order registry
    pub registry_size: usize,

    /// Opening balances, in base and quote currency units
    pub starting_base_balance: f64,
    pub starting_quote_balance: f64,

    /// Real-world units per unit of volume, used for reporting only
    pub standard_lot: u64,

    pub support: f64,
    pub resistance: f64,

    /// Whether the tick file starts with a header row
    pub feed_has_headers: bool,

    /// UDP destination for per-tick snapshots, e.g. `127.0.0.1:8888`
    pub telemetry_addr: Option<String>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            book_capacity: DEFAULT_CAPACITY,
            registry_size: TABLE_SIZE,
            starting_base_balance: 0.0,
            starting_quote_balance: 10.0,
            standard_lot: 100_000,
            support: 1.28,
            resistance: 1.35,
            feed_has_headers: false,
            telemetry_addr: None,
        }
    }
}

impl VenueConfig {
    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the venue unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.book_capacity == 0 {
            return Err(ConfigError::Invalid("book_capacity must be at least 1".into()));
        }
        if self.registry_size == 0 {
            return Err(ConfigError::Invalid("registry_size must be at least 1".into()));
        }
        for (name, value) in [
            ("starting_base_balance", self.starting_base_balance),
            ("starting_quote_balance", self.starting_quote_balance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.support.is_finite() || !self.resistance.is_finite() {
            return Err(ConfigError::Invalid("support and resistance must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = VenueConfig::from_toml_str("").unwrap();
        assert_eq!(config, VenueConfig::default());
        assert_eq!(config.registry_size, 37);
        assert_eq!(config.book_capacity, 10);
    }

    #[test]
    fn test_partial_override() {
        let config = VenueConfig::from_toml_str(
            "support = 1.25\ntelemetry_addr = \"127.0.0.1:9999\"\n",
        )
        .unwrap();

        assert_eq!(config.support, 1.25);
        assert_eq!(config.resistance, 1.35);
        assert_eq!(config.telemetry_addr.as_deref(), Some("127.0.0.1:9999"));
    }

    #[test]
    fn test_zero_registry_rejected() {
        let err = VenueConfig::from_toml_str("registry_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_negative_balance_rejected() {
        let err = VenueConfig::from_toml_str("starting_quote_balance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = VenueConfig::from_toml_str("capacity = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
