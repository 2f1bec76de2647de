//! Error types.
//!
//! Absent results (price not in the index, empty side) are `Option::None`,
//! not errors. Everything here is a rejected request or a failed collaborator.

use thiserror::Error;

use crate::types::{OrderId, Side};

/// Rejections from order creation and the order registry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VenueError {
    /// The order registry has no free slot
    #[error("order registry full ({capacity} live orders)")]
    CapacityExceeded { capacity: usize },

    /// The account cannot cover the requested order
    #[error("insufficient balance for {side} order: required {required}, available {available}")]
    InsufficientBalance {
        side: Side,
        required: f64,
        available: f64,
    },

    /// An order with this id is already live
    #[error("order {0} already registered")]
    DuplicateOrder(OrderId),

    /// Price or volume cannot be traded
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },
}

/// Failures reading the tick stream
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("tick source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be parsed or carries unusable values
    #[error("malformed tick at record {record}: {reason}")]
    MalformedTick { record: u64, reason: String },
}

/// Failures loading the run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures publishing telemetry or writing reports
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report write failed: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = VenueError::CapacityExceeded { capacity: 37 };
        assert_eq!(err.to_string(), "order registry full (37 live orders)");

        let err = VenueError::InsufficientBalance {
            side: Side::Bid,
            required: 12.5,
            available: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance for Bid order: required 12.5, available 10"
        );

        let err = FeedError::MalformedTick {
            record: 4,
            reason: "bad price".to_string(),
        };
        assert_eq!(err.to_string(), "malformed tick at record 4: bad price");
    }
}
