use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the maintenance platform
#[derive(Error, Debug)]
pub enum RoadIqError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Invalid anomaly rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    // Leaf data errors (never surface past the leaf agents)
    #[error("Data source missing: {}", .0.display())]
    DataSourceMissing(PathBuf),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Notification errors
    #[error("Notification dispatcher is shut down")]
    DispatcherClosed,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RoadIqError
pub type Result<T> = std::result::Result<T, RoadIqError>;

impl RoadIqError {
    /// Leaf-data errors degrade to fallbacks instead of propagating
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            RoadIqError::DataSourceMissing(_)
                | RoadIqError::VehicleNotFound(_)
                | RoadIqError::Json(_)
                | RoadIqError::Io(_)
        )
    }
}
