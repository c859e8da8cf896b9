use thiserror::Error;

/// Failure reported by the log delivery service or the transport to it
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Not authorized to read logs for {0}")]
    Unauthorized(String),

    #[error("Failed to connect to delivery service: {0}")]
    Connection(String),

    #[error("Delivery protocol error: {0}")]
    Protocol(String),

    #[error("Log subscription closed by delivery service")]
    Closed,

    #[error("Delivery service error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for devlogs
#[derive(Debug, Error)]
pub enum LogsError {
    // Session errors, one per failure point of a run
    #[error("Failed to fetch log history: {0}")]
    History(DeliveryError),

    #[error("Failed to subscribe to live logs: {0}")]
    Subscribe(DeliveryError),

    #[error("Live log subscription failed: {0}")]
    Subscription(DeliveryError),

    #[error("Session already ran")]
    SessionAlreadyRun,

    #[error("Invalid device identifier: {0:?}")]
    InvalidDeviceId(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    #[error("Failed to write log output: {0}")]
    Output(std::io::Error),
}

/// Result type alias for devlogs operations
pub type Result<T> = std::result::Result<T, LogsError>;
