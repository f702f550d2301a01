//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Gateway callback URL must be http(s): {0}")]
    InvalidCallbackUrl(&'static str),

    #[error("Gateway callback URLs must use HTTPS in production")]
    CallbackMustBeHttps,

    #[error("TTL must be positive: {0}")]
    InvalidTtl(&'static str),

    #[error("Platform fee percentage must be between 0 and 100")]
    InvalidFeePercentage,

    #[error("Currency code must not be empty")]
    InvalidCurrency,
}
