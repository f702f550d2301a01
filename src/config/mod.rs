//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `GATHERPAY`
//! prefix and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gatherpay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod gateway;
mod payments;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use payments::PaymentsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment gateway credentials and callback URLs
    pub gateway: GatewayConfig,

    /// Order lifecycle tunables (TTLs, platform fee, currency)
    #[serde(default)]
    pub payments: PaymentsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads environment variables
    /// with the `GATHERPAY` prefix, using `__` to separate nested values.
    ///
    /// # Environment Variable Format
    ///
    /// - `GATHERPAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GATHERPAY__DATABASE__URL=...` -> `database.url = ...`
    /// - `GATHERPAY__GATEWAY__MERCHANT_KEY=...` -> `gateway.merchant_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GATHERPAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate()?;
        self.payments.validate()?;

        // Plain-http callbacks are only acceptable outside production
        if self.server.is_production()
            && (!self.gateway.success_url.starts_with("https://")
                || !self.gateway.failure_url.starts_with("https://"))
        {
            return Err(ValidationError::CallbackMustBeHttps);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var("GATHERPAY__DATABASE__URL", "postgresql://test@localhost/gatherpay");
        env::set_var("GATHERPAY__GATEWAY__MERCHANT_KEY", "gtKFFx");
        env::set_var("GATHERPAY__GATEWAY__MERCHANT_SALT", "eCwWELxi");
        env::set_var("GATHERPAY__GATEWAY__SUCCESS_URL", "https://pay.example.com/success");
        env::set_var("GATHERPAY__GATEWAY__FAILURE_URL", "https://pay.example.com/failure");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("GATHERPAY__DATABASE__URL");
        env::remove_var("GATHERPAY__GATEWAY__MERCHANT_KEY");
        env::remove_var("GATHERPAY__GATEWAY__MERCHANT_SALT");
        env::remove_var("GATHERPAY__GATEWAY__SUCCESS_URL");
        env::remove_var("GATHERPAY__GATEWAY__FAILURE_URL");
        env::remove_var("GATHERPAY__SERVER__PORT");
        env::remove_var("GATHERPAY__SERVER__ENVIRONMENT");
        env::remove_var("GATHERPAY__PAYMENTS__RESERVATION_TTL_MINUTES");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/gatherpay");
        assert_eq!(config.gateway.merchant_key, "gtKFFx");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_payment_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payments.currency, "INR");
        assert_eq!(config.payments.reservation_ttl_minutes, 15);
        assert_eq!(config.payments.order_ttl_minutes, 10);
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GATHERPAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_production_rejects_plain_http_callbacks() {
        let config = AppConfig {
            server: ServerConfig {
                environment: Environment::Production,
                ..Default::default()
            },
            database: DatabaseConfig {
                url: "postgresql://user@localhost/gatherpay".to_string(),
                ..Default::default()
            },
            gateway: GatewayConfig {
                merchant_key: "gtKFFx".to_string(),
                merchant_salt: secrecy::SecretString::new("eCwWELxi".to_string()),
                success_url: "http://pay.example.com/success".to_string(),
                failure_url: "https://pay.example.com/failure".to_string(),
            },
            payments: PaymentsConfig::default(),
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::CallbackMustBeHttps)
        ));
    }

    #[test]
    fn test_custom_reservation_ttl() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("GATHERPAY__PAYMENTS__RESERVATION_TTL_MINUTES", "30");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payments.reservation_ttl_minutes, 30);
    }
}
