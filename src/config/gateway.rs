//! Payment gateway configuration
//!
//! Credentials for the hosted-checkout provider. The merchant salt signs
//! every outbound redirect and verifies every inbound webhook, so it is
//! held as a [`SecretString`] and never printed or persisted.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Gateway credentials and callback URLs
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant key issued by the gateway
    pub merchant_key: String,

    /// Merchant salt used for request signing
    pub merchant_salt: SecretString,

    /// URL the gateway redirects to after a successful payment
    pub success_url: String,

    /// URL the gateway redirects to after a failed payment
    pub failure_url: String,
}

impl GatewayConfig {
    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merchant_key.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_MERCHANT_KEY"));
        }
        if self.merchant_salt.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_MERCHANT_SALT"));
        }
        Self::validate_callback("success_url", &self.success_url)?;
        Self::validate_callback("failure_url", &self.failure_url)?;
        Ok(())
    }

    fn validate_callback(name: &'static str, url: &str) -> Result<(), ValidationError> {
        if url.is_empty() {
            return Err(ValidationError::InvalidCallbackUrl(name));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidCallbackUrl(name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            merchant_key: "gtKFFx".to_string(),
            merchant_salt: SecretString::new("eCwWELxi".to_string()),
            success_url: "https://pay.example.com/return/success".to_string(),
            failure_url: "https://pay.example.com/return/failure".to_string(),
        }
    }

    #[test]
    fn complete_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn blank_key_rejected() {
        let config = GatewayConfig {
            merchant_key: String::new(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("GATEWAY_MERCHANT_KEY"))
        ));
    }

    #[test]
    fn blank_salt_rejected() {
        let config = GatewayConfig {
            merchant_salt: SecretString::new(String::new()),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("GATEWAY_MERCHANT_SALT"))
        ));
    }

    #[test]
    fn non_http_callback_rejected() {
        let config = GatewayConfig {
            failure_url: "ftp://pay.example.com/failure".to_string(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCallbackUrl("failure_url"))
        ));
    }

    #[test]
    fn debug_output_redacts_salt() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("eCwWELxi"));
        assert!(rendered.contains("gtKFFx"));
    }
}
