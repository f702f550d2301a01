//! PayU hosted-checkout gateway adapter.
//!
//! Signs outbound redirect payloads and authenticates inbound notifications
//! with the merchant credentials. Construction fails loudly on missing
//! credentials; there is no fallback to an unsigned request.

use secrecy::ExposeSecret;

use crate::config::GatewayConfig;
use crate::domain::foundation::format_amount;
use crate::domain::payments::{GatewayHasher, GatewayNotification, PaymentError};
use crate::ports::{PaymentGateway, RedirectPayload, RedirectRequest};

/// Provider label recorded on orders and webhook rows.
const PROVIDER: &str = "payu";

/// PayU implementation of the PaymentGateway port.
///
/// Holds the merchant key and the hasher built from the salt. No `Debug`
/// impl; the credentials never appear in logs.
pub struct PayuGateway {
    merchant_key: String,
    hasher: GatewayHasher,
    success_url: String,
    failure_url: String,
}

impl PayuGateway {
    /// Creates a gateway adapter from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayMisconfigured` when the key or salt is blank. This
    /// runs at startup so a bad deployment fails before taking traffic.
    pub fn new(config: &GatewayConfig) -> Result<Self, PaymentError> {
        if config.merchant_key.trim().is_empty() {
            return Err(PaymentError::gateway_misconfigured(
                "merchant key is not set",
            ));
        }
        let salt = config.merchant_salt.expose_secret();
        if salt.trim().is_empty() {
            return Err(PaymentError::gateway_misconfigured(
                "merchant salt is not set",
            ));
        }

        Ok(Self {
            merchant_key: config.merchant_key.clone(),
            hasher: GatewayHasher::new(config.merchant_key.clone(), salt.clone()),
            success_url: config.success_url.clone(),
            failure_url: config.failure_url.clone(),
        })
    }
}

impl PaymentGateway for PayuGateway {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn build_redirect(&self, request: RedirectRequest) -> RedirectPayload {
        // The hash covers the exact amount string the form carries.
        let amount = format_amount(request.amount);
        let hash = self.hasher.generate_payment_hash(
            &request.txnid,
            request.amount,
            &request.productinfo,
            &request.firstname,
            &request.email,
        );

        RedirectPayload {
            key: self.merchant_key.clone(),
            txnid: request.txnid,
            amount,
            productinfo: request.productinfo,
            firstname: request.firstname,
            email: request.email,
            phone: request.phone,
            surl: self.success_url.clone(),
            furl: self.failure_url.clone(),
            hash,
        }
    }

    fn verify_notification(&self, notification: &GatewayNotification) -> Result<(), PaymentError> {
        if notification.verify_against(&self.hasher) {
            Ok(())
        } else {
            Err(PaymentError::hash_mismatch())
        }
    }
}
