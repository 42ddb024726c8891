// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stripe hosted checkout integration.
//!
//! Only two calls are used: creating a single fixed-price Checkout Session
//! and reading its `payment_status` back after the user returns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::{StripeConfig, STRIPE_PRICE_ID_ENV, STRIPE_SECRET_KEY_ENV};

/// Stripe rejects metadata values longer than this.
pub const METADATA_VALUE_LIMIT: usize = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    #[error("Stripe configuration missing: {0}")]
    MissingConfig(&'static str),

    #[error("Stripe request failed: {0}")]
    Request(String),

    #[error("Stripe response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    /// Completed checkout that needs no payment (e.g. a 100% coupon).
    NoPaymentRequired,
}

/// Input for a hosted checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest<'a> {
    pub wallet_address: &'a str,
    pub holder_name: &'a str,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment processor seam used by checkout and verification.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest<'_>,
    ) -> Result<CheckoutSession, StripeError>;

    async fn retrieve_payment_status(&self, session_id: &str)
        -> Result<PaymentStatus, StripeError>;
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    api_base_url: String,
    secret_key: Option<String>,
    price_id: Option<String>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StripeError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            price_id: config.price_id.clone(),
            http,
        })
    }

    fn secret_key(&self) -> Result<&str, StripeError> {
        self.secret_key
            .as_deref()
            .ok_or(StripeError::MissingConfig(STRIPE_SECRET_KEY_ENV))
    }

    async fn read_session(
        &self,
        response: reqwest::Response,
        label: &str,
    ) -> Result<SessionObject, StripeError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Request(format!(
                "{label} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StripeError::InvalidResponse(format!("{label} invalid JSON: {e}")))
    }
}

/// Form fields for `POST /v1/checkout/sessions`.
fn checkout_form(price_id: &str, request: &CheckoutSessionRequest<'_>) -> Vec<(String, String)> {
    vec![
        ("mode".into(), "payment".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("line_items[0][price]".into(), price_id.to_string()),
        ("line_items[0][quantity]".into(), "1".into()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        (
            "metadata[walletAddress]".into(),
            truncate_metadata(request.wallet_address),
        ),
        (
            "metadata[holderName]".into(),
            truncate_metadata(request.holder_name),
        ),
    ]
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let secret_key = self.secret_key()?;
        let price_id = self
            .price_id
            .as_deref()
            .ok_or(StripeError::MissingConfig(STRIPE_PRICE_ID_ENV))?;

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base_url))
            .bearer_auth(secret_key)
            .form(&checkout_form(price_id, &request))
            .send()
            .await
            .map_err(|e| StripeError::Request(format!("POST checkout session failed: {e}")))?;

        let session = self.read_session(response, "POST checkout session").await?;
        let url = session.url.ok_or_else(|| {
            StripeError::InvalidResponse("missing checkout url in response".to_string())
        })?;

        info!(session_id = %session.id, "Stripe checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_payment_status(
        &self,
        session_id: &str,
    ) -> Result<PaymentStatus, StripeError> {
        let secret_key = self.secret_key()?;

        let mut url = url::Url::parse(&self.api_base_url)
            .map_err(|e| StripeError::Request(format!("invalid Stripe base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StripeError::Request("Stripe base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v1", "checkout", "sessions", session_id]);

        let response = self
            .http
            .get(url)
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| StripeError::Request(format!("GET checkout session failed: {e}")))?;

        let session = self.read_session(response, "GET checkout session").await?;
        let raw = session.payment_status.ok_or_else(|| {
            StripeError::InvalidResponse("missing payment_status in response".to_string())
        })?;
        Ok(map_payment_status(&raw))
    }
}

pub fn map_payment_status(raw_status: &str) -> PaymentStatus {
    match raw_status.trim().to_ascii_lowercase().as_str() {
        "paid" => PaymentStatus::Paid,
        "no_payment_required" => PaymentStatus::NoPaymentRequired,
        _ => PaymentStatus::Unpaid,
    }
}

/// Cut a metadata value to the provider limit on a char boundary.
pub fn truncate_metadata(value: &str) -> String {
    value.chars().take(METADATA_VALUE_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_mapping_is_stable() {
        assert_eq!(map_payment_status("paid"), PaymentStatus::Paid);
        assert_eq!(map_payment_status("PAID"), PaymentStatus::Paid);
        assert_eq!(map_payment_status("unpaid"), PaymentStatus::Unpaid);
        assert_eq!(
            map_payment_status("no_payment_required"),
            PaymentStatus::NoPaymentRequired
        );
        assert_eq!(map_payment_status("something_new"), PaymentStatus::Unpaid);
    }

    #[test]
    fn metadata_is_truncated_on_char_boundary() {
        let long = "é".repeat(METADATA_VALUE_LIMIT + 20);
        let truncated = truncate_metadata(&long);
        assert_eq!(truncated.chars().count(), METADATA_VALUE_LIMIT);
        assert_eq!(truncate_metadata("Alice"), "Alice");
    }

    #[test]
    fn checkout_form_carries_fixed_price_and_metadata() {
        let request = CheckoutSessionRequest {
            wallet_address: "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            holder_name: "Alice",
            success_url: "https://wallet-scan.io/success?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "https://wallet-scan.io/cancel".into(),
        };
        let form = checkout_form("price_123", &request);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price]"), Some("price_123"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("metadata[holderName]"), Some("Alice"));
        assert_eq!(
            get("success_url"),
            Some("https://wallet-scan.io/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[tokio::test]
    async fn missing_secret_key_is_a_config_error() {
        let client = StripeClient::new(&StripeConfig {
            api_base_url: "http://127.0.0.1:9".into(),
            secret_key: None,
            price_id: Some("price_123".into()),
        })
        .unwrap();

        let result = client.retrieve_payment_status("cs_test_1").await;
        assert!(matches!(
            result,
            Err(StripeError::MissingConfig(STRIPE_SECRET_KEY_ENV))
        ));
    }
}
