// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Field names are camelCase on the wire, except
//! `session_id` which the checkout return URL carries verbatim.
//!
//! Required request fields are modelled as `Option` so handlers can answer
//! with the service's fixed 400 messages instead of the extractor's
//! generic rejection.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::storage::Certificate;

// =============================================================================
// Portfolio Models
// =============================================================================

/// One normalized token holding.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioBalance {
    /// Display name of the token.
    pub token: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Amount in token-native units, rounded to 4 decimals.
    pub amount: f64,
    /// USD value, rounded to 2 decimals.
    pub value: f64,
    /// Network name (e.g. `Ethereum`, `Solana`, `Bitcoin`).
    pub chain: String,
    /// Token contract, mint, or native marker.
    pub address: String,
    /// Token logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

/// Aggregated holdings for one address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub balances: Vec<PortfolioBalance>,
    /// USD total, rounded to 2 decimals.
    pub total_value: f64,
}

impl PortfolioSummary {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Request body for the portfolio endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PortfolioRequest {
    /// Wallet address to look up.
    #[serde(default)]
    pub address: Option<String>,
    /// Solana cluster (`mainnet-beta` or `devnet`). Ignored by other chains.
    #[serde(default)]
    pub cluster: Option<String>,
}

// =============================================================================
// Checkout Models
// =============================================================================

/// Request to start a hosted checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Holder name as typed by the user.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub balances: Vec<PortfolioBalance>,
    #[serde(default)]
    pub total_value: Option<f64>,
}

/// Hosted checkout created at the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CheckoutResponse {
    /// Provider session identifier.
    pub id: String,
    /// Redirect URL for the hosted payment page.
    pub url: String,
}

/// Request to confirm a returning checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VerifySessionRequest {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

/// Portfolio data carried across the checkout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub wallet_address: String,
    pub holder_name: String,
    pub balances: Vec<PortfolioBalance>,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct VerifySessionResponse {
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SessionMetadata>,
}

// =============================================================================
// Certificate Models
// =============================================================================

/// Request to issue a certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
    #[serde(default)]
    pub total_value: Option<f64>,
    #[serde(default)]
    pub balances: Vec<PortfolioBalance>,
    /// Human-readable issue date. Server clock is used when absent.
    #[serde(default)]
    pub issue_date: Option<String>,
    /// Human-readable verification timestamp. Server clock is used when absent.
    #[serde(default)]
    pub verification_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateResponse {
    pub success: bool,
    pub certificate_id: String,
    pub certificate: Certificate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CertificateResponse {
    pub success: bool,
    pub certificate: Certificate,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Certificate identifier.
    pub id: Option<String>,
}

/// Certificate fields needed to regenerate the PDF client-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub certificate_id: String,
    pub wallet_address: String,
    pub holder_name: String,
    pub total_value: f64,
    pub balances: Vec<PortfolioBalance>,
    pub issue_date: String,
    pub verification_date: String,
    pub certificate_hash: String,
}

impl From<&Certificate> for CertificatePayload {
    fn from(certificate: &Certificate) -> Self {
        Self {
            certificate_id: certificate.certificate_id.clone(),
            wallet_address: certificate.wallet_address.clone(),
            holder_name: certificate.holder_name.clone(),
            total_value: certificate.total_value,
            balances: certificate.balances.clone(),
            issue_date: certificate.issue_date.clone(),
            verification_date: certificate.verification_date.clone(),
            certificate_hash: certificate.certificate_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCertificateResponse {
    pub success: bool,
    pub certificate: CertificatePayload,
    /// Public verification page for this certificate.
    pub verification_url: String,
    /// QR code encoding `verification_url`, as an SVG document.
    pub qr_code_svg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn balance_uses_camel_case_and_omits_missing_image() {
        let balance = PortfolioBalance {
            token: "Bitcoin".into(),
            symbol: "BTC".into(),
            amount: 0.5,
            value: 30000.0,
            chain: "Bitcoin".into(),
            address: "bc1qexample".into(),
            img_url: None,
        };
        let value = serde_json::to_value(&balance).unwrap();
        assert!(value.get("imgUrl").is_none());

        let with_image = PortfolioBalance {
            img_url: Some("https://example.com/btc.png".into()),
            ..balance
        };
        let value = serde_json::to_value(&with_image).unwrap();
        assert_eq!(value["imgUrl"], "https://example.com/btc.png");
    }

    #[test]
    fn certificate_request_tolerates_missing_fields() {
        let request: CreateCertificateRequest =
            serde_json::from_value(json!({ "walletAddress": "0xabc" })).unwrap();
        assert_eq!(request.wallet_address.as_deref(), Some("0xabc"));
        assert!(request.holder_name.is_none());
        assert!(request.balances.is_empty());
    }

    #[test]
    fn verify_session_request_reads_snake_case_id() {
        let request: VerifySessionRequest =
            serde_json::from_value(json!({ "session_id": "cs_test_123" })).unwrap();
        assert_eq!(request.session_id.as_deref(), Some("cs_test_123"));
    }
}
