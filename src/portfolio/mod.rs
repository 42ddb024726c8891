// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Aggregation
//!
//! Fetches token balances for an address from the chain-appropriate
//! indexing API and normalizes them into [`PortfolioSummary`].
//!
//! | Chain family | Upstream | Total |
//! |--------------|----------|-------|
//! | EVM | Zapper GraphQL `portfolioV2` | upstream aggregate |
//! | Solana | Helius DAS `getAssetsByOwner` | summed locally |
//! | Bitcoin | blockchain.info + CoinGecko | single native record |
//!
//! Calls are sequential, never retried, and never cached. Amounts are
//! rounded to 4 decimals and USD values to 2 decimals, half away from zero.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::config::IndexerConfig;
use crate::models::PortfolioSummary;

pub mod bitcoin;
pub mod evm;
pub mod solana;

pub use bitcoin::{fetch_bitcoin_portfolio, BitcoinApi, BitcoinClient};
pub use evm::ZapperClient;
pub use solana::{HeliusClient, SolanaCluster};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("indexer configuration missing: {0}")]
    MissingConfig(&'static str),

    #[error("indexer request failed: {0}")]
    Request(String),

    #[error("indexer returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("indexer reported an error: {0}")]
    Upstream(String),

    #[error("indexer response was invalid: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Chain Families
// =============================================================================

/// Ledger ecosystem whose balance path is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
    Bitcoin,
}

impl ChainFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
            ChainFamily::Solana => "solana",
            ChainFamily::Bitcoin => "bitcoin",
        }
    }

    /// Name used in client-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Solana => "Solana",
            ChainFamily::Bitcoin => "Bitcoin",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" | "ethereum" => Ok(ChainFamily::Evm),
            "solana" => Ok(ChainFamily::Solana),
            "bitcoin" => Ok(ChainFamily::Bitcoin),
            other => Err(format!("unsupported chain family: {other}")),
        }
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn is_base58(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Guess the chain family from the shape of an address.
///
/// Best-effort only: legacy Bitcoin addresses and Solana public keys share
/// the base58 alphabet and overlap in length, so a 32-35 character string
/// starting with `1` or `3` is read as Bitcoin. Use the result to pick a
/// query path, never to authorize anything.
pub fn detect_chain_family(address: &str) -> Option<ChainFamily> {
    let address = address.trim();

    if address.starts_with("0x") || address.starts_with("0X") {
        return Address::from_str(address).ok().map(|_| ChainFamily::Evm);
    }

    let lower = address.to_ascii_lowercase();
    if lower.starts_with("bc1") || lower.starts_with("tb1") {
        let bech32_body = lower.chars().skip(3).all(|c| c.is_ascii_alphanumeric());
        return ((14..=74).contains(&address.len()) && bech32_body)
            .then_some(ChainFamily::Bitcoin);
    }

    if !is_base58(address) {
        return None;
    }

    if (address.starts_with('1') || address.starts_with('3')) && (26..=35).contains(&address.len())
    {
        return Some(ChainFamily::Bitcoin);
    }

    (32..=44)
        .contains(&address.len())
        .then_some(ChainFamily::Solana)
}

// =============================================================================
// Numeric Policy
// =============================================================================

fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a token amount for display (4 decimals).
pub fn round_amount(value: f64) -> f64 {
    round_to(value, 4)
}

/// Round a USD value (2 decimals).
pub fn round_usd(value: f64) -> f64 {
    round_to(value, 2)
}

/// Accept a JSON number, a numeric string, or null.
///
/// Indexers are inconsistent about whether balances arrive as strings.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Treat empty strings like missing values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Decode a JSON body, turning non-2xx statuses into errors.
///
/// The upstream body is kept in the error for server-side logging only.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    label: &str,
) -> Result<T, PortfolioError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|e| PortfolioError::InvalidResponse(format!("{label} invalid JSON: {e}")))
}

pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, PortfolioError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(PortfolioError::UpstreamStatus { status, body });
    }
    Ok(response)
}

// =============================================================================
// Aggregator
// =============================================================================

/// Fetches and normalizes holdings for one address.
#[async_trait]
pub trait BalanceAggregator: Send + Sync {
    async fn fetch(
        &self,
        family: ChainFamily,
        address: &str,
        cluster: SolanaCluster,
    ) -> Result<PortfolioSummary, PortfolioError>;
}

/// Production aggregator backed by the public indexing APIs.
pub struct PortfolioService {
    evm: ZapperClient,
    solana: HeliusClient,
    bitcoin: BitcoinClient,
}

impl PortfolioService {
    pub fn from_config(config: &IndexerConfig) -> Result<Self, PortfolioError> {
        Ok(Self {
            evm: ZapperClient::new(&config.zapper_api_url, config.zapper_api_key.clone())?,
            solana: HeliusClient::new(
                &config.helius_mainnet_url,
                &config.helius_devnet_url,
                config.helius_api_key.clone(),
            )?,
            bitcoin: BitcoinClient::new(&config.blockchain_info_url, &config.coingecko_api_url)?,
        })
    }
}

#[async_trait]
impl BalanceAggregator for PortfolioService {
    async fn fetch(
        &self,
        family: ChainFamily,
        address: &str,
        cluster: SolanaCluster,
    ) -> Result<PortfolioSummary, PortfolioError> {
        info!(chain = %family, address = %address, "Fetching portfolio");

        let summary = match family {
            ChainFamily::Evm => self.evm.fetch_portfolio(address).await?,
            ChainFamily::Solana => self.solana.fetch_portfolio(address, cluster).await?,
            ChainFamily::Bitcoin => fetch_bitcoin_portfolio(&self.bitcoin, address).await?,
        };

        info!(
            chain = %family,
            address = %address,
            holdings = summary.balances.len(),
            total_value = summary.total_value,
            "Portfolio fetched"
        );
        Ok(summary)
    }
}
