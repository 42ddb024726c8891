// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solana balances via the Helius DAS `getAssetsByOwner` method.
//!
//! One RPC call returns both the native SOL balance (under `nativeBalance`)
//! and the fungible token list (under `items`).

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{lenient_f64, non_empty, read_json, round_amount, round_usd, PortfolioError};
use crate::config::HELIUS_API_KEY_ENV;
use crate::models::{PortfolioBalance, PortfolioSummary};

pub const NATIVE_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
const NATIVE_SOL_LOGO: &str = "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/So11111111111111111111111111111111111111112/logo.png";
const LAMPORTS_PER_SOL: f64 = 1e9;
const SOLANA_CHAIN: &str = "Solana";

const RPC_REQUEST_ID: &str = "portfolio-fetch";
const PAGE_LIMIT: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Solana cluster to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolanaCluster {
    #[default]
    MainnetBeta,
    Devnet,
}

impl SolanaCluster {
    /// Parse the request's `cluster` field. Unknown values fall back to mainnet.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("devnet") => SolanaCluster::Devnet,
            _ => SolanaCluster::MainnetBeta,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaCluster::MainnetBeta => "mainnet-beta",
            SolanaCluster::Devnet => "devnet",
        }
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HeliusClient {
    mainnet_url: String,
    devnet_url: String,
    api_key: Option<String>,
    http: Client,
}

impl HeliusClient {
    pub fn new(
        mainnet_url: &str,
        devnet_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, PortfolioError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortfolioError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            mainnet_url: mainnet_url.to_string(),
            devnet_url: devnet_url.to_string(),
            api_key,
            http,
        })
    }

    fn endpoint(&self, cluster: SolanaCluster, api_key: &str) -> Result<Url, PortfolioError> {
        let base = match cluster {
            SolanaCluster::MainnetBeta => &self.mainnet_url,
            SolanaCluster::Devnet => &self.devnet_url,
        };
        let mut url = Url::parse(base)
            .map_err(|e| PortfolioError::Request(format!("invalid Helius URL {base}: {e}")))?;
        url.query_pairs_mut().append_pair("api-key", api_key);
        Ok(url)
    }

    pub async fn fetch_portfolio(
        &self,
        address: &str,
        cluster: SolanaCluster,
    ) -> Result<PortfolioSummary, PortfolioError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PortfolioError::MissingConfig(HELIUS_API_KEY_ENV))?;
        let url = self.endpoint(cluster, api_key)?;

        let payload = json!({
            "jsonrpc": "2.0",
            "id": RPC_REQUEST_ID,
            "method": "getAssetsByOwner",
            "params": {
                "ownerAddress": address,
                "displayOptions": {
                    "showFungible": true,
                    "showNativeBalance": true,
                },
                "limit": PAGE_LIMIT,
            }
        });

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortfolioError::Request(format!("Helius POST failed: {e}")))?;

        let body: RpcResponse = read_json(response, "Helius").await?;
        if let Some(error) = body.error {
            return Err(PortfolioError::Upstream(error.to_string()));
        }

        Ok(normalize_das_result(body.result.unwrap_or_default()))
    }
}

// =============================================================================
// DAS Response Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<DasResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DasResult {
    #[serde(default)]
    items: Vec<DasAsset>,
    native_balance: Option<NativeBalance>,
}

#[derive(Debug, Deserialize)]
struct NativeBalance {
    #[serde(default, deserialize_with = "lenient_f64")]
    lamports: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price_per_sol: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DasAsset {
    id: Option<String>,
    mint: Option<String>,
    interface: Option<String>,
    content: Option<AssetContent>,
    token_info: Option<TokenInfo>,
}

#[derive(Debug, Deserialize)]
struct AssetContent {
    metadata: Option<AssetMetadata>,
    links: Option<AssetLinks>,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    name: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetLinks {
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default, deserialize_with = "lenient_f64")]
    balance: Option<f64>,
    decimals: Option<u32>,
    symbol: Option<String>,
    price_info: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    #[serde(default, deserialize_with = "lenient_f64")]
    price_per_token: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_price: Option<f64>,
}

/// A zero or missing upstream total falls back to `amount * price`.
fn usd_value(total_price: Option<f64>, amount: f64, price: Option<f64>) -> f64 {
    match total_price {
        Some(total) if total != 0.0 && total.is_finite() => total,
        _ => amount * price.unwrap_or(0.0),
    }
}

fn native_sol(native: &NativeBalance) -> Option<(PortfolioBalance, f64)> {
    let amount = native.lamports.unwrap_or(0.0) / LAMPORTS_PER_SOL;
    if amount <= 0.0 {
        return None;
    }
    let value = usd_value(native.total_price, amount, native.price_per_sol);

    let balance = PortfolioBalance {
        token: "Solana".to_string(),
        symbol: "SOL".to_string(),
        amount: round_amount(amount),
        value: round_usd(value),
        chain: SOLANA_CHAIN.to_string(),
        address: NATIVE_SOL_MINT.to_string(),
        img_url: Some(NATIVE_SOL_LOGO.to_string()),
    };
    Some((balance, value))
}

fn fungible_token(asset: DasAsset) -> Option<(PortfolioBalance, f64)> {
    let is_fungible = asset
        .interface
        .as_deref()
        .is_some_and(|i| i.contains("Fungible"));
    if !is_fungible {
        return None;
    }

    let info = asset.token_info?;
    let raw = info.balance.filter(|b| *b != 0.0)?;
    let amount = raw / 10f64.powi(info.decimals.unwrap_or(0) as i32);
    let (price, total) = info
        .price_info
        .map(|p| (p.price_per_token, p.total_price))
        .unwrap_or((None, None));
    let value = usd_value(total, amount, price);

    let (metadata, image) = match asset.content {
        Some(content) => (content.metadata, content.links.and_then(|l| l.image)),
        None => (None, None),
    };
    let (meta_name, meta_symbol) = match metadata {
        Some(m) => (non_empty(m.name), non_empty(m.symbol)),
        None => (None, None),
    };
    let info_symbol = non_empty(info.symbol);

    let balance = PortfolioBalance {
        token: meta_name
            .or_else(|| info_symbol.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        symbol: info_symbol
            .or(meta_symbol)
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        amount: round_amount(amount),
        value: round_usd(value),
        chain: SOLANA_CHAIN.to_string(),
        address: non_empty(asset.id)
            .or_else(|| non_empty(asset.mint))
            .unwrap_or_default(),
        img_url: non_empty(image),
    };
    Some((balance, value))
}

/// Map a DAS result to balance records.
///
/// The total accumulates unrounded USD values and is rounded once at the end.
/// Holdings are returned sorted by USD value, largest first.
pub(crate) fn normalize_das_result(result: DasResult) -> PortfolioSummary {
    let mut balances = Vec::new();
    let mut total = 0.0;

    let native = result.native_balance.as_ref().and_then(native_sol);
    let tokens = result.items.into_iter().filter_map(fungible_token);

    for (balance, value) in native.into_iter().chain(tokens) {
        total += value;
        balances.push(balance);
    }

    balances.sort_by(|a, b| b.value.total_cmp(&a.value));

    PortfolioSummary {
        balances,
        total_value: round_usd(total),
    }
}
