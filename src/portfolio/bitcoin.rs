// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bitcoin balances via blockchain.info, priced with CoinGecko.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{check_status, read_json, round_amount, round_usd, PortfolioError};
use crate::models::{PortfolioBalance, PortfolioSummary};

const SATS_PER_BTC: f64 = 1e8;
const BITCOIN_LOGO: &str = "https://cryptologos.cc/logos/bitcoin-btc-logo.png";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream calls needed for a Bitcoin balance lookup.
#[async_trait]
pub trait BitcoinApi: Send + Sync {
    /// Confirmed balance of `address`, in satoshis.
    async fn address_balance_sats(&self, address: &str) -> Result<u64, PortfolioError>;

    /// Spot price of one BTC in USD.
    async fn btc_usd_price(&self) -> Result<f64, PortfolioError>;
}

#[derive(Debug, Clone)]
pub struct BitcoinClient {
    blockchain_info_url: Url,
    coingecko_url: Url,
    http: Client,
}

fn parse_base(raw: &str) -> Result<Url, PortfolioError> {
    Url::parse(raw).map_err(|e| PortfolioError::Request(format!("invalid base URL {raw}: {e}")))
}

/// Append path segments to a base URL, keeping any existing base path.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, PortfolioError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PortfolioError::Request(format!("URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl BitcoinClient {
    pub fn new(blockchain_info_url: &str, coingecko_url: &str) -> Result<Self, PortfolioError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortfolioError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            blockchain_info_url: parse_base(blockchain_info_url)?,
            coingecko_url: parse_base(coingecko_url)?,
            http,
        })
    }

    fn balance_url(&self, address: &str) -> Result<Url, PortfolioError> {
        join_segments(&self.blockchain_info_url, &["q", "addressbalance", address])
    }

    fn price_url(&self) -> Result<Url, PortfolioError> {
        let mut url = join_segments(&self.coingecko_url, &["simple", "price"])?;
        url.query_pairs_mut()
            .append_pair("ids", "bitcoin")
            .append_pair("vs_currencies", "usd");
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    bitcoin: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: Option<f64>,
}

#[async_trait]
impl BitcoinApi for BitcoinClient {
    async fn address_balance_sats(&self, address: &str) -> Result<u64, PortfolioError> {
        let url = self.balance_url(address)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PortfolioError::Request(format!("blockchain.info GET failed: {e}")))?;

        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| PortfolioError::InvalidResponse(format!("blockchain.info body: {e}")))?;

        body.trim().parse().map_err(|_| {
            PortfolioError::InvalidResponse(format!("blockchain.info returned non-numeric balance: {body}"))
        })
    }

    async fn btc_usd_price(&self) -> Result<f64, PortfolioError> {
        let url = self.price_url()?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PortfolioError::Request(format!("CoinGecko GET failed: {e}")))?;

        let quote: SimplePrice = read_json(response, "CoinGecko").await?;
        Ok(quote.bitcoin.and_then(|q| q.usd).unwrap_or(0.0))
    }
}

/// Fetch the native BTC holding of `address`.
///
/// A zero balance returns an empty summary without querying the price.
pub async fn fetch_bitcoin_portfolio<A>(
    api: &A,
    address: &str,
) -> Result<PortfolioSummary, PortfolioError>
where
    A: BitcoinApi + ?Sized,
{
    let sats = api.address_balance_sats(address).await?;
    if sats == 0 {
        debug!(address = %address, "Bitcoin address has no balance");
        return Ok(PortfolioSummary::empty());
    }

    let btc = sats as f64 / SATS_PER_BTC;
    let price = api.btc_usd_price().await?;
    let value = round_usd(btc * price);

    Ok(PortfolioSummary {
        balances: vec![PortfolioBalance {
            token: "Bitcoin".to_string(),
            symbol: "BTC".to_string(),
            amount: round_amount(btc),
            value,
            chain: "Bitcoin".to_string(),
            address: address.to_string(),
            img_url: Some(BITCOIN_LOGO.to_string()),
        }],
        total_value: value,
    })
}
