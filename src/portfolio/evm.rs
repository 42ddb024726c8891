// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM balances via the Zapper GraphQL API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{lenient_f64, non_empty, read_json, round_amount, round_usd, PortfolioError};
use crate::config::ZAPPER_API_KEY_ENV;
use crate::models::{PortfolioBalance, PortfolioSummary};

const PORTFOLIO_QUERY: &str = r#"query Portfolio($addresses: [Address!]!, $first: Int!) {
  portfolioV2(addresses: $addresses) {
    tokenBalances {
      totalBalanceUSD
      byToken(first: $first) {
        totalCount
        edges {
          node {
            name
            symbol
            price
            tokenAddress
            imgUrlV2
            decimals
            balanceRaw
            balance
            balanceUSD
            network {
              name
            }
          }
        }
      }
    }
  }
}"#;

/// Number of token edges requested per address.
const TOKENS_PER_PAGE: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ZapperClient {
    api_url: String,
    api_key: Option<String>,
    http: Client,
}

impl ZapperClient {
    pub fn new(api_url: &str, api_key: Option<String>) -> Result<Self, PortfolioError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortfolioError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_url: api_url.to_string(),
            api_key,
            http,
        })
    }

    pub async fn fetch_portfolio(&self, address: &str) -> Result<PortfolioSummary, PortfolioError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PortfolioError::MissingConfig(ZAPPER_API_KEY_ENV))?;

        let payload = json!({
            "query": PORTFOLIO_QUERY,
            "variables": {
                "addresses": [address],
                "first": TOKENS_PER_PAGE,
            }
        });

        let response = self
            .http
            .post(&self.api_url)
            .header("x-zapper-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortfolioError::Request(format!("Zapper POST failed: {e}")))?;

        let body: ZapperResponse = read_json(response, "Zapper").await?;
        normalize_zapper_response(body)
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ZapperResponse {
    #[serde(default)]
    data: Option<ZapperData>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ZapperData {
    #[serde(rename = "portfolioV2")]
    portfolio_v2: Option<PortfolioV2>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioV2 {
    token_balances: Option<TokenBalances>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalances {
    #[serde(rename = "totalBalanceUSD", default, deserialize_with = "lenient_f64")]
    total_balance_usd: Option<f64>,
    by_token: Option<ByToken>,
}

#[derive(Debug, Deserialize)]
struct ByToken {
    #[serde(default)]
    edges: Vec<TokenEdge>,
}

#[derive(Debug, Deserialize)]
struct TokenEdge {
    node: TokenNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenNode {
    name: Option<String>,
    symbol: Option<String>,
    token_address: Option<String>,
    img_url_v2: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    balance: Option<f64>,
    #[serde(rename = "balanceUSD", default, deserialize_with = "lenient_f64")]
    balance_usd: Option<f64>,
    network: Option<Network>,
}

#[derive(Debug, Deserialize)]
struct Network {
    name: Option<String>,
}

fn has_errors(errors: &Option<Value>) -> bool {
    match errors {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Map Zapper token edges to balance records.
///
/// The total is the upstream `totalBalanceUSD`, not the sum of the edges:
/// the aggregate covers tokens beyond the requested page.
pub(crate) fn normalize_zapper_response(
    response: ZapperResponse,
) -> Result<PortfolioSummary, PortfolioError> {
    if has_errors(&response.errors) {
        let errors = response.errors.unwrap_or(Value::Null);
        return Err(PortfolioError::Upstream(errors.to_string()));
    }

    let token_balances = response
        .data
        .and_then(|d| d.portfolio_v2)
        .and_then(|p| p.token_balances);

    let Some(token_balances) = token_balances else {
        return Ok(PortfolioSummary::empty());
    };

    let edges = token_balances.by_token.map(|b| b.edges).unwrap_or_default();
    let balances = edges
        .into_iter()
        .map(|edge| {
            let node = edge.node;
            PortfolioBalance {
                token: node.name.unwrap_or_default(),
                symbol: node.symbol.unwrap_or_default(),
                amount: round_amount(node.balance.unwrap_or(0.0)),
                value: round_usd(node.balance_usd.unwrap_or(0.0)),
                chain: node.network.and_then(|n| n.name).unwrap_or_default(),
                address: node.token_address.unwrap_or_default(),
                img_url: non_empty(node.img_url_v2),
            }
        })
        .collect();

    Ok(PortfolioSummary {
        balances,
        total_value: round_usd(token_balances.total_balance_usd.unwrap_or(0.0)),
    })
}
