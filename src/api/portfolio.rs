// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance lookup endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::error;

use super::ApiJson;
use crate::{
    error::{messages, ApiError},
    models::{PortfolioRequest, PortfolioSummary},
    portfolio::{detect_chain_family, ChainFamily, SolanaCluster},
    state::AppState,
};

fn required_address(request: &PortfolioRequest) -> Result<&str, ApiError> {
    request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request(messages::ADDRESS_REQUIRED))
}

async fn fetch(
    state: &AppState,
    family: ChainFamily,
    address: &str,
    cluster: Option<&str>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let cluster = SolanaCluster::from_param(cluster);
    state
        .portfolio
        .fetch(family, address, cluster)
        .await
        .map(Json)
        .map_err(|e| {
            error!(chain = %family, address = %address, error = %e, "Portfolio fetch failed");
            ApiError::internal(format!("Failed to fetch {} portfolio", family.display_name()))
        })
}

/// Fetch balances for an address on a named chain family.
#[utoipa::path(
    post,
    path = "/api/portfolio/{chain}",
    tag = "Portfolio",
    params(
        ("chain" = String, Path, description = "Chain family: evm, solana or bitcoin")
    ),
    request_body = PortfolioRequest,
    responses(
        (status = 200, description = "Normalized balances", body = PortfolioSummary),
        (status = 400, description = "Missing address or unsupported chain"),
        (status = 500, description = "Upstream indexer failure")
    )
)]
pub async fn chain_portfolio(
    State(state): State<AppState>,
    Path(chain): Path<String>,
    ApiJson(request): ApiJson<PortfolioRequest>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let family: ChainFamily = chain
        .parse()
        .map_err(|_| ApiError::bad_request(messages::UNSUPPORTED_CHAIN))?;
    let address = required_address(&request)?;

    fetch(&state, family, address, request.cluster.as_deref()).await
}

/// Fetch balances, choosing the chain family from the address shape.
///
/// The shape check only selects which indexer to query.
#[utoipa::path(
    post,
    path = "/api/portfolio",
    tag = "Portfolio",
    request_body = PortfolioRequest,
    responses(
        (status = 200, description = "Normalized balances", body = PortfolioSummary),
        (status = 400, description = "Missing or unrecognised address"),
        (status = 500, description = "Upstream indexer failure")
    )
)]
pub async fn detect_portfolio(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PortfolioRequest>,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let address = required_address(&request)?;
    let family = detect_chain_family(address)
        .ok_or_else(|| ApiError::bad_request(messages::UNSUPPORTED_ADDRESS))?;

    fetch(&state, family, address, request.cluster.as_deref()).await
}
