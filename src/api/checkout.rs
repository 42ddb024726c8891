// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hosted checkout endpoints.

use axum::{extract::State, http::HeaderMap, Json};
use tracing::error;

use super::{request_origin, ApiJson};
use crate::{
    error::{messages, ApiError},
    models::{CheckoutRequest, CheckoutResponse, VerifySessionRequest, VerifySessionResponse},
    payments::{CheckoutInput, PaymentError, PaymentFlow, VerifyOutcome},
    state::AppState,
};

fn payment_flow(state: &AppState) -> PaymentFlow<'_> {
    PaymentFlow::new(
        state.payments.as_ref(),
        state.db.as_ref(),
        state.config.session_ttl,
    )
}

/// Start a hosted checkout for the reviewed portfolio.
#[utoipa::path(
    post,
    path = "/api/checkout",
    tag = "Checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Payment provider, storage or app URL failure")
    )
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let input = CheckoutInput::from_parts(
        request.wallet_address,
        request.name,
        request.balances,
        request.total_value,
    )
    .map_err(|e| match e {
        PaymentError::InvalidInput(message) => ApiError::bad_request(message),
        other => {
            error!(error = %other, "Checkout input rejected");
            ApiError::internal(messages::CHECKOUT_FAILED)
        }
    })?;

    let origin = request_origin(&state, &headers)?;
    let session = payment_flow(&state)
        .start_checkout(&origin, input)
        .await
        .map_err(|e| {
            error!(error = %e, "Checkout creation failed");
            ApiError::internal(messages::CHECKOUT_FAILED)
        })?;

    Ok(Json(CheckoutResponse {
        id: session.id,
        url: session.url,
    }))
}

/// Confirm a returning checkout and hand back the stored portfolio.
#[utoipa::path(
    post,
    path = "/api/verify-session",
    tag = "Checkout",
    request_body = VerifySessionRequest,
    responses(
        (status = 200, description = "Payment status, with metadata when paid", body = VerifySessionResponse),
        (status = 400, description = "Session ID is required"),
        (status = 404, description = "Paid, but session data expired or missing"),
        (status = 500, description = "Payment provider or storage failure")
    )
)]
pub async fn verify_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifySessionRequest>,
) -> Result<Json<VerifySessionResponse>, ApiError> {
    let session_id = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request(messages::SESSION_ID_REQUIRED))?;

    let outcome = payment_flow(&state)
        .verify_payment(session_id)
        .await
        .map_err(|e| match e {
            PaymentError::SessionNotFound(_) => {
                ApiError::not_found(messages::SESSION_DATA_NOT_FOUND)
            }
            other => {
                error!(session_id = %session_id, error = %other, "Session verification failed");
                ApiError::internal(messages::VERIFY_SESSION_FAILED)
            }
        })?;

    Ok(Json(match outcome {
        VerifyOutcome::Paid(metadata) => VerifySessionResponse {
            paid: true,
            metadata: Some(metadata),
        },
        VerifyOutcome::NotPaid => VerifySessionResponse {
            paid: false,
            metadata: None,
        },
    }))
}
