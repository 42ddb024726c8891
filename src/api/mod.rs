// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::FromRequest,
    http::{header::ORIGIN, HeaderMap},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{messages, ApiError},
    models::{
        CertificatePayload, CertificateResponse, CheckoutRequest, CheckoutResponse,
        CreateCertificateRequest, CreateCertificateResponse, DownloadCertificateResponse,
        PortfolioBalance, PortfolioRequest, PortfolioSummary, SessionMetadata,
        VerifySessionRequest, VerifySessionResponse,
    },
    state::AppState,
    storage::Certificate,
};

pub mod certificates;
pub mod checkout;
pub mod health;
pub mod pages;
pub mod portfolio;

/// JSON body extractor whose rejections use the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Public origin for redirect and verification links.
///
/// The configured public URL wins, then the request's `Origin` header.
/// With neither, links cannot be built and the request fails.
pub(crate) fn request_origin(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    state
        .config
        .public_app_url
        .as_deref()
        .or_else(|| headers.get(ORIGIN).and_then(|v| v.to_str().ok()))
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error!("No public app URL configured and no Origin header on request");
            ApiError::internal(messages::APP_URL_UNAVAILABLE)
        })
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/portfolio", post(portfolio::detect_portfolio))
        .route("/portfolio/{chain}", post(portfolio::chain_portfolio))
        .route("/checkout", post(checkout::create_checkout))
        .route("/verify-session", post(checkout::verify_session))
        .route("/certificates", post(certificates::create_certificate))
        .route("/certificates/{id}", get(certificates::get_certificate))
        .route(
            "/download-certificate",
            get(certificates::download_certificate),
        );

    let app_routes = Router::new()
        .nest("/api", api_routes)
        .route("/verify/{id}", get(pages::verify_page))
        .route("/download/{id}", get(pages::download_page))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        portfolio::detect_portfolio,
        portfolio::chain_portfolio,
        checkout::create_checkout,
        checkout::verify_session,
        certificates::create_certificate,
        certificates::get_certificate,
        certificates::download_certificate,
        pages::verify_page,
        pages::download_page,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            PortfolioBalance,
            PortfolioSummary,
            PortfolioRequest,
            CheckoutRequest,
            CheckoutResponse,
            VerifySessionRequest,
            VerifySessionResponse,
            SessionMetadata,
            Certificate,
            CertificatePayload,
            CreateCertificateRequest,
            CreateCertificateResponse,
            CertificateResponse,
            DownloadCertificateResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Portfolio", description = "Balance aggregation across EVM, Solana and Bitcoin"),
        (name = "Checkout", description = "Hosted payment for certificate issuance"),
        (name = "Certificates", description = "Certificate issuance and lookup"),
        (name = "Pages", description = "Public certificate pages"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
