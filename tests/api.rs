// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end checks through the assembled router.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use walletscan_server::{
    api::router,
    config::AppConfig,
    models::PortfolioSummary,
    portfolio::{BalanceAggregator, ChainFamily, PortfolioError, SolanaCluster},
    providers::{CheckoutSession, CheckoutSessionRequest, PaymentProvider, PaymentStatus, StripeError},
    state::AppState,
    storage::Database,
};

struct EmptyPortfolio;

#[async_trait]
impl BalanceAggregator for EmptyPortfolio {
    async fn fetch(
        &self,
        _family: ChainFamily,
        _address: &str,
        _cluster: SolanaCluster,
    ) -> Result<PortfolioSummary, PortfolioError> {
        Ok(PortfolioSummary::empty())
    }
}

struct PaidCheckout;

#[async_trait]
impl PaymentProvider for PaidCheckout {
    async fn create_checkout_session(
        &self,
        _request: CheckoutSessionRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        Ok(CheckoutSession {
            id: "cs_test_integration".to_string(),
            url: "https://checkout.stripe.com/c/pay/cs_test_integration".to_string(),
        })
    }

    async fn retrieve_payment_status(&self, _session_id: &str) -> Result<PaymentStatus, StripeError> {
        Ok(PaymentStatus::Paid)
    }
}

fn app_with(public_app_url: Option<&str>) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open(&dir.path().join("api.redb")).unwrap());
    let config = AppConfig {
        public_app_url: public_app_url.map(str::to_string),
        ..AppConfig::default()
    };
    let state = AppState::new(config, db, Arc::new(EmptyPortfolio), Arc::new(PaidCheckout));
    (router(state), dir)
}

fn app() -> (Router, tempfile::TempDir) {
    app_with(Some("https://wallet-scan.io"))
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(text)
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    send_raw(app, method, uri, body.map(|value| value.to_string())).await
}

fn error_message(body: &[u8]) -> String {
    let error: Value = serde_json::from_slice(body).unwrap();
    error["error"].as_str().unwrap().to_string()
}

fn certificate_body(holder_name: &str) -> Value {
    json!({
        "walletAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
        "holderName": holder_name,
        "totalValue": 175.5,
        "balances": [{
            "token": "USD Coin",
            "symbol": "USDC",
            "amount": 175.5,
            "value": 175.5,
            "chain": "Base",
            "address": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
        }]
    })
}

#[tokio::test]
async fn certificate_round_trip() {
    let (app, _dir) = app();

    let (status, body) = send(&app, Method::POST, "/api/certificates", Some(certificate_body("Alice"))).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["success"], true);
    let id = created["certificateId"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/certificates/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["certificate"], created["certificate"]);
    assert_eq!(fetched["certificate"]["holderName"], "Alice");
}

#[tokio::test]
async fn empty_holder_name_is_rejected() {
    let (app, _dir) = app();
    let (status, body) = send(&app, Method::POST, "/api/certificates", Some(certificate_body(""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "Missing required fields");
}

#[tokio::test]
async fn unknown_certificate_is_not_found() {
    let (app, _dir) = app();
    let (status, body) = send(&app, Method::GET, "/api/certificates/CP-00000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "Certificate not found");
}

#[tokio::test]
async fn verify_page_for_unknown_id_is_html_404() {
    let (app, _dir) = app();
    let (status, body) = send(&app, Method::GET, "/verify/CP-00000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().contains("Certificate not found"));
}

#[tokio::test]
async fn checkout_then_verify_returns_metadata() {
    let (app, _dir) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(json!({
            "walletAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            "name": "Alice",
            "balances": [],
            "totalValue": 0.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(session["id"], "cs_test_integration");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/verify-session",
        Some(json!({ "session_id": "cs_test_integration" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let verified: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(verified["paid"], true);
    assert_eq!(verified["metadata"]["walletAddress"], "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
}

#[tokio::test]
async fn portfolio_detects_evm_address() {
    let (app, _dir) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/portfolio",
        Some(json!({ "address": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["balances"], json!([]));
    assert_eq!(summary["totalValue"], 0.0);
}

#[tokio::test]
async fn liveness_is_ok() {
    let (app, _dir) = app();
    let (status, _) = send(&app, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mistyped_field_gets_json_error_body() {
    let (app, _dir) = app();
    let mut body = certificate_body("Alice");
    body["totalValue"] = json!("100");

    let (status, body) = send(&app, Method::POST, "/api/certificates", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid request body");
}

#[tokio::test]
async fn malformed_json_gets_json_error_body() {
    let (app, _dir) = app();
    for uri in ["/api/certificates", "/api/checkout", "/api/portfolio"] {
        let (status, body) = send_raw(&app, Method::POST, uri, Some("not json".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(error_message(&body), "Invalid request body", "{uri}");
    }
}

#[tokio::test]
async fn missing_content_type_gets_json_error_body() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/certificates")
        .body(Body::from(certificate_body("Alice").to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(error_message(&bytes), "Invalid request body");
}

#[tokio::test]
async fn links_without_app_url_fail_loudly() {
    let (app, _dir) = app_with(None);
    let (status, body) = send(&app, Method::POST, "/api/certificates", Some(certificate_body("Alice"))).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&body).unwrap();
    let id = created["certificateId"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/download-certificate?id={id}"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Application URL is not configured");
    assert!(!String::from_utf8(body).unwrap().contains("localhost"));

    let (status, body) = send(&app, Method::GET, &format!("/verify/{id}"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("Unable to load certificate"));
    assert!(!page.contains("Certificate not found"));
}
