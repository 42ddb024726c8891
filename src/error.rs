// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

/// Fixed client-facing error messages.
pub mod messages {
    pub const ADDRESS_REQUIRED: &str = "Address is required";
    pub const UNSUPPORTED_ADDRESS: &str = "Unsupported address format";
    pub const UNSUPPORTED_CHAIN: &str = "Unsupported chain";
    pub const MISSING_FIELDS: &str = "Missing required fields";
    pub const INVALID_TOTAL: &str = "Invalid total value";
    pub const SESSION_ID_REQUIRED: &str = "Session ID is required";
    pub const CERTIFICATE_ID_REQUIRED: &str = "Certificate ID is required";
    pub const CERTIFICATE_NOT_FOUND: &str = "Certificate not found";
    pub const SESSION_DATA_NOT_FOUND: &str = "Session data not found";
    pub const CHECKOUT_FAILED: &str = "Failed to create checkout session";
    pub const VERIFY_SESSION_FAILED: &str = "Failed to verify session";
    pub const CREATE_CERTIFICATE_FAILED: &str = "Failed to create certificate";
    pub const FETCH_CERTIFICATE_FAILED: &str = "Failed to fetch certificate";
    pub const INVALID_BODY: &str = "Invalid request body";
    pub const APP_URL_UNAVAILABLE: &str = "Application URL is not configured";
}

/// Error returned to API clients.
///
/// The message is always a fixed, client-safe string. Upstream and storage
/// details are logged where the error is mapped, never echoed here.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// Malformed or mistyped JSON bodies are client errors with a fixed message.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(rejection = %rejection.body_text(), "Rejected request body");
        Self::bad_request(messages::INVALID_BODY)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
