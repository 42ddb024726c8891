// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Certificate issuance, lookup and download endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use tracing::error;

use super::{request_origin, ApiJson};
use crate::{
    certificates::{CertificateIssuer, IssueError},
    error::{messages, ApiError},
    models::{
        CertificateResponse, CreateCertificateRequest, CreateCertificateResponse,
        DownloadCertificateResponse, DownloadQuery,
    },
    render,
    state::AppState,
    storage::{Certificate, CertificateRepository, StorageError},
};

/// Look up a stored certificate, mapping a miss to 404.
fn load_certificate(state: &AppState, certificate_id: &str) -> Result<Certificate, ApiError> {
    CertificateRepository::new(&state.db)
        .get(certificate_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found(messages::CERTIFICATE_NOT_FOUND),
            other => {
                error!(certificate_id = %certificate_id, error = %other, "Certificate lookup failed");
                ApiError::internal(messages::FETCH_CERTIFICATE_FAILED)
            }
        })
}

/// Issue a new certificate.
#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "Certificates",
    request_body = CreateCertificateRequest,
    responses(
        (status = 200, description = "Certificate issued", body = CreateCertificateResponse),
        (status = 400, description = "Missing required fields or invalid total"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_certificate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCertificateRequest>,
) -> Result<Json<CreateCertificateResponse>, ApiError> {
    let certificate = CertificateIssuer::new(&state.db)
        .issue(request)
        .map_err(|e| match e {
            IssueError::InvalidInput(message) => ApiError::bad_request(message),
            other => {
                error!(error = %other, "Certificate issuance failed");
                ApiError::internal(messages::CREATE_CERTIFICATE_FAILED)
            }
        })?;

    Ok(Json(CreateCertificateResponse {
        success: true,
        certificate_id: certificate.certificate_id.clone(),
        certificate,
    }))
}

/// Fetch a certificate by id.
#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    tag = "Certificates",
    params(
        ("id" = String, Path, description = "Certificate identifier, e.g. CP-12345678")
    ),
    responses(
        (status = 200, description = "Stored certificate", body = CertificateResponse),
        (status = 404, description = "Certificate not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let certificate = load_certificate(&state, &id)?;
    Ok(Json(CertificateResponse {
        success: true,
        certificate,
    }))
}

/// Certificate data plus verification link and QR code for client-side PDF rendering.
#[utoipa::path(
    get,
    path = "/api/download-certificate",
    tag = "Certificates",
    params(DownloadQuery),
    responses(
        (status = 200, description = "Renderable certificate payload", body = DownloadCertificateResponse),
        (status = 400, description = "Certificate ID is required"),
        (status = 404, description = "Certificate not found"),
        (status = 500, description = "Storage, rendering or app URL failure")
    )
)]
pub async fn download_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadCertificateResponse>, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request(messages::CERTIFICATE_ID_REQUIRED))?;

    let certificate = load_certificate(&state, id)?;
    let origin = request_origin(&state, &headers)?;

    render::download_payload(&certificate, &origin)
        .map(Json)
        .map_err(|e| {
            error!(certificate_id = %id, error = %e, "Certificate rendering failed");
            ApiError::internal(messages::FETCH_CERTIFICATE_FAILED)
        })
}
