// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public certificate pages. Anyone holding an id can open these.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};
use tracing::{error, warn};

use super::request_origin;
use crate::{
    render::{self, PageMode},
    state::AppState,
    storage::{CertificateRepository, StorageError},
};

fn unavailable() -> (StatusCode, Html<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render::render_unavailable_page()),
    )
}

fn render_page(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
    mode: PageMode,
) -> (StatusCode, Html<String>) {
    let certificate = match CertificateRepository::new(&state.db).get(id) {
        Ok(certificate) => certificate,
        Err(StorageError::NotFound(_)) => {
            return (StatusCode::NOT_FOUND, Html(render::render_not_found_page(id)));
        }
        Err(e) => {
            error!(certificate_id = %id, error = %e, "Certificate lookup failed");
            return unavailable();
        }
    };

    let Ok(origin) = request_origin(state, headers) else {
        return unavailable();
    };
    let verification_url = render::verification_url(&origin, id);
    let qr = render::qr_svg(&verification_url).unwrap_or_else(|e| {
        warn!(certificate_id = %id, error = %e, "QR rendering failed, page served without it");
        String::new()
    });

    (
        StatusCode::OK,
        Html(render::render_certificate_page(
            &certificate,
            &verification_url,
            &qr,
            mode,
        )),
    )
}

/// Public verification page.
#[utoipa::path(
    get,
    path = "/verify/{id}",
    tag = "Pages",
    params(("id" = String, Path, description = "Certificate identifier")),
    responses(
        (status = 200, description = "Certificate document", content_type = "text/html"),
        (status = 404, description = "Certificate not found page", content_type = "text/html"),
        (status = 500, description = "Certificate unavailable page", content_type = "text/html")
    )
)]
pub async fn verify_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    render_page(&state, &headers, &id, PageMode::Verify)
}

/// Printable certificate page that opens the print dialog on load.
#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "Pages",
    params(("id" = String, Path, description = "Certificate identifier")),
    responses(
        (status = 200, description = "Printable certificate document", content_type = "text/html"),
        (status = 404, description = "Certificate not found page", content_type = "text/html"),
        (status = 500, description = "Certificate unavailable page", content_type = "text/html")
    )
)]
pub async fn download_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    render_page(&state, &headers, &id, PageMode::Download)
}
