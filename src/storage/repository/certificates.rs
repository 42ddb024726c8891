// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Certificate repository.
//!
//! Certificates are written once and never updated or deleted. The
//! certificate id is the primary key, so the table itself rejects a second
//! certificate with the same id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PortfolioBalance;
use crate::storage::database::{Database, CERTIFICATES};
use crate::storage::{StorageError, StorageResult};

/// An issued proof-of-funds certificate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Human-shareable identifier (`CP-XXXXXXXX`), used as the lookup key.
    pub certificate_id: String,
    /// Address whose balances were verified.
    pub wallet_address: String,
    /// Self-reported holder name.
    pub holder_name: String,
    /// USD total at issuance.
    pub total_value: f64,
    /// Balance snapshot at issuance.
    pub balances: Vec<PortfolioBalance>,
    pub issue_date: String,
    pub verification_date: String,
    /// Display hash over wallet address and holder name.
    pub certificate_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for certificate documents.
pub struct CertificateRepository<'a> {
    db: &'a Database,
}

impl<'a> CertificateRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn exists(&self, certificate_id: &str) -> StorageResult<bool> {
        Ok(self
            .db
            .get::<Certificate>(CERTIFICATES, certificate_id)?
            .is_some())
    }

    /// Get a certificate by id.
    pub fn get(&self, certificate_id: &str) -> StorageResult<Certificate> {
        self.db
            .get(CERTIFICATES, certificate_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Certificate {certificate_id}")))
    }

    /// Persist a new certificate.
    ///
    /// Returns `AlreadyExists` if the id is taken; the stored certificate is
    /// left untouched.
    pub fn create(&self, certificate: &Certificate) -> StorageResult<()> {
        self.db
            .insert_new(CERTIFICATES, &certificate.certificate_id, certificate)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => StorageError::AlreadyExists(format!(
                    "Certificate {}",
                    certificate.certificate_id
                )),
                other => other,
            })
    }
}
