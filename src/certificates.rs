// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Certificate Issuer
//!
//! Mints certificate records from verified wallet, holder and balance data.
//!
//! ## Identifiers
//!
//! Ids are `CP-` followed by the last eight digits of the millisecond clock.
//! They are short enough to read over the phone but not unique by
//! construction. The certificates table rejects a duplicate key, and the
//! issuer then advances the suffix by one and tries again, up to
//! [`MAX_ID_ATTEMPTS`] times.
//!
//! ## Hash
//!
//! `certificate_hash` is a display value: SHA-256 over wallet address and
//! holder name, truncated to 16 hex digits. It does not cover the balances
//! or the total and cannot be used to detect tampering with them.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::messages::{INVALID_TOTAL, MISSING_FIELDS};
use crate::models::CreateCertificateRequest;
use crate::storage::{Certificate, CertificateRepository, Database, StorageError};

pub const CERTIFICATE_ID_PREFIX: &str = "CP-";

/// Attempts at finding a free id before giving up.
pub const MAX_ID_ATTEMPTS: u64 = 5;

const ID_SUFFIX_MODULUS: u64 = 100_000_000;
const HASH_DISPLAY_HEX_DIGITS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("invalid certificate input: {0}")]
    InvalidInput(&'static str),

    #[error("no free certificate id after {0} attempts")]
    IdSpaceExhausted(u64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Certificate id for a millisecond timestamp plus a retry offset.
pub fn generate_certificate_id(unix_millis: i64, attempt: u64) -> String {
    let suffix = (unix_millis.unsigned_abs() + attempt) % ID_SUFFIX_MODULUS;
    format!("{CERTIFICATE_ID_PREFIX}{suffix:08}")
}

/// Display hash over wallet address and holder name: `0x` + 16 hex digits + `...`.
pub fn certificate_hash(wallet_address: &str, holder_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(wallet_address.as_bytes());
    hasher.update(holder_name.as_bytes());
    let digest = hasher.finalize();
    format!(
        "0x{}...",
        alloy::hex::encode(&digest[..HASH_DISPLAY_HEX_DIGITS / 2])
    )
}

/// `October 16, 2026`
pub fn format_issue_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// `10/16/2026, 10:48:00 AM`
pub fn format_verification_date(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Reject missing or whitespace-only values; keep the rest byte-for-byte.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct CertificateIssuer<'a> {
    db: &'a Database,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn issue(&self, request: CreateCertificateRequest) -> Result<Certificate, IssueError> {
        self.issue_at(request, Utc::now())
    }

    /// Validate, mint and persist a certificate as of `now`.
    ///
    /// Wallet address and holder name are stored exactly as submitted, as
    /// are the total and the balances. Missing dates are filled from `now`.
    pub fn issue_at(
        &self,
        request: CreateCertificateRequest,
        now: DateTime<Utc>,
    ) -> Result<Certificate, IssueError> {
        let wallet_address =
            non_blank(request.wallet_address).ok_or(IssueError::InvalidInput(MISSING_FIELDS))?;
        let holder_name =
            non_blank(request.holder_name).ok_or(IssueError::InvalidInput(MISSING_FIELDS))?;

        let total_value = request.total_value.unwrap_or(0.0);
        if !total_value.is_finite() || total_value < 0.0 {
            return Err(IssueError::InvalidInput(INVALID_TOTAL));
        }

        let mut certificate = Certificate {
            certificate_id: String::new(),
            certificate_hash: certificate_hash(&wallet_address, &holder_name),
            wallet_address,
            holder_name,
            total_value,
            balances: request.balances,
            issue_date: non_blank(request.issue_date)
                .unwrap_or_else(|| format_issue_date(now)),
            verification_date: non_blank(request.verification_date)
                .unwrap_or_else(|| format_verification_date(now)),
            created_at: now,
        };

        let repo = CertificateRepository::new(self.db);
        let millis = now.timestamp_millis();

        for attempt in 0..MAX_ID_ATTEMPTS {
            certificate.certificate_id = generate_certificate_id(millis, attempt);
            match repo.create(&certificate) {
                Ok(()) => {
                    info!(
                        certificate_id = %certificate.certificate_id,
                        holdings = certificate.balances.len(),
                        total_value = certificate.total_value,
                        "Certificate issued"
                    );
                    return Ok(certificate);
                }
                Err(StorageError::AlreadyExists(_)) => {
                    warn!(
                        certificate_id = %certificate.certificate_id,
                        attempt,
                        "Certificate id taken, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(IssueError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortfolioBalance;
    use chrono::TimeZone;

    fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("issuer.redb")).unwrap();
        (db, dir)
    }

    fn request(holder_name: &str) -> CreateCertificateRequest {
        CreateCertificateRequest {
            wallet_address: Some("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".into()),
            holder_name: Some(holder_name.into()),
            total_value: Some(175.5),
            balances: vec![PortfolioBalance {
                token: "USD Coin".into(),
                symbol: "USDC".into(),
                amount: 175.5,
                value: 175.5,
                chain: "Base".into(),
                address: "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913".into(),
                img_url: Some("https://img.example.com/usdc.png".into()),
            }],
            issue_date: Some("October 16, 2026".into()),
            verification_date: Some("10/16/2026, 10:48:00 AM".into()),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 10, 48, 0).unwrap()
    }

    #[test]
    fn id_uses_last_eight_millisecond_digits() {
        assert_eq!(generate_certificate_id(1_760_611_680_123, 0), "CP-11680123");
        assert_eq!(generate_certificate_id(1_760_611_680_123, 2), "CP-11680125");
        assert_eq!(generate_certificate_id(1_700_000_000_000, 0), "CP-00000000");
    }

    #[test]
    fn hash_is_deterministic_display_value() {
        let a = certificate_hash("0xabc", "Alice");
        let b = certificate_hash("0xabc", "Alice");
        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert!(a.ends_with("..."));
        assert_eq!(a.len(), 2 + 16 + 3);
        assert_ne!(a, certificate_hash("0xabc", "Bob"));
    }

    #[test]
    fn hash_matches_sha256_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(certificate_hash("a", "bc"), "0xba7816bf8f01cfea...");
    }

    #[test]
    fn dates_use_long_and_numeric_styles() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(format_issue_date(at), "March 5, 2026");
        assert_eq!(format_verification_date(at), "3/5/2026, 2:07:09 PM");
    }

    #[test]
    fn issuing_twice_keeps_hash_but_changes_id() {
        let (db, _dir) = temp_db();
        let issuer = CertificateIssuer::new(&db);

        let first = issuer.issue_at(request("Alice"), fixed_now()).unwrap();
        let second = issuer.issue_at(request("Alice"), fixed_now()).unwrap();

        assert_eq!(first.certificate_hash, second.certificate_hash);
        assert_ne!(first.certificate_id, second.certificate_id);
    }

    #[test]
    fn colliding_ids_retry_with_next_suffix() {
        let (db, _dir) = temp_db();
        let issuer = CertificateIssuer::new(&db);
        let now = fixed_now();
        let base = generate_certificate_id(now.timestamp_millis(), 0);

        let first = issuer.issue_at(request("Alice"), now).unwrap();
        let second = issuer.issue_at(request("Bob"), now).unwrap();

        assert_eq!(first.certificate_id, base);
        assert_eq!(
            second.certificate_id,
            generate_certificate_id(now.timestamp_millis(), 1)
        );
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let (db, _dir) = temp_db();
        let issuer = CertificateIssuer::new(&db);
        let now = fixed_now();

        for _ in 0..MAX_ID_ATTEMPTS {
            issuer.issue_at(request("Alice"), now).unwrap();
        }
        let result = issuer.issue_at(request("Alice"), now);
        assert!(matches!(result, Err(IssueError::IdSpaceExhausted(MAX_ID_ATTEMPTS))));
    }

    #[test]
    fn empty_holder_name_is_rejected_and_nothing_persisted() {
        let (db, _dir) = temp_db();
        let issuer = CertificateIssuer::new(&db);
        let now = fixed_now();

        let result = issuer.issue_at(request(""), now);
        assert!(matches!(result, Err(IssueError::InvalidInput(MISSING_FIELDS))));

        let repo = CertificateRepository::new(&db);
        let id = generate_certificate_id(now.timestamp_millis(), 0);
        assert!(!repo.exists(&id).unwrap());
    }

    #[test]
    fn negative_total_is_rejected() {
        let (db, _dir) = temp_db();
        let mut req = request("Alice");
        req.total_value = Some(-5.0);
        let result = CertificateIssuer::new(&db).issue_at(req, fixed_now());
        assert!(matches!(result, Err(IssueError::InvalidInput(INVALID_TOTAL))));
    }

    #[test]
    fn stored_certificate_matches_submitted_values() {
        let (db, _dir) = temp_db();
        let submitted = request("Alice");
        let issued = CertificateIssuer::new(&db)
            .issue_at(submitted.clone(), fixed_now())
            .unwrap();

        let stored = CertificateRepository::new(&db)
            .get(&issued.certificate_id)
            .unwrap();
        assert_eq!(stored, issued);
        assert_eq!(Some(stored.wallet_address), submitted.wallet_address);
        assert_eq!(Some(stored.holder_name), submitted.holder_name);
        assert_eq!(Some(stored.total_value), submitted.total_value);
        assert_eq!(stored.balances, submitted.balances);
    }

    #[test]
    fn padded_names_are_stored_verbatim() {
        let (db, _dir) = temp_db();
        let mut req = request("  Alice ");
        req.wallet_address = Some(" 0xabc".into());

        let issued = CertificateIssuer::new(&db)
            .issue_at(req, fixed_now())
            .unwrap();
        assert_eq!(issued.holder_name, "  Alice ");
        assert_eq!(issued.wallet_address, " 0xabc");
    }

    #[test]
    fn missing_dates_default_to_issue_time() {
        let (db, _dir) = temp_db();
        let mut req = request("Alice");
        req.issue_date = None;
        req.verification_date = Some("  ".into());

        let issued = CertificateIssuer::new(&db)
            .issue_at(req, fixed_now())
            .unwrap();
        assert_eq!(issued.issue_date, "October 16, 2026");
        assert_eq!(issued.verification_date, "10/16/2026, 10:48:00 AM");
    }
}
