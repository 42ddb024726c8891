// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Checkout and Payment Verification
//!
//! Starting a checkout creates the provider session first and then stores
//! the portfolio snapshot under the provider's session id. Verification
//! asks the provider whether that session was paid and, if so, hands back
//! the stored snapshot for certificate issuance.
//!
//! Nothing is rolled back: a stored session whose checkout is abandoned is
//! left for the expiry window and the sweeper.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::certificates::non_blank;
use crate::error::messages::{INVALID_TOTAL, MISSING_FIELDS};
use crate::models::{PortfolioBalance, SessionMetadata};
use crate::providers::{
    CheckoutSession, CheckoutSessionRequest, PaymentProvider, PaymentStatus, StripeError,
};
use crate::storage::{Database, PaymentSession, PaymentSessionRepository, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid checkout input: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Provider(#[from] StripeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("payment session not found: {0}")]
    SessionNotFound(String),
}

/// Portfolio snapshot submitted when checkout starts.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub wallet_address: String,
    pub holder_name: String,
    pub balances: Vec<PortfolioBalance>,
    pub total_value: f64,
}

impl CheckoutInput {
    /// Build from optional request fields. Blank strings count as missing.
    pub fn from_parts(
        wallet_address: Option<String>,
        holder_name: Option<String>,
        balances: Vec<PortfolioBalance>,
        total_value: Option<f64>,
    ) -> Result<Self, PaymentError> {
        let wallet_address =
            non_blank(wallet_address).ok_or(PaymentError::InvalidInput(MISSING_FIELDS))?;
        let holder_name =
            non_blank(holder_name).ok_or(PaymentError::InvalidInput(MISSING_FIELDS))?;

        let total_value = total_value.unwrap_or(0.0);
        if !total_value.is_finite() || total_value < 0.0 {
            return Err(PaymentError::InvalidInput(INVALID_TOTAL));
        }

        Ok(Self {
            wallet_address,
            holder_name,
            balances,
            total_value,
        })
    }
}

/// Result of checking a returning checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Paid(SessionMetadata),
    NotPaid,
}

/// Checkout orchestration and payment verification over one provider and
/// the session store.
pub struct PaymentFlow<'a> {
    provider: &'a dyn PaymentProvider,
    db: &'a Database,
    session_ttl: Duration,
}

impl<'a> PaymentFlow<'a> {
    pub fn new(provider: &'a dyn PaymentProvider, db: &'a Database, session_ttl: Duration) -> Self {
        Self {
            provider,
            db,
            session_ttl,
        }
    }

    /// Create the hosted checkout and persist the snapshot under its id.
    ///
    /// `origin` is the public app origin used for the return URLs.
    pub async fn start_checkout(
        &self,
        origin: &str,
        input: CheckoutInput,
    ) -> Result<CheckoutSession, PaymentError> {
        let session = self
            .provider
            .create_checkout_session(CheckoutSessionRequest {
                wallet_address: &input.wallet_address,
                holder_name: &input.holder_name,
                success_url: format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}"),
                cancel_url: format!("{origin}/cancel"),
            })
            .await?;

        let record = PaymentSession {
            session_id: session.id.clone(),
            wallet_address: input.wallet_address,
            holder_name: input.holder_name,
            balances: input.balances,
            total_value: input.total_value,
            created_at: Utc::now(),
        };
        PaymentSessionRepository::new(self.db, self.session_ttl).create(&record)?;

        info!(
            session_id = %record.session_id,
            holdings = record.balances.len(),
            "Checkout started"
        );
        Ok(session)
    }

    /// Confirm a checkout. Not paid is a plain negative result; paid with
    /// no live stored session is `SessionNotFound`.
    pub async fn verify_payment(&self, session_id: &str) -> Result<VerifyOutcome, PaymentError> {
        let status = self.provider.retrieve_payment_status(session_id).await?;
        if status != PaymentStatus::Paid {
            info!(session_id = %session_id, ?status, "Checkout not paid");
            return Ok(VerifyOutcome::NotPaid);
        }

        let repo = PaymentSessionRepository::new(self.db, self.session_ttl);
        let session = match repo.get(session_id) {
            Ok(session) => session,
            Err(StorageError::NotFound(detail)) => {
                warn!(session_id = %session_id, "Paid checkout has no live session data");
                return Err(PaymentError::SessionNotFound(detail));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(VerifyOutcome::Paid(SessionMetadata {
            wallet_address: session.wallet_address,
            holder_name: session.holder_name,
            balances: session.balances,
            total_value: session.total_value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex;

    struct FakeProvider {
        status: PaymentStatus,
        created: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeProvider {
        fn new(status: PaymentStatus) -> Self {
            Self {
                status,
                created: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for FakeProvider {
        async fn create_checkout_session(
            &self,
            request: CheckoutSessionRequest<'_>,
        ) -> Result<CheckoutSession, StripeError> {
            self.created.lock().unwrap().push((
                request.holder_name.to_string(),
                request.success_url.clone(),
                request.cancel_url.clone(),
            ));
            Ok(CheckoutSession {
                id: "cs_test_123".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test_123".to_string(),
            })
        }

        async fn retrieve_payment_status(
            &self,
            _session_id: &str,
        ) -> Result<PaymentStatus, StripeError> {
            Ok(self.status)
        }
    }

    fn temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("payments.redb")).unwrap();
        (db, dir)
    }

    fn input() -> CheckoutInput {
        CheckoutInput::from_parts(
            Some("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".into()),
            Some("Ada Lovelace".into()),
            vec![PortfolioBalance {
                token: "Ether".into(),
                symbol: "ETH".into(),
                amount: 1.25,
                value: 3125.5,
                chain: "Ethereum".into(),
                address: "0x0000000000000000000000000000000000000000".into(),
                img_url: None,
            }],
            Some(3125.5),
        )
        .unwrap()
    }

    const TTL: Duration = Duration::from_secs(3600);

    #[test]
    fn input_requires_wallet_and_name() {
        let missing_name =
            CheckoutInput::from_parts(Some("0xabc".into()), Some("   ".into()), vec![], None);
        assert!(matches!(
            missing_name,
            Err(PaymentError::InvalidInput(MISSING_FIELDS))
        ));

        let negative = CheckoutInput::from_parts(
            Some("0xabc".into()),
            Some("Ada".into()),
            vec![],
            Some(-1.0),
        );
        assert!(matches!(negative, Err(PaymentError::InvalidInput(INVALID_TOTAL))));
    }

    #[test]
    fn input_keeps_values_as_submitted() {
        let input = CheckoutInput::from_parts(
            Some(" 0xabc".into()),
            Some("Ada Lovelace ".into()),
            vec![],
            None,
        )
        .unwrap();
        assert_eq!(input.wallet_address, " 0xabc");
        assert_eq!(input.holder_name, "Ada Lovelace ");
    }

    #[tokio::test]
    async fn start_checkout_stores_session_under_provider_id() {
        let (db, _dir) = temp_db();
        let provider = FakeProvider::new(PaymentStatus::Unpaid);
        let flow = PaymentFlow::new(&provider, &db, TTL);

        let session = flow
            .start_checkout("https://wallet-scan.io", input())
            .await
            .unwrap();
        assert_eq!(session.id, "cs_test_123");

        let stored = PaymentSessionRepository::new(&db, TTL)
            .get("cs_test_123")
            .unwrap();
        assert_eq!(stored.holder_name, "Ada Lovelace");
        assert_eq!(stored.total_value, 3125.5);
        assert_eq!(stored.balances.len(), 1);

        let created = provider.created.lock().unwrap();
        assert_eq!(
            created[0].1,
            "https://wallet-scan.io/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(created[0].2, "https://wallet-scan.io/cancel");
    }

    #[tokio::test]
    async fn paid_session_returns_stored_metadata() {
        let (db, _dir) = temp_db();
        let provider = FakeProvider::new(PaymentStatus::Paid);
        let flow = PaymentFlow::new(&provider, &db, TTL);
        flow.start_checkout("http://localhost:3000", input())
            .await
            .unwrap();

        let outcome = flow.verify_payment("cs_test_123").await.unwrap();
        match outcome {
            VerifyOutcome::Paid(metadata) => {
                assert_eq!(metadata.holder_name, "Ada Lovelace");
                assert_eq!(metadata.balances[0].symbol, "ETH");
            }
            VerifyOutcome::NotPaid => panic!("expected paid"),
        }
    }

    #[tokio::test]
    async fn unpaid_session_is_a_negative_result() {
        let (db, _dir) = temp_db();
        let provider = FakeProvider::new(PaymentStatus::Unpaid);
        let flow = PaymentFlow::new(&provider, &db, TTL);

        let outcome = flow.verify_payment("cs_test_123").await.unwrap();
        assert_eq!(outcome, VerifyOutcome::NotPaid);
    }

    #[tokio::test]
    async fn expired_session_is_not_found_even_when_paid() {
        let (db, _dir) = temp_db();
        PaymentSessionRepository::new(&db, TTL)
            .create(&PaymentSession {
                session_id: "cs_old".into(),
                wallet_address: "0xabc".into(),
                holder_name: "Ada".into(),
                balances: vec![],
                total_value: 0.0,
                created_at: Utc::now() - TimeDelta::hours(2),
            })
            .unwrap();

        let provider = FakeProvider::new(PaymentStatus::Paid);
        let flow = PaymentFlow::new(&provider, &db, TTL);
        let result = flow.verify_payment("cs_old").await;
        assert!(matches!(result, Err(PaymentError::SessionNotFound(_))));
    }
}
