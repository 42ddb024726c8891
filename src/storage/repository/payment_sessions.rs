// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment session repository.
//!
//! A payment session carries the portfolio snapshot across the hosted
//! checkout, because the provider's metadata channel is too small for the
//! balance list. Sessions expire a fixed time after creation: reads past
//! that point report `NotFound`, and the sweeper deletes them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PortfolioBalance;
use crate::storage::database::{Database, PAYMENT_SESSIONS};
use crate::storage::{StorageError, StorageResult};

/// Checkout state keyed by the provider's session id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub session_id: String,
    pub wallet_address: String,
    pub holder_name: String,
    pub balances: Vec<PortfolioBalance>,
    pub total_value: f64,
    pub created_at: DateTime<Utc>,
}

impl PaymentSession {
    /// True once `ttl` has elapsed since creation.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.created_at).to_std() {
            Ok(age) => age >= ttl,
            // Created in the future relative to `now`
            Err(_) => false,
        }
    }
}

/// Repository for payment session documents.
pub struct PaymentSessionRepository<'a> {
    db: &'a Database,
    ttl: Duration,
}

impl<'a> PaymentSessionRepository<'a> {
    pub fn new(db: &'a Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Persist a new session. Session ids come from the provider and are
    /// never reused, so a duplicate is reported as `AlreadyExists`.
    pub fn create(&self, session: &PaymentSession) -> StorageResult<()> {
        self.db
            .insert_new(PAYMENT_SESSIONS, &session.session_id, session)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => StorageError::AlreadyExists(format!(
                    "Payment session {}",
                    session.session_id
                )),
                other => other,
            })
    }

    /// Get a live session by id.
    pub fn get(&self, session_id: &str) -> StorageResult<PaymentSession> {
        self.get_at(session_id, Utc::now())
    }

    /// Get a session as of `now`. Expired sessions are reported as missing.
    pub fn get_at(&self, session_id: &str, now: DateTime<Utc>) -> StorageResult<PaymentSession> {
        let session: PaymentSession = self
            .db
            .get(PAYMENT_SESSIONS, session_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Payment session {session_id}")))?;

        if session.is_expired_at(now, self.ttl) {
            return Err(StorageError::NotFound(format!(
                "Payment session {session_id} has expired"
            )));
        }

        Ok(session)
    }

    /// Delete every session expired as of `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let ttl = self.ttl;
        self.db
            .remove_where(PAYMENT_SESSIONS, |s: &PaymentSession| s.is_expired_at(now, ttl))
    }
}
