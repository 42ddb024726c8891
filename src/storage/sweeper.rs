// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Payment Session Sweeper
//!
//! Background task that deletes expired payment sessions. Reads already
//! treat expired sessions as missing; the sweeper only reclaims space left
//! by checkouts that were abandoned before payment.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Database, PaymentSessionRepository};

pub struct SessionSweeper {
    db: Arc<Database>,
    ttl: Duration,
    sweep_interval: Duration,
}

impl SessionSweeper {
    pub fn new(db: Arc<Database>, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            db,
            ttl,
            sweep_interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            "Payment session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Payment session sweeper shutting down");
                return;
            }

            self.sweep_once();

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Payment session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Delete expired sessions once. Returns how many were removed.
    pub fn sweep_once(&self) -> usize {
        let repo = PaymentSessionRepository::new(&self.db, self.ttl);
        match repo.purge_expired(Utc::now()) {
            Ok(0) => {
                debug!("Session sweep: nothing expired");
                0
            }
            Ok(removed) => {
                info!(removed, "Session sweep: removed expired payment sessions");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Session sweep failed");
                0
            }
        }
    }
}
