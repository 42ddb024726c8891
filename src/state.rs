// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::AppConfig;
use crate::portfolio::BalanceAggregator;
use crate::providers::PaymentProvider;
use crate::storage::Database;

/// Shared application state, constructed once at startup and handed to the
/// router. Upstream clients sit behind traits so tests can swap them out.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub portfolio: Arc<dyn BalanceAggregator>,
    pub payments: Arc<dyn PaymentProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: Arc<Database>,
        portfolio: Arc<dyn BalanceAggregator>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            portfolio,
            payments,
        }
    }
}
