// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WalletScan - Proof of Funds Certificate Service
//!
//! Aggregates wallet balances across EVM chains, Solana and Bitcoin, takes
//! payment through a hosted checkout, and issues certificates that anyone
//! can verify by id.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `portfolio` - Balance aggregation against upstream indexers
//! - `providers` - Payment provider client (Stripe)
//! - `payments` - Checkout and session verification flow
//! - `certificates` - Certificate id, hash and issuance
//! - `render` - Certificate documents and QR codes
//! - `storage` - Embedded database (redb)

pub mod api;
pub mod certificates;
pub mod config;
pub mod error;
pub mod models;
pub mod payments;
pub mod portfolio;
pub mod providers;
pub mod render;
pub mod state;
pub mod storage;
