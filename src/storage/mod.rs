// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for certificates and pending checkouts, kept in a
//! single embedded redb database under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   walletscan.redb
//!     certificates       # certificate_id → Certificate (never updated, never deleted)
//!     payment_sessions   # session_id → PaymentSession (expires after SESSION_TTL_SECS)
//! ```
//!
//! Certificates and payment sessions are written independently; no
//! transaction ever spans both tables.

pub mod database;
pub mod repository;
pub mod sweeper;

pub use database::{Database, StorageError, StorageResult};
pub use repository::{Certificate, CertificateRepository, PaymentSession, PaymentSessionRepository};
pub use sweeper::SessionSweeper;
