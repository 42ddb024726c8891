// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the document database.
//!
//! Each repository wraps one table of the shared [`Database`](super::Database).

pub mod certificates;
pub mod payment_sessions;

pub use certificates::{Certificate, CertificateRepository};
pub use payment_sessions::{PaymentSession, PaymentSessionRepository};
