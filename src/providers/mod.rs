// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External payment provider integrations.

pub mod stripe;

pub use stripe::{
    CheckoutSession, CheckoutSessionRequest, PaymentProvider, PaymentStatus, StripeClient,
    StripeError,
};
