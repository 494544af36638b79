#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Token issuance with a halving schedule and a hard supply cap.
//!
//! [`TokenLedger`] owns the supply state, every session balance and the
//! transaction history behind one lock, so the check-clamp-commit sequence
//! of an award can never interleave with another award.

pub mod ledger;

pub use ledger::{LedgerConfig, TokenLedger};

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Amounts, rates and multipliers must be finite and non-negative.
    #[error("Invalid token amount: {amount}")]
    InvalidAmount {
        /// Offending value.
        amount: f64,
    },

    /// A thread panicked while holding the ledger lock.
    #[error("Token ledger lock poisoned")]
    Poisoned,
}
