#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Design-pattern interpretation of detected communities.
//!
//! The [`registry`] embeds the ideal parameters of each supported design
//! pattern. [`adherence`] scores clusters against those parameters and
//! aggregates the scores into an interpretation report, and [`inference`]
//! ranks patterns for a piece of free text behind a swappable scoring trait.

pub mod adherence;
pub mod inference;
pub mod registry;

use thiserror::Error;

pub use adherence::{analyze, interpret, score, score_adherence};
pub use inference::{KeywordInference, PatternInference, rank_patterns};
pub use registry::{all_patterns, pattern};

/// Errors that can occur while looking up or applying patterns.
#[derive(Debug, Error)]
pub enum PatternError {
    /// No pattern with the requested number is registered.
    #[error("Unknown pattern number {number}")]
    UnknownPattern {
        /// The requested pattern number.
        number: u32,
    },

    /// An embedded pattern definition could not be parsed.
    #[error("Invalid pattern definition '{name}': {message}")]
    Registry {
        /// File stem of the definition.
        name: String,
        /// Parser message.
        message: String,
    },
}
