#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Movement segmentation and time-based voting weight.
//!
//! A session's points near a location are split into movement segments
//! ([`segment::segment`]), weighed by time and mode of travel
//! ([`weight::calculate`]), and attached to votes by [`VotingService`].

pub mod segment;
pub mod service;
pub mod weight;

pub use segment::segment;
pub use service::VotingService;
pub use weight::{WeightConfig, calculate, weight_for_points};

use pattern_discovery_database::StoreError;
use thiserror::Error;

/// Errors that can occur while weighing or casting votes.
#[derive(Debug, Error)]
pub enum VotingError {
    /// The referenced location does not exist.
    #[error("Location '{id}' not found")]
    LocationNotFound {
        /// Requested location id.
        id: String,
    },

    /// The referenced suggestion does not exist.
    #[error("Suggestion '{id}' not found")]
    SuggestionNotFound {
        /// Requested suggestion id.
        id: String,
    },

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
