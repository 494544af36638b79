#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stored location and suggestion records.
//!
//! These are the shapes the external store hands back. They are distinct
//! from the API bodies in `pattern_discovery_server_models`.

use chrono::{DateTime, Utc};
use pattern_discovery_tracking_models::Coordinate;
use serde::{Deserialize, Serialize};

/// A place participants can vote about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Location identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Position votes are measured against.
    pub coordinate: Coordinate,
    /// Design pattern the location is being evaluated against, if any.
    #[serde(default)]
    pub pattern_number: Option<u32>,
}

/// A proposed change to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Suggestion identifier.
    pub id: String,
    /// Location the suggestion concerns.
    pub location_id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Session that proposed it.
    pub session_id: String,
    /// When it was proposed.
    pub created_at: DateTime<Utc>,
}
