//! Collaborator store traits.

use chrono::{DateTime, Utc};
use pattern_discovery_database_models::{Location, Suggestion};
use pattern_discovery_tracking_models::{Coordinate, PointRecord, SpatialPoint};
use pattern_discovery_voting_models::Vote;

use crate::StoreError;

/// Append-only store of GPS points.
///
/// Every query returns points in ascending timestamp order.
pub trait PointStore: Send + Sync {
    /// Records one point.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the point cannot be written.
    fn record_point(&self, point: SpatialPoint) -> Result<(), StoreError>;

    /// Records a tagged point record by storing its underlying fix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the point cannot be written.
    fn record(&self, record: PointRecord) -> Result<(), StoreError> {
        self.record_point(record.into_point())
    }

    /// Every stored point.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn all_points(&self) -> Result<Vec<SpatialPoint>, StoreError>;

    /// Every point recorded for a session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn points_for_session(&self, session_id: &str) -> Result<Vec<SpatialPoint>, StoreError>;

    /// Points recorded for a session within `radius_km` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn points_near(
        &self,
        session_id: &str,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<SpatialPoint>, StoreError>;

    /// Points recorded for a session with `from <= timestamp <= to`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn points_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SpatialPoint>, StoreError>;
}

/// Store of votable locations.
pub trait LocationStore: Send + Sync {
    /// Looks up a location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn location(&self, id: &str) -> Result<Option<Location>, StoreError>;

    /// Inserts or replaces a location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the location cannot be written.
    fn upsert_location(&self, location: Location) -> Result<(), StoreError>;
}

/// Store of suggestions and the votes cast on them.
///
/// At most one vote exists per `(suggestion_id, session_id)` pair.
pub trait VoteStore: Send + Sync {
    /// Looks up a suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn suggestion(&self, id: &str) -> Result<Option<Suggestion>, StoreError>;

    /// Adds a new suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id is already taken.
    fn add_suggestion(&self, suggestion: Suggestion) -> Result<(), StoreError>;

    /// Inserts a vote, enforcing the per-pair uniqueness constraint
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the session already voted on the
    /// suggestion.
    fn insert_vote(&self, vote: Vote) -> Result<(), StoreError>;

    /// Whether the session has voted on the suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn has_voted(&self, suggestion_id: &str, session_id: &str) -> Result<bool, StoreError>;

    /// Every vote cast on a suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn votes_for_suggestion(&self, suggestion_id: &str) -> Result<Vec<Vote>, StoreError>;
}
