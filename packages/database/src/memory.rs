//! In-process implementation of every store trait.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use pattern_discovery_database_models::{Location, Suggestion};
use pattern_discovery_spatial::haversine_km;
use pattern_discovery_tracking_models::{Coordinate, SpatialPoint};
use pattern_discovery_voting_models::Vote;

use crate::StoreError;
use crate::store::{LocationStore, PointStore, VoteStore};

/// Votes keyed by `(suggestion_id, session_id)`.
type VoteKey = (String, String);

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: RwLock<BTreeMap<String, Vec<SpatialPoint>>>,
    locations: RwLock<BTreeMap<String, Location>>,
    suggestions: RwLock<BTreeMap<String, Suggestion>>,
    votes: RwLock<BTreeMap<VoteKey, Vote>>,
}

fn read<'a, T>(
    lock: &'a RwLock<T>,
    name: &'static str,
) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned { name })
}

fn write<'a, T>(
    lock: &'a RwLock<T>,
    name: &'static str,
) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned { name })
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session_points<F>(&self, session_id: &str, keep: F) -> Result<Vec<SpatialPoint>, StoreError>
    where
        F: Fn(&SpatialPoint) -> bool,
    {
        let points = read(&self.points, "points")?;
        Ok(points
            .get(session_id)
            .map(|list| list.iter().filter(|p| keep(p)).cloned().collect())
            .unwrap_or_default())
    }
}

impl PointStore for MemoryStore {
    fn record_point(&self, point: SpatialPoint) -> Result<(), StoreError> {
        let mut points = write(&self.points, "points")?;
        let list = points.entry(point.session_id.clone()).or_default();
        // Keep each session sorted by timestamp; equal timestamps keep
        // arrival order.
        let pos = list.partition_point(|p| p.timestamp <= point.timestamp);
        list.insert(pos, point);
        Ok(())
    }

    fn all_points(&self) -> Result<Vec<SpatialPoint>, StoreError> {
        let points = read(&self.points, "points")?;
        let mut all: Vec<SpatialPoint> = points.values().flatten().cloned().collect();
        all.sort_by_key(|p| p.timestamp);
        Ok(all)
    }

    fn points_for_session(&self, session_id: &str) -> Result<Vec<SpatialPoint>, StoreError> {
        self.session_points(session_id, |_| true)
    }

    fn points_near(
        &self,
        session_id: &str,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<SpatialPoint>, StoreError> {
        self.session_points(session_id, |p| {
            haversine_km(p.coordinate(), center) <= radius_km
        })
    }

    fn points_in_window(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SpatialPoint>, StoreError> {
        self.session_points(session_id, |p| p.timestamp >= from && p.timestamp <= to)
    }
}

impl LocationStore for MemoryStore {
    fn location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        Ok(read(&self.locations, "locations")?.get(id).cloned())
    }

    fn upsert_location(&self, location: Location) -> Result<(), StoreError> {
        write(&self.locations, "locations")?.insert(location.id.clone(), location);
        Ok(())
    }
}

impl VoteStore for MemoryStore {
    fn suggestion(&self, id: &str) -> Result<Option<Suggestion>, StoreError> {
        Ok(read(&self.suggestions, "suggestions")?.get(id).cloned())
    }

    fn add_suggestion(&self, suggestion: Suggestion) -> Result<(), StoreError> {
        let mut suggestions = write(&self.suggestions, "suggestions")?;
        if suggestions.contains_key(&suggestion.id) {
            return Err(StoreError::Duplicate {
                entity: "suggestion",
                id: suggestion.id,
            });
        }
        suggestions.insert(suggestion.id.clone(), suggestion);
        Ok(())
    }

    fn insert_vote(&self, vote: Vote) -> Result<(), StoreError> {
        let mut votes = write(&self.votes, "votes")?;
        let key = (vote.suggestion_id.clone(), vote.session_id.clone());
        if votes.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: "vote",
                id: format!("{}/{}", key.0, key.1),
            });
        }
        log::debug!("Recording vote {} on suggestion {}", vote.id, vote.suggestion_id);
        votes.insert(key, vote);
        Ok(())
    }

    fn has_voted(&self, suggestion_id: &str, session_id: &str) -> Result<bool, StoreError> {
        let votes = read(&self.votes, "votes")?;
        Ok(votes.contains_key(&(suggestion_id.to_string(), session_id.to_string())))
    }

    fn votes_for_suggestion(&self, suggestion_id: &str) -> Result<Vec<Vote>, StoreError> {
        let votes = read(&self.votes, "votes")?;
        Ok(votes
            .iter()
            .filter(|((sid, _), _)| sid == suggestion_id)
            .map(|(_, v)| v.clone())
            .collect())
    }
}
