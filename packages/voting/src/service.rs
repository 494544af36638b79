//! Voting weight lookup and vote casting over the collaborator stores.

use std::sync::Arc;

use chrono::Utc;
use pattern_discovery_database::{LocationStore, PointStore, StoreError, VoteStore};
use pattern_discovery_voting_models::{
    Vote, VoteOutcome, VoteRejection, VoteTally, VoteType, VotingWeightResult,
};
use uuid::Uuid;

use crate::VotingError;
use crate::weight::{WeightConfig, weight_for_points};

/// Computes voting weights and records votes.
pub struct VotingService<S> {
    store: Arc<S>,
    config: WeightConfig,
}

impl<S> VotingService<S>
where
    S: PointStore + LocationStore + VoteStore,
{
    #[must_use]
    pub const fn new(store: Arc<S>, config: WeightConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// Weighs the time a session spent within the configured radius of a
    /// location.
    ///
    /// # Errors
    ///
    /// * [`VotingError::LocationNotFound`] if the location does not exist
    /// * [`VotingError::Store`] if a store read fails
    pub fn compute_voting_weight(
        &self,
        session_id: &str,
        location_id: &str,
    ) -> Result<VotingWeightResult, VotingError> {
        let location =
            self.store
                .location(location_id)?
                .ok_or_else(|| VotingError::LocationNotFound {
                    id: location_id.to_string(),
                })?;

        let points =
            self.store
                .points_near(session_id, location.coordinate, self.config.radius_km)?;

        log::debug!(
            "Session {session_id} has {} points near location {location_id}",
            points.len()
        );

        Ok(weight_for_points(&points, &self.config))
    }

    /// Casts a weighted vote on a suggestion.
    ///
    /// Ineligible and duplicate votes are returned as
    /// [`VoteOutcome::Rejected`], not as errors.
    ///
    /// # Errors
    ///
    /// * [`VotingError::SuggestionNotFound`] if the suggestion does not exist
    /// * [`VotingError::LocationNotFound`] if the location does not exist
    /// * [`VotingError::Store`] if a store operation fails
    pub fn cast_vote(
        &self,
        suggestion_id: &str,
        session_id: &str,
        vote_type: VoteType,
        location_id: &str,
    ) -> Result<VoteOutcome, VotingError> {
        if self.store.suggestion(suggestion_id)?.is_none() {
            return Err(VotingError::SuggestionNotFound {
                id: suggestion_id.to_string(),
            });
        }

        if self.store.has_voted(suggestion_id, session_id)? {
            return Ok(VoteOutcome::Rejected(VoteRejection::Duplicate));
        }

        let weight = self.compute_voting_weight(session_id, location_id)?;
        if !weight.can_vote {
            return Ok(VoteOutcome::Rejected(VoteRejection::Ineligible {
                message: weight.eligibility_reason,
            }));
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            suggestion_id: suggestion_id.to_string(),
            session_id: session_id.to_string(),
            vote_type,
            weight: weight.total_weight,
            location_id: location_id.to_string(),
            time_spent_minutes: weight.base_time_minutes,
            cast_at: Utc::now(),
        };

        match self.store.insert_vote(vote.clone()) {
            Ok(()) => {
                log::debug!(
                    "Session {session_id} voted {vote_type} on {suggestion_id} with weight {:.2}",
                    vote.weight
                );
                Ok(VoteOutcome::Accepted(vote))
            }
            // Lost a race with a concurrent vote from the same session.
            Err(StoreError::Duplicate { .. }) => Ok(VoteOutcome::Rejected(VoteRejection::Duplicate)),
            Err(e) => Err(e.into()),
        }
    }

    /// Sums the weighted votes on a suggestion.
    ///
    /// # Errors
    ///
    /// * [`VotingError::SuggestionNotFound`] if the suggestion does not exist
    /// * [`VotingError::Store`] if a store read fails
    pub fn tally(&self, suggestion_id: &str) -> Result<VoteTally, VotingError> {
        if self.store.suggestion(suggestion_id)?.is_none() {
            return Err(VotingError::SuggestionNotFound {
                id: suggestion_id.to_string(),
            });
        }
        let votes = self.store.votes_for_suggestion(suggestion_id)?;
        Ok(VoteTally::from_votes(&votes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone as _};
    use pattern_discovery_database::MemoryStore;
    use pattern_discovery_database_models::{Location, Suggestion};
    use pattern_discovery_tracking_models::{Coordinate, SpatialPoint};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn service() -> VotingService<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_location(Location {
                id: "plaza".to_string(),
                name: "Plaza".to_string(),
                coordinate: Coordinate::new(40.0, -75.0),
                pattern_number: Some(61),
            })
            .unwrap();
        store
            .add_suggestion(Suggestion {
                id: "benches".to_string(),
                location_id: "plaza".to_string(),
                title: "More benches".to_string(),
                description: None,
                session_id: "author".to_string(),
                created_at: t(0),
            })
            .unwrap();
        VotingService::new(store, WeightConfig::default())
    }

    fn linger(service: &VotingService<MemoryStore>, session: &str, minutes: i64) {
        for m in 0..=minutes {
            service
                .store
                .record_point(SpatialPoint::new(session, 40.0, -75.0, t(m)).with_speed(3.0))
                .unwrap();
        }
        // far away, must not count
        service
            .store
            .record_point(SpatialPoint::new(session, 40.1, -75.0, t(minutes + 30)).with_speed(3.0))
            .unwrap();
    }

    #[test]
    fn weight_only_counts_points_near_location() {
        let service = service();
        linger(&service, "s1", 12);
        let result = service.compute_voting_weight("s1", "plaza").unwrap();
        assert!(result.can_vote);
        assert!((result.base_time_minutes - 12.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_location_is_an_error() {
        let err = service().compute_voting_weight("s1", "nowhere").unwrap_err();
        assert!(matches!(err, VotingError::LocationNotFound { .. }));
    }

    #[test]
    fn vote_is_accepted_once() {
        let service = service();
        linger(&service, "s1", 12);

        let first = service
            .cast_vote("benches", "s1", VoteType::Up, "plaza")
            .unwrap();
        assert!(first.is_accepted(), "first vote: {first:?}");

        let second = service
            .cast_vote("benches", "s1", VoteType::Down, "plaza")
            .unwrap();
        assert_eq!(second, VoteOutcome::Rejected(VoteRejection::Duplicate));

        let tally = service.tally("benches").unwrap();
        assert_eq!(tally.vote_count, 1);
        assert!(tally.up_weight > 0.0);
        assert!(tally.down_weight.abs() < f64::EPSILON);
    }

    #[test]
    fn short_visit_is_rejected_as_ineligible() {
        let service = service();
        linger(&service, "s1", 2);

        let outcome = service
            .cast_vote("benches", "s1", VoteType::Up, "plaza")
            .unwrap();
        match outcome {
            VoteOutcome::Rejected(VoteRejection::Ineligible { message }) => {
                assert!(message.contains("3 minutes"), "message was: {message}");
            }
            other => panic!("expected ineligible rejection, got {other:?}"),
        }
        assert_eq!(service.tally("benches").unwrap().vote_count, 0);
    }

    #[test]
    fn unknown_suggestion_is_an_error() {
        let err = service()
            .cast_vote("missing", "s1", VoteType::Up, "plaza")
            .unwrap_err();
        assert!(matches!(err, VotingError::SuggestionNotFound { .. }));
    }
}
