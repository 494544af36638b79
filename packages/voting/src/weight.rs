//! Time- and movement-based voting weight.

use std::collections::BTreeSet;

use pattern_discovery_tracking_models::SpatialPoint;
use pattern_discovery_voting_models::{MovementSegment, VotingWeightResult, WeightComponents};

use crate::segment::segment;

/// Default minimum minutes at a location before a vote counts.
pub const DEFAULT_MIN_VOTE_MINUTES: f64 = 3.0;
/// Default upper bound on a single vote's weight.
pub const DEFAULT_MAX_VOTE_WEIGHT: f64 = 15.0;
/// Default radius around a location that counts as being there.
pub const DEFAULT_VOTE_RADIUS_KM: f64 = 0.15;

const TIME_WEIGHT_PER_MINUTE: f64 = 0.1;
const MOVEMENT_BONUS_RATE: f64 = 0.05;

/// Thresholds used when turning time at a location into a vote weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    /// Points within this distance of a location count toward it.
    pub radius_km: f64,
    /// Minutes required before a session may vote.
    pub min_vote_minutes: f64,
    /// Cap applied to the summed components.
    pub max_vote_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_VOTE_RADIUS_KM,
            min_vote_minutes: DEFAULT_MIN_VOTE_MINUTES,
            max_vote_weight: DEFAULT_MAX_VOTE_WEIGHT,
        }
    }
}

/// Segments the points a session left near a location and weighs them.
#[must_use]
pub fn weight_for_points(points: &[SpatialPoint], config: &WeightConfig) -> VotingWeightResult {
    calculate(segment(points), config)
}

/// Computes the voting weight for a set of movement segments.
///
/// Sessions with less than `min_vote_minutes` of segment time cannot vote
/// and get zero weight. Otherwise the weight is the sum of the time,
/// movement, engagement and diversity components, capped at
/// `max_vote_weight`.
#[must_use]
pub fn calculate(segments: Vec<MovementSegment>, config: &WeightConfig) -> VotingWeightResult {
    let total_minutes: f64 = segments.iter().map(|s| s.time_spent_minutes).sum();

    if total_minutes < config.min_vote_minutes {
        return VotingWeightResult {
            can_vote: false,
            total_weight: 0.0,
            base_time_minutes: total_minutes,
            movement_breakdown: segments,
            weight_components: WeightComponents::default(),
            eligibility_reason: format!(
                "Spent {total_minutes:.1} minutes at this location; at least {} minutes are required to vote",
                config.min_vote_minutes
            ),
        };
    }

    let components = WeightComponents {
        time_weight: total_minutes * TIME_WEIGHT_PER_MINUTE,
        movement_bonus: movement_bonus(&segments, total_minutes),
        engagement_bonus: engagement_bonus(total_minutes),
        diversity_bonus: diversity_bonus(&segments),
    };
    let total_weight = components.sum().min(config.max_vote_weight);

    log::debug!(
        "Voting weight {total_weight:.2} from {total_minutes:.1} minutes over {} segments",
        segments.len()
    );

    VotingWeightResult {
        can_vote: true,
        total_weight,
        base_time_minutes: total_minutes,
        movement_breakdown: segments,
        weight_components: components,
        eligibility_reason: format!("Spent {total_minutes:.1} minutes at this location"),
    }
}

/// Each segment contributes its share of the total time, times its weight
/// factor, times its own minutes and the total minutes.
fn movement_bonus(segments: &[MovementSegment], total_minutes: f64) -> f64 {
    if total_minutes <= 0.0 {
        return 0.0;
    }
    segments
        .iter()
        .map(|s| {
            let share = s.time_spent_minutes / total_minutes;
            share * s.weight_factor * total_minutes * s.time_spent_minutes * MOVEMENT_BONUS_RATE
        })
        .sum()
}

fn engagement_bonus(total_minutes: f64) -> f64 {
    if total_minutes > 15.0 {
        2.0
    } else if total_minutes > 10.0 {
        1.5
    } else if total_minutes > 5.0 {
        1.0
    } else {
        0.0
    }
}

fn diversity_bonus(segments: &[MovementSegment]) -> f64 {
    let distinct: BTreeSet<_> = segments.iter().map(|s| s.movement_type).collect();
    match distinct.len() {
        n if n >= 3 => 1.5,
        2 => 1.0,
        _ => 0.0,
    }
}
