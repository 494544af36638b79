#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Movement segment, voting weight and vote record types.

use chrono::{DateTime, Utc};
use pattern_discovery_tracking_models::MovementType;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// A maximal run of consecutive points sharing one movement type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSegment {
    /// Movement classification shared by every point in the run.
    pub movement_type: MovementType,
    /// Timestamp of the first point.
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last point.
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time` in minutes.
    pub time_spent_minutes: f64,
    /// Mean speed of the run's points in km/h.
    pub average_speed: f64,
    /// Sum of consecutive point distances in km.
    pub distance_covered_km: f64,
    /// Voting multiplier for the movement type.
    pub weight_factor: f64,
    /// Index of the first point in the segmented sequence.
    pub start_index: usize,
    /// Number of points in the run.
    pub point_count: usize,
}

/// The four additive parts of a voting weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightComponents {
    /// 0.1 per minute at the location.
    pub time_weight: f64,
    /// Time-share weighted bonus for how the participant moved.
    pub movement_bonus: f64,
    /// Step bonus for longer visits.
    pub engagement_bonus: f64,
    /// Bonus for arriving and moving around in several ways.
    pub diversity_bonus: f64,
}

impl WeightComponents {
    /// Uncapped sum of the components.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.time_weight + self.movement_bonus + self.engagement_bonus + self.diversity_bonus
    }
}

/// How much a participant's vote about a location counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingWeightResult {
    /// Whether the participant spent enough time to vote.
    pub can_vote: bool,
    /// Capped weight, 0 when `can_vote` is false.
    pub total_weight: f64,
    /// Minutes spent at the location across all segments.
    pub base_time_minutes: f64,
    /// Segments the time was derived from.
    pub movement_breakdown: Vec<MovementSegment>,
    /// Uncapped components of `total_weight`.
    pub weight_components: WeightComponents,
    /// Human-readable explanation of the eligibility decision.
    pub eligibility_reason: String,
}

/// Direction of a vote.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoteType {
    /// In favour.
    Up,
    /// Against.
    Down,
}

/// A recorded vote on a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Vote identifier.
    pub id: Uuid,
    /// Suggestion voted on.
    pub suggestion_id: String,
    /// Voting session.
    pub session_id: String,
    /// Direction.
    pub vote_type: VoteType,
    /// Voting weight at the time the vote was cast.
    pub weight: f64,
    /// Location the suggestion is about.
    pub location_id: String,
    /// Minutes the session spent at the location.
    pub time_spent_minutes: f64,
    /// When the vote was cast.
    pub cast_at: DateTime<Utc>,
}

/// Why a vote was not recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum VoteRejection {
    /// The session did not spend enough time at the location.
    Ineligible {
        /// Explanation of the shortfall.
        message: String,
    },
    /// The session already voted on this suggestion.
    Duplicate,
}

impl std::fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ineligible { message } => write!(f, "not eligible to vote: {message}"),
            Self::Duplicate => write!(f, "already voted on this suggestion"),
        }
    }
}

/// Result of attempting to cast a vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The vote was recorded.
    Accepted(Vote),
    /// The vote was refused.
    Rejected(VoteRejection),
}

impl VoteOutcome {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Weighted vote totals for a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    /// Sum of up-vote weights.
    pub up_weight: f64,
    /// Sum of down-vote weights.
    pub down_weight: f64,
    /// `up_weight - down_weight`.
    pub net: f64,
    /// Number of votes counted.
    pub vote_count: usize,
}

impl VoteTally {
    /// Tallies a set of votes.
    #[must_use]
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            match vote.vote_type {
                VoteType::Up => tally.up_weight += vote.weight,
                VoteType::Down => tally.down_weight += vote.weight,
            }
            tally.vote_count += 1;
        }
        tally.net = tally.up_weight - tally.down_weight;
        tally
    }
}
