#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the pattern discovery server.
//!
//! These types are serialized to JSON for the REST API. Domain records
//! (clusters, votes, reports) are returned as-is; this crate only holds the
//! envelopes around them.

use pattern_discovery_clustering_models::{Cluster, ClusterParams};
use pattern_discovery_tokens_models::{RewardKind, TokenBalance, TokenSupplyState};
use pattern_discovery_tracking_models::{PointRecord, SpatialPoint};
use pattern_discovery_voting_models::VoteType;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Body of `POST /api/points`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPointsRequest {
    /// Records to store.
    pub points: Vec<PointRecord>,
}

/// Response of `POST /api/points`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPointsResponse {
    /// Number of points stored.
    pub recorded: usize,
}

/// Clustering inputs shared by the cluster and analysis endpoints.
///
/// When `points` is omitted the stored points are used, optionally limited
/// to one session. Parameters default to the server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    /// Points to cluster instead of the stored ones.
    #[serde(default)]
    pub points: Option<Vec<SpatialPoint>>,
    /// Restrict stored points to this session.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Neighbour radius override in km.
    #[serde(default)]
    pub epsilon_km: Option<f64>,
    /// Minimum points override.
    #[serde(default)]
    pub min_points: Option<usize>,
}

impl ClusterRequest {
    /// Parameters for this request, falling back to `defaults`.
    #[must_use]
    pub fn params(&self, defaults: ClusterParams) -> ClusterParams {
        ClusterParams {
            epsilon_km: self.epsilon_km.unwrap_or(defaults.epsilon_km),
            min_points: self.min_points.unwrap_or(defaults.min_points),
        }
    }
}

/// Response of `POST /api/clusters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    /// Parameters the detection ran with.
    pub params: ClusterParams,
    /// Detected clusters.
    pub clusters: Vec<Cluster>,
    /// Number of points left out of every cluster.
    pub noise_count: usize,
}

/// Body of `POST /api/analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Pattern to interpret the clusters against.
    pub pattern_number: u32,
    /// Clustering inputs.
    #[serde(flatten)]
    pub cluster: ClusterRequest,
}

/// Body of `POST /api/adherence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceRequest {
    /// Cluster to score.
    pub cluster: Cluster,
    /// Pattern to score it against.
    pub pattern_number: u32,
}

/// Query of `GET /api/voting-weight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingWeightQuery {
    /// Voting session.
    pub session_id: String,
    /// Location being voted about.
    pub location_id: String,
}

/// Body of `POST /api/suggestions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionRequest {
    /// Identifier to use; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,
    /// Location the suggestion concerns.
    pub location_id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Proposing session.
    pub session_id: String,
}

/// Body of `POST /api/votes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    /// Suggestion voted on.
    pub suggestion_id: String,
    /// Voting session.
    pub session_id: String,
    /// Direction.
    pub vote_type: VoteType,
    /// Location the vote's weight is measured at.
    pub location_id: String,
}

/// Body of `POST /api/tokens/award`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardTokensRequest {
    /// Session to credit.
    pub session_id: String,
    /// Contribution being rewarded.
    pub kind: RewardKind,
    /// Base amount; defaults to the kind's base rate.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Description for the ledger.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response of `POST /api/tokens/award`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardTokensResponse {
    /// Tokens actually minted; 0 once the cap is reached.
    pub awarded: f64,
    /// Supply after the award.
    pub supply: TokenSupplyState,
}

/// Body of `POST /api/tokens/spend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendTokensRequest {
    /// Session to debit.
    pub session_id: String,
    /// Tokens to spend.
    pub amount: f64,
    /// Description for the ledger.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response of `POST /api/tokens/spend`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendTokensResponse {
    /// Whether the balance covered the amount.
    pub success: bool,
    /// Balance after the attempt.
    pub balance: TokenBalance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_request_flattens_cluster_inputs() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{"patternNumber": 30, "sessionId": "s1", "epsilonKm": 0.25}"#,
        )
        .unwrap();
        assert_eq!(request.pattern_number, 30);
        assert_eq!(request.cluster.session_id.as_deref(), Some("s1"));
        assert!(request.cluster.points.is_none());

        let params = request.cluster.params(ClusterParams::default());
        assert!((params.epsilon_km - 0.25).abs() < f64::EPSILON);
        assert_eq!(params.min_points, ClusterParams::default().min_points);
    }

    #[test]
    fn award_amount_is_optional() {
        let request: AwardTokensRequest =
            serde_json::from_str(r#"{"sessionId": "s1", "kind": "media_upload"}"#).unwrap();
        assert_eq!(request.kind, RewardKind::MediaUpload);
        assert!(request.amount.is_none());
    }
}
