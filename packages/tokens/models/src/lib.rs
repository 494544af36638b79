#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Token supply, balance and transaction types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Kind of contribution a reward is paid for.
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
pub enum RewardKind {
    /// Contributed GPS tracking points.
    PointContribution,
    /// Proposed a change to a location.
    Suggestion,
    /// Cast a vote.
    Vote,
    /// Uploaded a photo or video.
    MediaUpload,
    /// Commented on a suggestion.
    Comment,
    /// Ran or shared an analysis.
    DataAnalysis,
}

impl RewardKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PointContribution,
            Self::Suggestion,
            Self::Vote,
            Self::MediaUpload,
            Self::Comment,
            Self::DataAnalysis,
        ]
    }

    /// Tokens paid for one contribution of this kind before the reward
    /// multiplier and quality are applied.
    #[must_use]
    pub const fn base_rate(self) -> f64 {
        match self {
            Self::PointContribution => 0.1,
            Self::Comment => 0.5,
            Self::Vote => 1.0,
            Self::MediaUpload => 2.0,
            Self::Suggestion => 5.0,
            Self::DataAnalysis => 10.0,
        }
    }
}

/// Snapshot of the global issuance state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSupplyState {
    /// Tokens minted so far. Never exceeds the maximum supply.
    pub total_supply: f64,
    /// Minted tokens not yet spent. Spent tokens leave circulation but
    /// still count toward `total_supply`.
    pub tokens_in_circulation: f64,
    /// Multiplier applied to every reward; 0 once the cap is reached.
    pub current_reward_multiplier: f64,
    /// Supply level at which the last halving happened.
    pub last_halving_at: f64,
    /// Supply level that triggers the next halving.
    pub next_halving_at: f64,
    /// Whether the maximum supply has been minted.
    pub is_cap_reached: bool,
}

/// A session's token account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Tokens available to spend.
    pub balance: f64,
    /// Tokens ever awarded.
    pub total_earned: f64,
    /// Tokens ever spent.
    pub total_spent: f64,
}

/// What a ledger entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    /// Newly minted tokens paid to the session.
    Award {
        /// Contribution rewarded.
        reward: RewardKind,
    },
    /// Tokens debited from the session.
    Spend,
}

/// One entry in a session's token history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransaction {
    /// Entry identifier.
    pub id: Uuid,
    /// Session credited or debited.
    pub session_id: String,
    /// Award or spend.
    pub kind: TransactionKind,
    /// Tokens moved. Always positive.
    pub amount: f64,
    /// Caller-supplied description.
    pub reason: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn reward_kind_string_round_trip() {
        for kind in RewardKind::all() {
            assert_eq!(RewardKind::from_str(kind.as_ref()).unwrap(), *kind);
        }
        assert_eq!(RewardKind::MediaUpload.to_string(), "media_upload");
    }

    #[test]
    fn transaction_kind_is_tagged() {
        let json = serde_json::to_string(&TransactionKind::Award {
            reward: RewardKind::Vote,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"award","reward":"vote"}"#);
    }
}
