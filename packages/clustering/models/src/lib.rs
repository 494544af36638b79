#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cluster result types.
//!
//! Clusters are recomputed on every analysis call and are never persisted.
//! Their ids are derived from the rounded centroid, so two runs over
//! near-identical data can produce shifting or colliding ids; treat a
//! cluster as a value keyed by its content, not as a stable entity.

use pattern_discovery_tracking_models::{Coordinate, SpatialPoint};
use serde::{Deserialize, Serialize};

/// Default neighbour search radius in kilometres.
pub const DEFAULT_EPSILON_KM: f64 = 0.5;

/// Default minimum neighbourhood size for a core point.
pub const DEFAULT_MIN_POINTS: usize = 3;

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParams {
    /// Neighbour search radius in kilometres.
    pub epsilon_km: f64,
    /// Minimum neighbour count (the point itself included) for a point to
    /// seed or extend a cluster.
    pub min_points: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            epsilon_km: DEFAULT_EPSILON_KM,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

/// When and how intensely a cluster is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPattern {
    /// Up to three busiest hours of the day (UTC, 0-23), busiest first.
    pub peak_hours: Vec<u32>,
    /// Point counts per weekday, Sunday first.
    pub weekly_distribution: [u32; 7],
    /// Mean recorded speed of members that carry one, in km/h.
    pub movement_intensity: f64,
}

impl ActivityPattern {
    /// Mean points per weekday.
    #[must_use]
    pub fn mean_daily_count(&self) -> f64 {
        f64::from(self.weekly_distribution.iter().sum::<u32>()) / 7.0
    }

    /// Population variance of the weekday counts.
    #[must_use]
    pub fn weekly_variance(&self) -> f64 {
        let mean = self.mean_daily_count();
        self.weekly_distribution
            .iter()
            .map(|&c| (f64::from(c) - mean).powi(2))
            .sum::<f64>()
            / 7.0
    }
}

/// A spatial community detected from point density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Run-local id derived from the rounded centroid.
    pub id: String,
    /// Mean position of the member points.
    pub centroid: Coordinate,
    /// Member points, in input order.
    pub member_points: Vec<SpatialPoint>,
    /// Estimated number of people using the area.
    pub estimated_population: u64,
    /// Bounding-box area, floored at 0.1 km².
    pub area_km2: f64,
    /// `estimated_population / area_km2`.
    pub density: f64,
    /// Temporal usage profile.
    pub activity_pattern: ActivityPattern,
    /// Blend of spatial cohesion, data richness and density plausibility,
    /// in `[0, 1]`.
    pub confidence: f64,
}

impl Cluster {
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.member_points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_week_has_zero_variance() {
        let pattern = ActivityPattern {
            peak_hours: vec![],
            weekly_distribution: [4; 7],
            movement_intensity: 0.0,
        };
        assert!((pattern.mean_daily_count() - 4.0).abs() < 1e-12);
        assert!(pattern.weekly_variance().abs() < 1e-12);
    }

    #[test]
    fn single_day_week_variance() {
        let pattern = ActivityPattern {
            peak_hours: vec![],
            weekly_distribution: [7, 0, 0, 0, 0, 0, 0],
            movement_intensity: 0.0,
        };
        // mean 1, deviations: 36 + 6*1 = 42, /7 = 6
        assert!((pattern.weekly_variance() - 6.0).abs() < 1e-12);
    }
}
