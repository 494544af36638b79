#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Density-based community detection over GPS points.
//!
//! [`ClusterDetector`] runs a DBSCAN-style pass over a point slice: points
//! with at least `min_points` neighbours within `epsilon_km` seed clusters,
//! clusters grow through neighbouring core points, and border points reached
//! from a core are added without extending the search. Points that no
//! cluster reaches are noise and appear in no cluster.
//!
//! Each cluster is then summarized (centroid, area, estimated population,
//! density, activity pattern and confidence) by the [`summary`] module.
//!
//! Membership is deterministic for a fixed point ordering. A border point
//! within reach of two different clusters belongs to whichever cluster
//! reaches it first in traversal order, so reordering the input can move
//! such points between clusters.

pub mod summary;

use std::collections::VecDeque;

use pattern_discovery_clustering_models::{Cluster, ClusterParams};
use pattern_discovery_spatial::PointIndex;
use pattern_discovery_tracking_models::SpatialPoint;

/// Per-point outcome of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLabel {
    /// Member of the cluster at this position in [`Detection::clusters`].
    Cluster(usize),
    /// Reached by no cluster.
    Noise,
}

/// Clusters plus the indices of the input points classified as noise.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Detected clusters, ordered by the input index of their seed point.
    pub clusters: Vec<Cluster>,
    /// Input indices of noise points, ascending.
    pub noise: Vec<usize>,
}

/// DBSCAN-style cluster detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterDetector {
    params: ClusterParams,
}

impl ClusterDetector {
    #[must_use]
    pub const fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub const fn params(&self) -> ClusterParams {
        self.params
    }

    /// Detects clusters in `points`.
    ///
    /// An empty slice yields no clusters.
    #[must_use]
    pub fn detect(&self, points: &[SpatialPoint]) -> Vec<Cluster> {
        self.detect_with_noise(points).clusters
    }

    /// Detects clusters and also reports which points were noise.
    #[must_use]
    pub fn detect_with_noise(&self, points: &[SpatialPoint]) -> Detection {
        let labels = self.label(points);

        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut noise = Vec::new();
        for (idx, label) in labels.iter().enumerate() {
            match label {
                PointLabel::Cluster(c) => {
                    if members.len() <= *c {
                        members.resize_with(c + 1, Vec::new);
                    }
                    members[*c].push(idx);
                }
                PointLabel::Noise => noise.push(idx),
            }
        }

        let clusters = summary::summarize_all(points, &members, self.params.epsilon_km);

        log::debug!(
            "Detected {} clusters and {} noise points from {} points (epsilon={}km, min_points={})",
            clusters.len(),
            noise.len(),
            points.len(),
            self.params.epsilon_km,
            self.params.min_points,
        );

        Detection { clusters, noise }
    }

    /// Assigns every point a [`PointLabel`].
    ///
    /// Cluster numbers are dense and ordered by seed index. Clusters that end
    /// up with fewer than `min_points` members (possible when an earlier
    /// cluster already claimed some of the seed's border neighbours) are
    /// dissolved and their points reported as noise.
    #[must_use]
    pub fn label(&self, points: &[SpatialPoint]) -> Vec<PointLabel> {
        let n = points.len();
        let min_points = self.params.min_points;
        let epsilon = self.params.epsilon_km;

        let valid: Vec<bool> = points
            .iter()
            .map(|p| p.latitude.is_finite() && p.longitude.is_finite())
            .collect();
        let skipped = valid.iter().filter(|v| !**v).count();
        if skipped > 0 {
            log::warn!("Ignoring {skipped} points with non-finite coordinates");
        }

        // Index only valid points, then map hits back to input indices.
        let valid_indices: Vec<usize> = (0..n).filter(|&i| valid[i]).collect();
        let valid_points: Vec<SpatialPoint> =
            valid_indices.iter().map(|&i| points[i].clone()).collect();
        let index = PointIndex::new(&valid_points);
        let mut position = vec![usize::MAX; n];
        for (pos, &i) in valid_indices.iter().enumerate() {
            position[i] = pos;
        }
        let neighbours = |i: usize| -> Vec<usize> {
            index
                .neighbours_of(position[i], epsilon)
                .into_iter()
                .map(|pos| valid_indices[pos])
                .collect()
        };

        let mut visited = vec![false; n];
        let mut assigned: Vec<Option<usize>> = vec![None; n];
        let mut next_cluster = 0;

        for seed in 0..n {
            if visited[seed] || !valid[seed] {
                continue;
            }
            visited[seed] = true;

            let seed_neighbours = neighbours(seed);
            if seed_neighbours.len() < min_points {
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            assigned[seed] = Some(cluster);

            let mut queued = vec![false; n];
            queued[seed] = true;
            let mut queue: VecDeque<usize> = VecDeque::new();
            for &j in &seed_neighbours {
                if !queued[j] {
                    queued[j] = true;
                    queue.push_back(j);
                }
            }

            while let Some(j) = queue.pop_front() {
                if !visited[j] {
                    visited[j] = true;
                    let reach = neighbours(j);
                    if reach.len() >= min_points {
                        for k in reach {
                            if !queued[k] {
                                queued[k] = true;
                                queue.push_back(k);
                            }
                        }
                    }
                }
                if assigned[j].is_none() {
                    assigned[j] = Some(cluster);
                }
            }
        }

        // Dissolve undersized clusters and renumber densely.
        let mut sizes = vec![0_usize; next_cluster];
        for c in assigned.iter().flatten() {
            sizes[*c] += 1;
        }
        let mut renumber = vec![None; next_cluster];
        let mut kept = 0;
        for (c, &size) in sizes.iter().enumerate() {
            if size >= min_points.max(1) {
                renumber[c] = Some(kept);
                kept += 1;
            } else {
                log::debug!("Dissolving cluster {c} with only {size} members");
            }
        }

        assigned
            .into_iter()
            .map(|a| {
                a.and_then(|c| renumber[c])
                    .map_or(PointLabel::Noise, PointLabel::Cluster)
            })
            .collect()
    }
}

/// Detects clusters with explicit parameters.
#[must_use]
pub fn detect_clusters(points: &[SpatialPoint], epsilon_km: f64, min_points: usize) -> Vec<Cluster> {
    ClusterDetector::new(ClusterParams {
        epsilon_km,
        min_points,
    })
    .detect(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone as _, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn point(session: &str, lat: f64, lng: f64, minute: i64) -> SpatialPoint {
        SpatialPoint::new(session, lat, lng, t0() + Duration::minutes(minute))
    }

    /// Five points within roughly 100 m of each other.
    fn tight_group() -> Vec<SpatialPoint> {
        vec![
            point("a", 47.606_2, -122.332_1, 0),
            point("b", 47.606_5, -122.332_1, 1),
            point("c", 47.606_2, -122.331_7, 2),
            point("d", 47.605_9, -122.332_4, 3),
            point("e", 47.606_4, -122.331_9, 4),
        ]
    }

    #[test]
    fn five_close_points_form_one_cluster() {
        let clusters = detect_clusters(&tight_group(), 0.5, 3);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].point_count(), 5);
    }

    #[test]
    fn five_distant_points_are_all_noise() {
        let points: Vec<SpatialPoint> = (0..5)
            .map(|i| point("a", 47.0 + f64::from(i) * 0.02, -122.0, i64::from(i)))
            .collect();
        let detection = ClusterDetector::default().detect_with_noise(&points);
        assert!(detection.clusters.is_empty());
        assert_eq!(detection.noise, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_input_yields_no_clusters() {
        let detection = ClusterDetector::default().detect_with_noise(&[]);
        assert!(detection.clusters.is_empty());
        assert!(detection.noise.is_empty());
    }

    #[test]
    fn clusters_meet_min_points_and_exclude_noise() {
        let mut points = tight_group();
        // A second, separate group of three and two isolated points.
        points.push(point("f", 47.700_0, -122.300_0, 5));
        points.push(point("g", 47.700_2, -122.300_0, 6));
        points.push(point("h", 47.700_0, -122.300_3, 7));
        points.push(point("x", 47.800_0, -122.100_0, 8));
        points.push(point("y", 47.900_0, -122.000_0, 9));

        let min_points = 3;
        let detection = ClusterDetector::new(ClusterParams {
            epsilon_km: 0.5,
            min_points,
        })
        .detect_with_noise(&points);

        assert_eq!(detection.clusters.len(), 2);
        for cluster in &detection.clusters {
            assert!(
                cluster.point_count() >= min_points,
                "cluster {} has {} members",
                cluster.id,
                cluster.point_count()
            );
            for &noise_idx in &detection.noise {
                assert!(
                    !cluster.member_points.contains(&points[noise_idx]),
                    "noise point {noise_idx} also in cluster {}",
                    cluster.id
                );
            }
        }
        assert_eq!(detection.noise, vec![8, 9]);
    }

    #[test]
    fn rerun_is_identical() {
        let points = tight_group();
        let detector = ClusterDetector::default();
        let first = detector.detect(&points);
        let second = detector.detect(&points);
        assert_eq!(first, second);
    }

    #[test]
    fn border_point_included_without_extending() {
        // Core trio near the origin, a border point ~0.49 km east reachable
        // only from the easternmost core, and a far point within epsilon of
        // the border point but of nothing else.
        let points = vec![
            point("a", 0.0, 0.0, 0),
            point("a", 0.0, 0.000_5, 1),
            point("a", 0.0, 0.001, 2),
            point("b", 0.0, 0.005_4, 3),
            point("c", 0.0, 0.009_5, 4),
        ];
        let labels = ClusterDetector::default().label(&points);
        assert_eq!(labels[0], PointLabel::Cluster(0));
        assert_eq!(labels[3], PointLabel::Cluster(0));
        assert_eq!(labels[4], PointLabel::Noise);
    }

    #[test]
    fn border_point_claimed_by_first_cluster() {
        // Two dense groups ~0.98 km apart with a shared border point in the
        // middle that is within epsilon of one point from each group.
        let points = vec![
            point("a", 0.0, 0.0, 0),
            point("a", 0.0, -0.000_5, 1),
            point("a", 0.0, -0.001, 2),
            point("a", 0.0, -0.001_5, 3),
            point("m", 0.0, 0.004_4, 4),
            point("b", 0.0, 0.008_8, 5),
            point("b", 0.0, 0.009_3, 6),
            point("b", 0.0, 0.009_8, 7),
            point("b", 0.0, 0.010_3, 8),
        ];
        let labels = ClusterDetector::new(ClusterParams {
            epsilon_km: 0.5,
            min_points: 4,
        })
        .label(&points);
        assert_eq!(labels[4], PointLabel::Cluster(0));
        assert_eq!(labels[5], PointLabel::Cluster(1));
        assert_eq!(labels.iter().filter(|l| **l == PointLabel::Cluster(0)).count(), 5);
        assert_eq!(labels.iter().filter(|l| **l == PointLabel::Cluster(1)).count(), 4);
    }

    #[test]
    fn undersized_cluster_is_dissolved() {
        // The second seed's border neighbour was already claimed by the
        // first cluster, leaving it with fewer than min_points members.
        let points = vec![
            point("a", 0.0, 0.0, 0),
            point("a", 0.0, -0.000_5, 1),
            point("a", 0.0, -0.001, 2),
            point("a", 0.0, -0.001_5, 3),
            point("m", 0.0, 0.004_4, 4),
            point("s", 0.0, 0.008_8, 5),
            point("s", 0.0, 0.009_1, 6),
            point("s", 0.0, 0.009_4, 7),
        ];
        let detection = ClusterDetector::new(ClusterParams {
            epsilon_km: 0.5,
            min_points: 4,
        })
        .detect_with_noise(&points);
        assert_eq!(detection.clusters.len(), 1);
        assert_eq!(detection.clusters[0].point_count(), 5);
        assert_eq!(detection.noise, vec![5, 6, 7]);
    }

    #[test]
    fn non_finite_points_are_noise() {
        let mut points = tight_group();
        points.push(point("z", f64::NAN, 0.0, 9));
        let detection = ClusterDetector::default().detect_with_noise(&points);
        assert_eq!(detection.clusters.len(), 1);
        assert_eq!(detection.noise, vec![5]);
    }
}
