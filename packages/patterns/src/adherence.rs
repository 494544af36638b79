//! Cluster adherence scoring against a pattern's ideal parameters.
//!
//! A cluster starts at full adherence and loses a fixed amount for each
//! check it fails:
//!
//! | Check | Deduction |
//! |---|---|
//! | population below the ideal minimum | 0.3 |
//! | population above the ideal maximum | 0.2 |
//! | density outside the ideal range | 0.3 |
//! | area outside the ideal range | 0.2 |
//! | weekly activity variance above twice the mean daily count | 0.1 |
//!
//! Adherence never drops below zero.

use pattern_discovery_clustering::ClusterDetector;
use pattern_discovery_clustering_models::{Cluster, ClusterParams};
use pattern_discovery_patterns_models::{
    AdherenceScore, ClusterAdherence, InterpretationReport, PatternDefinition,
    PatternIdealParameters,
};
use pattern_discovery_tracking_models::SpatialPoint;

use crate::PatternError;

const POPULATION_LOW_PENALTY: f64 = 0.3;
const POPULATION_HIGH_PENALTY: f64 = 0.2;
const DENSITY_PENALTY: f64 = 0.3;
const AREA_PENALTY: f64 = 0.2;
const UNEVEN_USAGE_PENALTY: f64 = 0.1;

/// Clusters scoring strictly above this conform to the pattern.
pub const CONFORMANCE_THRESHOLD: f64 = 0.6;

/// Mean population below this share of the ideal midpoint suggests
/// consolidating clusters.
const CONSOLIDATION_RATIO: f64 = 0.8;

/// Mean population above this multiple of the ideal maximum suggests
/// subdividing clusters.
const SUBDIVISION_RATIO: f64 = 1.2;

/// Scores one cluster against a set of ideal parameters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(cluster: &Cluster, ideal: &PatternIdealParameters) -> AdherenceScore {
    let mut adherence = 1.0;
    let mut deviations = Vec::new();
    let mut recommendations = Vec::new();

    let population = cluster.estimated_population as f64;
    let pop_range = ideal.population_range;
    if pop_range.is_below(population) {
        adherence -= POPULATION_LOW_PENALTY;
        deviations.push(format!(
            "Estimated population {population:.0} is below the ideal minimum of {:.0}",
            pop_range.min
        ));
        recommendations.push(
            "Attract more residents or activity, or merge with an adjacent community".to_string(),
        );
    } else if pop_range.is_above(population) {
        adherence -= POPULATION_HIGH_PENALTY;
        deviations.push(format!(
            "Estimated population {population:.0} is above the ideal maximum of {:.0}",
            pop_range.max
        ));
        recommendations
            .push("Consider splitting into smaller, more identifiable communities".to_string());
    }

    if !ideal.density_range.contains(cluster.density) {
        adherence -= DENSITY_PENALTY;
        deviations.push(format!(
            "Density of {:.1} people/km² is outside the ideal range of {} people/km²",
            cluster.density, ideal.density_range
        ));
        if ideal.density_range.is_below(cluster.density) {
            recommendations
                .push("Increase density with infill housing or shared facilities".to_string());
        } else {
            recommendations.push("Relieve crowding by adding open space".to_string());
        }
    }

    if !ideal.area_range.contains(cluster.area_km2) {
        adherence -= AREA_PENALTY;
        deviations.push(format!(
            "Area of {:.2} km² is outside the ideal range of {} km²",
            cluster.area_km2, ideal.area_range
        ));
        if ideal.area_range.is_below(cluster.area_km2) {
            recommendations.push("Extend the community's boundary or connect nearby spaces".to_string());
        } else {
            recommendations
                .push("Define a tighter boundary so the area can be walked across".to_string());
        }
    }

    let pattern = &cluster.activity_pattern;
    let mean_daily = pattern.mean_daily_count();
    if pattern.weekly_variance() > 2.0 * mean_daily {
        adherence -= UNEVEN_USAGE_PENALTY;
        deviations.push("Activity is concentrated on a few days of the week".to_string());
        recommendations
            .push("Add uses that draw people on quieter days to even out activity".to_string());
    }

    AdherenceScore {
        adherence: f64::max(adherence, 0.0),
        recommendations,
        deviations,
    }
}

/// Scores one cluster against a pattern looked up by number.
///
/// # Errors
///
/// Returns [`PatternError::UnknownPattern`] if the pattern is not registered.
pub fn score_adherence(
    cluster: &Cluster,
    pattern_number: u32,
) -> Result<ClusterAdherence, PatternError> {
    let pattern = crate::registry::pattern(pattern_number)?;
    Ok(cluster_adherence(cluster, &pattern))
}

fn cluster_adherence(cluster: &Cluster, pattern: &PatternDefinition) -> ClusterAdherence {
    ClusterAdherence {
        cluster_id: cluster.id.clone(),
        pattern_number: pattern.number,
        estimated_population: cluster.estimated_population,
        density: cluster.density,
        area_km2: cluster.area_km2,
        score: score(cluster, &pattern.ideal()),
    }
}

/// Scores every cluster and aggregates the results into a report.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn interpret(clusters: &[Cluster], pattern: &PatternDefinition) -> InterpretationReport {
    let scored: Vec<ClusterAdherence> = clusters
        .iter()
        .map(|c| cluster_adherence(c, pattern))
        .collect();

    let total_clusters = scored.len();
    let conforming_clusters = scored
        .iter()
        .filter(|c| c.score.adherence > CONFORMANCE_THRESHOLD)
        .count();
    let mean_adherence = if total_clusters == 0 {
        0.0
    } else {
        scored.iter().map(|c| c.score.adherence).sum::<f64>() / total_clusters as f64
    };

    let mut recommendations = Vec::new();
    if total_clusters == 0 {
        recommendations.push(
            "No communities detected; collect more tracking data before interpreting".to_string(),
        );
    } else {
        let mean_population = clusters
            .iter()
            .map(|c| c.estimated_population as f64)
            .sum::<f64>()
            / total_clusters as f64;
        let target = pattern.population_range.midpoint();

        if mean_population < CONSOLIDATION_RATIO * target {
            recommendations.push(format!(
                "Average population {mean_population:.0} is below 80% of the {} target of {target:.0}; consider consolidating nearby communities",
                pattern.name
            ));
        } else if mean_population > SUBDIVISION_RATIO * pattern.population_range.max {
            recommendations.push(format!(
                "Average population {mean_population:.0} is well above the {} maximum of {:.0}; consider subdividing communities",
                pattern.name, pattern.population_range.max
            ));
        }

        if conforming_clusters * 2 < total_clusters {
            recommendations.push(format!(
                "Only {conforming_clusters} of {total_clusters} communities conform to {}; review the overall layout",
                pattern.name
            ));
        }
    }

    log::debug!(
        "Interpreted {total_clusters} clusters against pattern {}: {conforming_clusters} conforming, mean adherence {mean_adherence:.2}",
        pattern.number
    );

    InterpretationReport {
        pattern_number: pattern.number,
        pattern_name: pattern.name.clone(),
        total_clusters,
        conforming_clusters,
        mean_adherence,
        clusters: scored,
        recommendations,
    }
}

/// Detects clusters in `points` and interprets them against a pattern.
///
/// # Errors
///
/// Returns [`PatternError::UnknownPattern`] if the pattern is not registered.
pub fn analyze(
    points: &[SpatialPoint],
    params: ClusterParams,
    pattern_number: u32,
) -> Result<InterpretationReport, PatternError> {
    let pattern = crate::registry::pattern(pattern_number)?;
    let clusters = ClusterDetector::new(params).detect(points);
    Ok(interpret(&clusters, &pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone as _, Utc};
    use pattern_discovery_clustering_models::ActivityPattern;
    use pattern_discovery_patterns_models::ParameterRange;
    use pattern_discovery_tracking_models::Coordinate;

    fn ideal() -> PatternIdealParameters {
        PatternIdealParameters {
            population_range: ParameterRange::new(100.0, 500.0),
            density_range: ParameterRange::new(100.0, 2000.0),
            area_range: ParameterRange::new(0.1, 1.0),
        }
    }

    fn cluster(population: u64, area_km2: f64, weekly: [u32; 7]) -> Cluster {
        #[allow(clippy::cast_precision_loss)]
        let density = population as f64 / area_km2;
        Cluster {
            id: "cluster_test".to_string(),
            centroid: Coordinate::new(0.0, 0.0),
            member_points: Vec::new(),
            estimated_population: population,
            area_km2,
            density,
            activity_pattern: ActivityPattern {
                peak_hours: vec![],
                weekly_distribution: weekly,
                movement_intensity: 0.0,
            },
            confidence: 1.0,
        }
    }

    #[test]
    fn conforming_cluster_scores_full() {
        let result = score(&cluster(200, 0.5, [10; 7]), &ideal());
        assert!((result.adherence - 1.0).abs() < 1e-12);
        assert!(result.deviations.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn small_population_deducts_and_explains() {
        // 50 people on 0.5 km² -> density 100, inside range
        let result = score(&cluster(50, 0.5, [10; 7]), &ideal());
        assert!((result.adherence - 0.7).abs() < 1e-12);
        assert_eq!(result.deviations.len(), 1);
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.deviations[0].contains("below the ideal minimum"));
    }

    #[test]
    fn large_population_deducts_less() {
        // 1000 people on 1 km² -> density 1000, inside range
        let result = score(&cluster(1000, 1.0, [10; 7]), &ideal());
        assert!((result.adherence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn every_check_failing_stacks_deductions() {
        // 5 people over 3 km², all activity on one day
        let result = score(&cluster(5, 3.0, [70, 0, 0, 0, 0, 0, 0]), &ideal());
        // 1 - 0.3 - 0.3 - 0.2 - 0.1
        assert!((result.adherence - 0.1).abs() < 1e-12);
        assert!(result.adherence >= 0.0);
        assert_eq!(result.deviations.len(), 4);
        assert_eq!(result.recommendations.len(), 4);
    }

    #[test]
    fn uneven_week_deducts() {
        let result = score(&cluster(200, 0.5, [30, 0, 0, 0, 0, 0, 5]), &ideal());
        assert!((result.adherence - 0.9).abs() < 1e-12);
        assert!(result.deviations[0].contains("few days"));
    }

    #[test]
    fn unknown_pattern_is_not_found() {
        let err = score_adherence(&cluster(200, 0.5, [10; 7]), 4242).unwrap_err();
        assert!(matches!(err, PatternError::UnknownPattern { number: 4242 }));
    }

    #[test]
    fn interpret_aggregates() {
        let pattern = crate::registry::pattern(30).unwrap();
        let clusters = vec![
            cluster(200, 0.5, [10; 7]),
            cluster(5, 3.0, [70, 0, 0, 0, 0, 0, 0]),
        ];
        let report = interpret(&clusters, &pattern);
        assert_eq!(report.pattern_number, 30);
        assert_eq!(report.total_clusters, 2);
        assert_eq!(report.conforming_clusters, 1);
        assert!((report.mean_adherence - 0.55).abs() < 1e-12);
        // mean population 102.5 < 0.8 * 275
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("consolidating")),
            "{:?}",
            report.recommendations
        );
    }

    #[test]
    fn interpret_empty_recommends_more_data() {
        let pattern = crate::registry::pattern(12).unwrap();
        let report = interpret(&[], &pattern);
        assert_eq!(report.total_clusters, 0);
        assert!(report.mean_adherence.abs() < f64::EPSILON);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn analyze_runs_detection() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let points: Vec<SpatialPoint> = (0..6)
            .map(|i| {
                SpatialPoint::new(
                    format!("s{i}"),
                    40.0 + f64::from(i) * 0.000_1,
                    -75.0,
                    t0 + Duration::minutes(i64::from(i)),
                )
            })
            .collect();
        let report = analyze(&points, ClusterParams::default(), 61).unwrap();
        assert_eq!(report.total_clusters, 1);
        assert_eq!(report.clusters[0].pattern_number, 61);
    }
}
