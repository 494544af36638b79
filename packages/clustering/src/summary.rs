//! Per-cluster statistics: centroid, area, population estimate, density,
//! activity pattern and confidence.

use std::collections::BTreeMap;

use chrono::{Datelike as _, Timelike as _};
use pattern_discovery_clustering_models::{ActivityPattern, Cluster};
use pattern_discovery_spatial::{floored_area_km2, haversine_km, mean_coordinate};
use pattern_discovery_tracking_models::{Coordinate, SpatialPoint};

/// Cap on the activity multiplier applied to the unique-session count.
const MAX_ACTIVITY_RATIO: f64 = 10.0;

/// Points needed for full data-richness credit.
const RICHNESS_POINTS: f64 = 50.0;

/// Densities (people per km²) inside this open range count as plausible.
const PLAUSIBLE_DENSITY: (f64, f64) = (10.0, 10_000.0);

const COHESION_WEIGHT: f64 = 0.4;
const RICHNESS_WEIGHT: f64 = 0.4;
const PLAUSIBILITY_WEIGHT: f64 = 0.2;

/// Builds a [`Cluster`] for each member-index group.
///
/// Groups must be non-empty. Ids that collide after rounding get a numeric
/// suffix in group order.
#[must_use]
pub fn summarize_all(
    points: &[SpatialPoint],
    groups: &[Vec<usize>],
    epsilon_km: f64,
) -> Vec<Cluster> {
    let mut seen_ids: BTreeMap<String, usize> = BTreeMap::new();

    groups
        .iter()
        .filter(|g| !g.is_empty())
        .map(|group| {
            let members: Vec<SpatialPoint> = group.iter().map(|&i| points[i].clone()).collect();
            let mut cluster = summarize(members, epsilon_km);

            let count = seen_ids.entry(cluster.id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                cluster.id = format!("{}_{}", cluster.id, *count);
            }
            cluster
        })
        .collect()
}

/// Builds a [`Cluster`] from its member points.
///
/// `members` must be non-empty.
#[must_use]
pub fn summarize(members: Vec<SpatialPoint>, epsilon_km: f64) -> Cluster {
    let coords: Vec<Coordinate> = members.iter().map(SpatialPoint::coordinate).collect();
    let centroid = mean_coordinate(&coords).unwrap_or(Coordinate::new(0.0, 0.0));
    let area_km2 = floored_area_km2(&coords);
    let estimated_population = estimate_population(&members);
    #[allow(clippy::cast_precision_loss)]
    let density = estimated_population as f64 / area_km2;
    let confidence = confidence(&coords, centroid, density, epsilon_km);
    let activity_pattern = activity_pattern(&members);

    Cluster {
        id: cluster_id(centroid),
        centroid,
        member_points: members,
        estimated_population,
        area_km2,
        density,
        activity_pattern,
        confidence,
    }
}

/// Run-local id from the centroid rounded to four decimals (~11 m).
#[must_use]
pub fn cluster_id(centroid: Coordinate) -> String {
    format!("cluster_{:.4}_{:.4}", centroid.lat, centroid.lng)
}

/// Estimates how many people use the area the points cover.
///
/// Starts from the number of distinct sessions and scales it up by how
/// active those sessions were: each session contributes `ln(points + 1)`
/// of activity, and the activity-per-session ratio is capped at 10.
#[must_use]
pub fn estimate_population(members: &[SpatialPoint]) -> u64 {
    let mut per_session: BTreeMap<&str, u32> = BTreeMap::new();
    for point in members {
        *per_session.entry(point.session_id.as_str()).or_insert(0) += 1;
    }
    if per_session.is_empty() {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)]
    let base = per_session.len() as f64;
    let activity: f64 = per_session
        .values()
        .map(|&count| (f64::from(count) + 1.0).ln())
        .sum();
    let population = base * (1.0 + (activity / base).min(MAX_ACTIVITY_RATIO));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = population.round() as u64;
    rounded
}

/// Weighted blend of spatial cohesion, data richness and density
/// plausibility.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence(coords: &[Coordinate], centroid: Coordinate, density: f64, epsilon_km: f64) -> f64 {
    if coords.is_empty() {
        return 0.0;
    }

    let avg_distance =
        coords.iter().map(|&c| haversine_km(c, centroid)).sum::<f64>() / coords.len() as f64;
    let cohesion = if epsilon_km > 0.0 {
        (1.0 - avg_distance / epsilon_km).max(0.0)
    } else {
        0.0
    };
    let richness = (coords.len() as f64 / RICHNESS_POINTS).min(1.0);
    let plausibility: f64 = if density > PLAUSIBLE_DENSITY.0 && density < PLAUSIBLE_DENSITY.1 {
        1.0
    } else {
        0.5
    };

    plausibility.mul_add(
        PLAUSIBILITY_WEIGHT,
        cohesion.mul_add(COHESION_WEIGHT, richness * RICHNESS_WEIGHT),
    )
}

/// Hour-of-day peaks, weekday distribution and mean recorded speed.
#[must_use]
pub fn activity_pattern(members: &[SpatialPoint]) -> ActivityPattern {
    let mut hours = [0_u32; 24];
    let mut weekly_distribution = [0_u32; 7];
    let mut speed_sum = 0.0;
    let mut speed_count = 0_u32;

    for point in members {
        hours[point.timestamp.hour() as usize] += 1;
        weekly_distribution[point.timestamp.weekday().num_days_from_sunday() as usize] += 1;
        if let Some(speed) = point.speed.filter(|s| s.is_finite()) {
            speed_sum += speed;
            speed_count += 1;
        }
    }

    let mut ranked: Vec<(u32, u32)> = (0_u32..)
        .zip(hours)
        .filter(|(_, count)| *count > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let peak_hours = ranked.into_iter().take(3).map(|(hour, _)| hour).collect();

    let movement_intensity = if speed_count == 0 {
        0.0
    } else {
        speed_sum / f64::from(speed_count)
    };

    ActivityPattern {
        peak_hours,
        weekly_distribution,
        movement_intensity,
    }
}
