//! Splits a session's ordered points into runs of one movement type.

use pattern_discovery_spatial::point_distance_km;
use pattern_discovery_tracking_models::{MovementType, SpatialPoint};
use pattern_discovery_voting_models::MovementSegment;

/// Speeds at or below this are stationary (km/h).
pub const STATIONARY_MAX_KMH: f64 = 0.5;
/// Upper bound of walking speed (km/h).
pub const WALKING_MAX_KMH: f64 = 6.0;
/// Upper bound of biking speed (km/h).
pub const BIKING_MAX_KMH: f64 = 25.0;
/// Upper bound of the band where driving and transit look alike (km/h).
pub const AMBIGUOUS_MAX_KMH: f64 = 80.0;
/// Mean speed change below which an ambiguous run is treated as transit.
pub const TRANSIT_MAX_SPEED_DELTA_KMH: f64 = 5.0;
/// Number of trailing points used to judge speed variation.
pub const SPEED_HISTORY_POINTS: usize = 3;
/// Longest silence between consecutive points that still continues a
/// segment (minutes).
pub const MAX_POINT_GAP_MINUTES: i64 = 10;

/// Instantaneous speed of every point in km/h.
///
/// A usable device-reported speed wins. Otherwise the speed is derived from
/// the distance and elapsed time to the previous point, or to the next one
/// for the first point. Zero elapsed time yields 0.
#[must_use]
pub fn point_speeds(points: &[SpatialPoint]) -> Vec<f64> {
    (0..points.len())
        .map(|i| {
            if let Some(speed) = points[i].speed.filter(|s| s.is_finite() && *s >= 0.0) {
                return speed;
            }
            let (a, b) = match i {
                0 if points.len() > 1 => (&points[0], &points[1]),
                0 => return 0.0,
                _ => (&points[i - 1], &points[i]),
            };
            derived_speed_kmh(a, b)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn derived_speed_kmh(a: &SpatialPoint, b: &SpatialPoint) -> f64 {
    let millis = (b.timestamp - a.timestamp).num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    let hours = millis as f64 / 3_600_000.0;
    point_distance_km(a, b) / hours
}

/// Buckets a speed into a movement type.
///
/// `recent` holds the speeds of the trailing points, ending with the
/// current one, and is only consulted in the driving/transit band. Without
/// at least two recent speeds the band defaults to driving.
#[must_use]
pub fn classify_speed(speed: f64, recent: &[f64]) -> MovementType {
    if speed <= STATIONARY_MAX_KMH {
        MovementType::Stationary
    } else if speed <= WALKING_MAX_KMH {
        MovementType::Walking
    } else if speed <= BIKING_MAX_KMH {
        MovementType::Biking
    } else if speed <= AMBIGUOUS_MAX_KMH {
        match mean_abs_delta(recent) {
            Some(delta) if delta < TRANSIT_MAX_SPEED_DELTA_KMH => MovementType::Transit,
            _ => MovementType::Driving,
        }
    } else {
        MovementType::Driving
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_abs_delta(speeds: &[f64]) -> Option<f64> {
    if speeds.len() < 2 {
        return None;
    }
    let total: f64 = speeds.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    Some(total / (speeds.len() - 1) as f64)
}

/// Classifies each point from its speed and the speeds before it.
///
/// Device-reported movement types are not trusted; classification always
/// comes from speed.
#[must_use]
pub fn classify_points(points: &[SpatialPoint]) -> Vec<MovementType> {
    let speeds = point_speeds(points);
    (0..speeds.len())
        .map(|i| {
            let from = (i + 1).saturating_sub(SPEED_HISTORY_POINTS);
            classify_speed(speeds[i], &speeds[from..=i])
        })
        .collect()
}

/// Segments time-ordered points into maximal runs of one movement type.
///
/// A run also ends where consecutive points are more than
/// [`MAX_POINT_GAP_MINUTES`] apart, so time spent away between two visits
/// is not counted. The returned segments partition the input in order:
/// their `start_index`/`point_count` ranges are contiguous and cover every
/// point exactly once. Empty input yields no segments.
#[must_use]
pub fn segment(points: &[SpatialPoint]) -> Vec<MovementSegment> {
    if points.is_empty() {
        return vec![];
    }

    let speeds = point_speeds(points);
    let types = classify_points(points);

    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..=points.len() {
        if i == points.len()
            || types[i] != types[start]
            || recording_gap(&points[i - 1], &points[i])
        {
            segments.push(build_segment(points, &speeds, types[start], start, i));
            start = i;
        }
    }

    log::debug!(
        "Segmented {} points into {} movement segments",
        points.len(),
        segments.len()
    );

    segments
}

fn recording_gap(a: &SpatialPoint, b: &SpatialPoint) -> bool {
    (b.timestamp - a.timestamp).num_minutes() > MAX_POINT_GAP_MINUTES
}

#[allow(clippy::cast_precision_loss)]
fn build_segment(
    points: &[SpatialPoint],
    speeds: &[f64],
    movement_type: MovementType,
    start: usize,
    end: usize,
) -> MovementSegment {
    let run = &points[start..end];
    let first = &run[0];
    let last = &run[run.len() - 1];

    let time_spent_minutes =
        (last.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0;
    let average_speed = speeds[start..end].iter().sum::<f64>() / run.len() as f64;
    let distance_covered_km = run
        .windows(2)
        .map(|w| point_distance_km(&w[0], &w[1]))
        .sum();

    MovementSegment {
        movement_type,
        start_time: first.timestamp,
        end_time: last.timestamp,
        time_spent_minutes,
        average_speed,
        distance_covered_km,
        weight_factor: movement_type.weight_factor(),
        start_index: start,
        point_count: run.len(),
    }
}
