#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! GPS point types and movement classifications.
//!
//! A [`SpatialPoint`] is one anonymized GPS fix recorded for a session.
//! Points are immutable once recorded and owned by the external point
//! store; every analysis in the system reads them fresh at call time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// How a participant was moving when a point (or run of points) was
/// recorded.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    /// Not moving (at most 0.5 km/h).
    Stationary,
    /// On foot (up to 6 km/h).
    Walking,
    /// Cycling (up to 25 km/h).
    Biking,
    /// Private vehicle.
    Driving,
    /// Bus, tram or train.
    Transit,
}

impl MovementType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stationary,
            Self::Walking,
            Self::Biking,
            Self::Driving,
            Self::Transit,
        ]
    }

    /// Voting weight multiplier for time spent in this mode.
    ///
    /// Slower, more present modes count for more than passing through in a
    /// car.
    #[must_use]
    pub const fn weight_factor(self) -> f64 {
        match self {
            Self::Walking => 1.5,
            Self::Stationary => 1.4,
            Self::Biking => 1.3,
            Self::Transit => 1.1,
            Self::Driving => 0.8,
        }
    }
}

/// One anonymized GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Anonymous session the point belongs to.
    pub session_id: String,
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
    /// Device-reported speed in km/h, if any.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Device-reported movement mode, if any.
    #[serde(default)]
    pub movement_type: Option<MovementType>,
}

impl SpatialPoint {
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            session_id: session_id.into(),
            timestamp,
            speed: None,
            movement_type: None,
        }
    }

    /// Sets the device-reported speed (km/h).
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A stored point tagged by how it entered the system.
///
/// Each variant carries only the fields relevant to it rather than a
/// free-form metadata blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointRecord {
    /// Raw background tracking fix.
    Tracking {
        /// The recorded fix.
        point: SpatialPoint,
    },
    /// A fix that has been through analysis.
    Analyzed {
        /// The recorded fix.
        point: SpatialPoint,
        /// Cluster the point fell into during the run that analyzed it.
        #[serde(rename = "clusterId")]
        cluster_id: Option<String>,
        /// Movement mode assigned by segmentation.
        #[serde(rename = "movementType")]
        movement_type: MovementType,
    },
    /// A place the participant explicitly saved.
    Saved {
        /// The recorded fix.
        point: SpatialPoint,
        /// Participant-supplied label.
        name: String,
        /// Optional free-text note.
        #[serde(default)]
        note: Option<String>,
    },
}

impl PointRecord {
    /// The underlying GPS fix, whatever the record kind.
    #[must_use]
    pub const fn point(&self) -> &SpatialPoint {
        match self {
            Self::Tracking { point } | Self::Analyzed { point, .. } | Self::Saved { point, .. } => {
                point
            }
        }
    }

    #[must_use]
    pub fn into_point(self) -> SpatialPoint {
        match self {
            Self::Tracking { point } | Self::Analyzed { point, .. } | Self::Saved { point, .. } => {
                point
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn sample_point() -> SpatialPoint {
        SpatialPoint::new("s1", 47.6, -122.3, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn movement_type_string_roundtrip() {
        for mode in MovementType::all() {
            let parsed: MovementType = mode.to_string().parse().unwrap();
            assert_eq!(parsed, *mode);
        }
        assert_eq!(MovementType::Stationary.as_ref(), "stationary");
    }

    #[test]
    fn weight_factors_match_table() {
        assert!((MovementType::Walking.weight_factor() - 1.5).abs() < f64::EPSILON);
        assert!((MovementType::Stationary.weight_factor() - 1.4).abs() < f64::EPSILON);
        assert!((MovementType::Biking.weight_factor() - 1.3).abs() < f64::EPSILON);
        assert!((MovementType::Transit.weight_factor() - 1.1).abs() < f64::EPSILON);
        assert!((MovementType::Driving.weight_factor() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn point_record_tagged_by_kind() {
        let record = PointRecord::Saved {
            point: sample_point(),
            name: "Corner cafe".to_string(),
            note: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "saved");
        assert_eq!(json["point"]["sessionId"], "s1");

        let back: PointRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.point(), &sample_point());
    }

    #[test]
    fn point_without_optional_fields_deserializes() {
        let json = serde_json::json!({
            "latitude": 1.0,
            "longitude": 2.0,
            "sessionId": "abc",
            "timestamp": "2024-05-01T12:00:00Z"
        });
        let point: SpatialPoint = serde_json::from_value(json).unwrap();
        assert_eq!(point.speed, None);
        assert_eq!(point.movement_type, None);
    }
}
