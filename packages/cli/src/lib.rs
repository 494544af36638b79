#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point file loading for the offline analysis CLI.
//!
//! A points file is a JSON array whose entries are either bare
//! [`SpatialPoint`]s or tagged [`PointRecord`]s. Entries that match
//! neither shape are skipped with a warning.

use std::path::{Path, PathBuf};

use pattern_discovery_tracking_models::{PointRecord, SpatialPoint};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a points file.
#[derive(Debug, Error)]
pub enum CliError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a JSON array.
    #[error("Invalid points file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointInput {
    Record(PointRecord),
    Point(SpatialPoint),
}

impl PointInput {
    fn into_point(self) -> SpatialPoint {
        match self {
            Self::Record(record) => record.into_point(),
            Self::Point(point) => point,
        }
    }
}

/// Parses a JSON array of points or point records.
///
/// # Errors
///
/// * [`CliError::Json`] if the text is not a JSON array
pub fn parse_points(json: &str) -> Result<Vec<SpatialPoint>, CliError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = entries.len();

    let points: Vec<SpatialPoint> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<PointInput>(entry) {
            Ok(input) => Some(input.into_point()),
            Err(e) => {
                log::warn!("Skipping malformed point at index {i}: {e}");
                None
            }
        })
        .collect();

    log::debug!("Parsed {} of {total} points", points.len());
    Ok(points)
}

/// Reads and parses a points file.
///
/// # Errors
///
/// * [`CliError::Io`] if the file cannot be read
/// * [`CliError::Json`] if the file is not a JSON array
pub fn load_points(path: &Path) -> Result<Vec<SpatialPoint>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_points(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_points_and_records() {
        let json = r#"[
            {"latitude": 40.0, "longitude": -75.0, "sessionId": "s1", "timestamp": "2024-06-03T09:00:00Z"},
            {"kind": "saved", "point": {"latitude": 40.1, "longitude": -75.1, "sessionId": "s2", "timestamp": "2024-06-03T09:05:00Z", "speed": 4.0}, "name": "Cafe", "note": null},
            {"kind": "tracking", "point": {"latitude": 40.2, "longitude": -75.2, "sessionId": "s3", "timestamp": "2024-06-03T09:10:00Z"}}
        ]"#;
        let points = parse_points(json).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].session_id, "s2");
        assert_eq!(points[1].speed, Some(4.0));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let json = r#"[
            {"latitude": 40.0, "longitude": -75.0, "sessionId": "s1", "timestamp": "2024-06-03T09:00:00Z"},
            {"latitude": "north"},
            42
        ]"#;
        assert_eq!(parse_points(json).unwrap().len(), 1);
    }

    #[test]
    fn non_array_is_an_error() {
        assert!(matches!(parse_points("{}"), Err(CliError::Json(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_points(Path::new("/nonexistent/points.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
