#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for GPS point analysis.
//!
//! Provides great-circle distances, a bounding-box area approximation, and
//! an in-memory R-tree over point positions for fast radius lookups. Used by
//! the cluster detector for epsilon neighbourhoods and by the point store
//! for "points near a location" queries.

use geo::{BoundingRect, Distance, Haversine, MultiPoint, Point};
use pattern_discovery_tracking_models::{Coordinate, SpatialPoint};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

/// Smallest area a point set is ever reported to cover, so densities stay
/// finite.
pub const MIN_AREA_KM2: f64 = 0.1;

/// Great-circle distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat)) / 1000.0
}

/// Great-circle distance between two recorded points in kilometres.
#[must_use]
pub fn point_distance_km(a: &SpatialPoint, b: &SpatialPoint) -> f64 {
    haversine_km(a.coordinate(), b.coordinate())
}

/// Arithmetic mean of a set of coordinates.
///
/// Returns `None` for an empty set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_coordinate(coords: &[Coordinate]) -> Option<Coordinate> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (lat, lng) = coords
        .iter()
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
    Some(Coordinate::new(lat / n, lng / n))
}

/// Approximate area in km² of the bounding box around `coords`.
///
/// Longitude span is scaled by the cosine of the box's mid latitude. The
/// raw value may be zero; callers that divide by it should go through
/// [`floored_area_km2`].
#[must_use]
pub fn bounding_box_area_km2(coords: &[Coordinate]) -> f64 {
    let multi: MultiPoint<f64> = coords
        .iter()
        .map(|c| Point::new(c.lng, c.lat))
        .collect::<Vec<_>>()
        .into();

    multi.bounding_rect().map_or(0.0, |rect| {
        let mid_lat = f64::midpoint(rect.min().y, rect.max().y);
        let height_km = rect.height() * KM_PER_DEGREE;
        let width_km = rect.width() * KM_PER_DEGREE * mid_lat.to_radians().cos().abs();
        height_km * width_km
    })
}

/// [`bounding_box_area_km2`] clamped to at least [`MIN_AREA_KM2`].
#[must_use]
pub fn floored_area_km2(coords: &[Coordinate]) -> f64 {
    bounding_box_area_km2(coords).max(MIN_AREA_KM2)
}

type IndexedPosition = GeomWithData<[f64; 2], usize>;

/// R-tree over the positions of a point slice.
///
/// Entries remember their index in the original slice, so lookups can be
/// mapped back to the caller's ordering.
pub struct PointIndex {
    tree: RTree<IndexedPosition>,
    coords: Vec<Coordinate>,
}

impl PointIndex {
    /// Builds an index over `points`, preserving their slice indices.
    #[must_use]
    pub fn new(points: &[SpatialPoint]) -> Self {
        let coords: Vec<Coordinate> = points.iter().map(SpatialPoint::coordinate).collect();
        Self::from_coordinates(coords)
    }

    #[must_use]
    pub fn from_coordinates(coords: Vec<Coordinate>) -> Self {
        let entries = coords
            .iter()
            .enumerate()
            .map(|(idx, c)| GeomWithData::new([c.lng, c.lat], idx))
            .collect();
        let tree = RTree::bulk_load(entries);
        log::trace!("Built point index over {} positions", coords.len());

        Self { tree, coords }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Indices of every indexed position within `radius_km` of `center`,
    /// in ascending index order.
    ///
    /// The R-tree is queried with a degree envelope around `center` and the
    /// candidates are then filtered by exact haversine distance. Envelopes
    /// do not wrap across the antimeridian.
    #[must_use]
    pub fn within_km(&self, center: Coordinate, radius_km: f64) -> Vec<usize> {
        let envelope = degree_envelope(center, radius_km);

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .filter(|&idx| haversine_km(center, self.coords[idx]) <= radius_km)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Same as [`Self::within_km`], centred on an indexed position.
    ///
    /// The position itself is always included.
    #[must_use]
    pub fn neighbours_of(&self, idx: usize, radius_km: f64) -> Vec<usize> {
        self.within_km(self.coords[idx], radius_km)
    }
}

/// Bounding envelope, in `[lng, lat]` degrees, that contains every point
/// within `radius_km` of `center`.
fn degree_envelope(center: Coordinate, radius_km: f64) -> AABB<[f64; 2]> {
    // Pad slightly so points sitting exactly on the radius survive the
    // prefilter and are decided by the haversine test.
    let padded = radius_km * 1.01;
    let dlat = padded / KM_PER_DEGREE;
    let cos_lat = center.lat.to_radians().cos().abs().max(1e-6);
    let dlng = (padded / (KM_PER_DEGREE * cos_lat)).min(180.0);

    AABB::from_corners(
        [center.lng - dlng, center.lat - dlat],
        [center.lng + dlng, center.lat + dlat],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((d - 111.2).abs() < 0.5, "unexpected distance {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let c = coord(40.7, -74.0);
        assert!(haversine_km(c, c).abs() < 1e-9);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean_coordinate(&[]), None);
    }

    #[test]
    fn mean_is_arithmetic() {
        let mean = mean_coordinate(&[coord(1.0, 2.0), coord(3.0, 4.0)]).unwrap();
        assert!((mean.lat - 2.0).abs() < 1e-12);
        assert!((mean.lng - 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_point_area_is_floored() {
        let coords = [coord(10.0, 10.0)];
        assert!(bounding_box_area_km2(&coords).abs() < 1e-12);
        assert!((floored_area_km2(&coords) - MIN_AREA_KM2).abs() < 1e-12);
    }

    #[test]
    fn one_degree_box_at_equator() {
        let area = bounding_box_area_km2(&[coord(0.0, 0.0), coord(1.0, 1.0)]);
        // ~111 km x ~111 km, scaled by cos(0.5 deg)
        assert!((area - 12_392.0).abs() < 20.0, "unexpected area {area}");
    }

    #[test]
    fn within_km_filters_and_orders() {
        let now = Utc::now();
        let points = vec![
            SpatialPoint::new("a", 0.0, 0.0, now),
            SpatialPoint::new("a", 0.0, 1.0, now),
            SpatialPoint::new("a", 0.001, 0.0, now),
            SpatialPoint::new("a", 0.0, 0.002, now),
        ];
        let index = PointIndex::new(&points);
        assert_eq!(index.len(), 4);

        let hits = index.neighbours_of(0, 0.5);
        assert_eq!(hits, vec![0, 2, 3]);
    }

    #[test]
    fn empty_index_has_no_hits() {
        let index = PointIndex::from_coordinates(Vec::new());
        assert!(index.is_empty());
        assert!(index.within_km(coord(0.0, 0.0), 10.0).is_empty());
    }
}
