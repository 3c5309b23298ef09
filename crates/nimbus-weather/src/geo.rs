//! Spatial indexing of cache keys by coordinate.
//!
//! The index is an R-tree of `(key, position)` point objects. Tree pruning
//! runs in squared-Euclidean degree space; radius queries then apply an
//! exact haversine filter so the radius semantics callers see are
//! kilometers of great-circle distance.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::types::Point;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEG: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// A cache key pinned to a coordinate, as stored in the R-tree.
#[derive(Debug, Clone)]
struct IndexedKey {
    key: String,
    position: [f64; 2],
}

impl RTreeObject for IndexedKey {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedKey {
    /// Squared Euclidean distance in degree space; used only for tree
    /// pruning, never as the distance reported to callers.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// An index entry matched by a radius query, annotated with its
/// great-circle distance from the query center.
#[derive(Debug, Clone)]
pub struct GeoMatch {
    pub key: String,
    pub distance_km: f64,
}

/// Radius-queryable collection of `(key, Point)` pairs.
///
/// Entries are a secondary index over cache keys; one entry per position.
#[derive(Debug, Default)]
pub struct GeoIndex {
    tree: RTree<IndexedKey>,
}

impl GeoIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Insert or update the entry at `point`.
    pub fn insert(&mut self, key: String, point: Point) {
        let position = [point.latitude, point.longitude];
        self.tree.remove_at_point(&position);
        self.tree.insert(IndexedKey { key, position });
    }

    /// Remove the entry at `point`, if any.
    pub fn remove(&mut self, point: Point) -> Option<String> {
        self.tree
            .remove_at_point(&[point.latitude, point.longitude])
            .map(|entry| entry.key)
    }

    /// All entries within `radius_km` great-circle kilometers of `center`,
    /// each annotated with its distance. Order is unspecified.
    pub fn within_radius(&self, center: Point, radius_km: f64) -> Vec<GeoMatch> {
        if radius_km <= 0.0 {
            return Vec::new();
        }

        // Over-covering degree-space bound for the planar prefilter: a
        // degree of longitude shrinks by cos(latitude), so widen the
        // longitude span accordingly. The haversine check below is exact.
        let lat_span = radius_km / KM_PER_DEG;
        let cos_lat = center.latitude.to_radians().cos().abs();
        let lon_span = if cos_lat > f64::EPSILON {
            (lat_span / cos_lat).min(360.0)
        } else {
            360.0
        };
        let bound = (lat_span * lat_span + lon_span * lon_span).sqrt() * 1.01;

        self.tree
            .locate_within_distance([center.latitude, center.longitude], bound * bound)
            .filter_map(|entry| {
                let point = Point::new(entry.position[0], entry.position[1]);
                let distance_km = haversine_km(center, point);
                (distance_km <= radius_km).then(|| GeoMatch {
                    key: entry.key.clone(),
                    distance_km,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}

/// Great-circle distance between two points in kilometers.
///
/// Uses the haversine formula for accuracy over short distances.
pub fn haversine_km(from: Point, to: Point) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
