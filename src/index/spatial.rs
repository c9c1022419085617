//! Nearest-neighbor search over geographic points.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::geodesic::{haversine_km, plane_distance_km};
use super::{KdPoint, KdTree};
use crate::models::{GeoItem, GeoPoint};

const LAT: usize = 0;

impl KdPoint for GeoPoint {
    const DIMS: usize = 2;

    fn coord(&self, axis: usize) -> f64 {
        if axis == LAT {
            self.lat
        } else {
            self.lng
        }
    }

    fn distance<O: KdPoint + ?Sized>(&self, other: &O) -> f64 {
        haversine_km(self.lat, self.lng, other.coord(0), other.coord(1))
    }

    fn plane_distance(&self, value: f64, axis: usize) -> f64 {
        plane_distance_km(self.coord(axis), value)
    }
}

impl KdPoint for GeoItem {
    const DIMS: usize = 2;

    fn coord(&self, axis: usize) -> f64 {
        if axis == LAT {
            self.lat()
        } else {
            self.lng()
        }
    }

    fn distance<O: KdPoint + ?Sized>(&self, other: &O) -> f64 {
        haversine_km(self.lat(), self.lng(), other.coord(0), other.coord(1))
    }

    fn plane_distance(&self, value: f64, axis: usize) -> f64 {
        plane_distance_km(self.coord(axis), value)
    }
}

/// K-d tree over (lat, lng) with haversine distance in kilometers.
///
/// Pruning uses [`plane_distance_km`], which is not a lower bound of the
/// haversine distance off the equator; at high latitudes a query can miss
/// the true nearest point.
pub struct SpatialIndex {
    tree: KdTree<Arc<GeoItem>>,
}

impl SpatialIndex {
    pub fn build(points: Vec<Arc<GeoItem>>) -> Self {
        let started = Instant::now();
        let count = points.len();
        let tree = KdTree::build(points);
        info!(
            "Spatial index built with {} points in {:?}",
            count,
            started.elapsed()
        );
        Self { tree }
    }

    pub fn nearest(&self, lat: f64, lng: f64) -> Option<&Arc<GeoItem>> {
        self.tree
            .nearest_one(&GeoPoint::new(lat, lng))
            .map(|n| n.point)
    }

    /// Up to `k` items with their distance in kilometers, nearest first.
    pub fn nearest_k(&self, lat: f64, lng: f64, k: usize) -> Vec<(&Arc<GeoItem>, f64)> {
        self.tree
            .nearest(&GeoPoint::new(lat, lng), k)
            .into_iter()
            .map(|n| (n.point, n.distance))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
