//! Static k-d tree with a metric supplied by the point type.
//!
//! Points are stored in one `Vec` laid out as an implicit balanced tree: the
//! median of every sub-slice is its root, split on `depth % DIMS`. The tree
//! is built once and never mutated.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What the tree needs to know about a point.
///
/// `distance` and `plane_distance` define the metric. The search prunes a
/// subtree when `plane_distance` to its splitting plane is not below the
/// current k-th best distance, so results are exact only when
/// `plane_distance` is a lower bound of `distance`.
pub trait KdPoint {
    const DIMS: usize;

    fn coord(&self, axis: usize) -> f64;

    fn distance<O: KdPoint + ?Sized>(&self, other: &O) -> f64;

    /// Distance from `self` to the plane `coord(axis) == value`.
    fn plane_distance(&self, value: f64, axis: usize) -> f64;
}

impl<T: KdPoint> KdPoint for std::sync::Arc<T> {
    const DIMS: usize = T::DIMS;

    fn coord(&self, axis: usize) -> f64 {
        (**self).coord(axis)
    }

    fn distance<O: KdPoint + ?Sized>(&self, other: &O) -> f64 {
        (**self).distance(other)
    }

    fn plane_distance(&self, value: f64, axis: usize) -> f64 {
        (**self).plane_distance(value, axis)
    }
}

/// A search hit.
#[derive(Debug)]
pub struct Neighbor<'a, P> {
    pub point: &'a P,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

pub struct KdTree<P> {
    points: Vec<P>,
}

impl<P: KdPoint> KdTree<P> {
    pub fn build(mut points: Vec<P>) -> Self {
        Self::partition(&mut points, 0);
        Self { points }
    }

    fn partition(points: &mut [P], depth: usize) {
        if points.len() <= 1 {
            return;
        }

        let axis = depth % P::DIMS;
        let mid = points.len() / 2;
        points.select_nth_unstable_by(mid, |a, b| a.coord(axis).total_cmp(&b.coord(axis)));

        let (left, rest) = points.split_at_mut(mid);
        Self::partition(left, depth + 1);
        Self::partition(&mut rest[1..], depth + 1);
    }

    /// The `k` closest points to `query`, nearest first.
    pub fn nearest<Q: KdPoint + ?Sized>(&self, query: &Q, k: usize) -> Vec<Neighbor<'_, P>> {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }

        let mut best = BinaryHeap::with_capacity(k + 1);
        self.search(query, 0, self.points.len(), 0, k, &mut best);

        best.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                point: &self.points[c.index],
                distance: c.distance,
            })
            .collect()
    }

    pub fn nearest_one<Q: KdPoint + ?Sized>(&self, query: &Q) -> Option<Neighbor<'_, P>> {
        self.nearest(query, 1).into_iter().next()
    }

    fn search<Q: KdPoint + ?Sized>(
        &self,
        query: &Q,
        lo: usize,
        hi: usize,
        depth: usize,
        k: usize,
        best: &mut BinaryHeap<Candidate>,
    ) {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let axis = depth % P::DIMS;
        let point = &self.points[mid];

        let candidate = Candidate {
            distance: query.distance(point),
            index: mid,
        };
        if best.len() < k {
            best.push(candidate);
        } else if best.peek().is_some_and(|worst| candidate < *worst) {
            best.pop();
            best.push(candidate);
        }

        let split = point.coord(axis);
        let (near, far) = if query.coord(axis) < split {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(query, near.0, near.1, depth + 1, k, best);

        let visit_far = match best.peek() {
            Some(worst) if best.len() >= k => query.plane_distance(split, axis) < worst.distance,
            _ => true,
        };
        if visit_far {
            self.search(query, far.0, far.1, depth + 1, k, best);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in tree order.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Euclidean point, for which the plane distance is a true lower bound.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Planar([f64; 2]);

    impl KdPoint for Planar {
        const DIMS: usize = 2;

        fn coord(&self, axis: usize) -> f64 {
            self.0[axis]
        }

        fn distance<O: KdPoint + ?Sized>(&self, other: &O) -> f64 {
            let dx = self.0[0] - other.coord(0);
            let dy = self.0[1] - other.coord(1);
            (dx * dx + dy * dy).sqrt()
        }

        fn plane_distance(&self, value: f64, axis: usize) -> f64 {
            (self.0[axis] - value).abs()
        }
    }

    fn random_points(rng: &mut StdRng, n: usize) -> Vec<Planar> {
        (0..n)
            .map(|_| Planar([rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0)]))
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree: KdTree<Planar> = KdTree::build(vec![]);
        assert!(tree.is_empty());
        assert!(tree.nearest_one(&Planar([0.0, 0.0])).is_none());
    }

    #[test]
    fn test_single_point() {
        let tree = KdTree::build(vec![Planar([3.0, 4.0])]);
        let hit = tree.nearest_one(&Planar([0.0, 0.0])).unwrap();
        assert_eq!(*hit.point, Planar([3.0, 4.0]));
        assert!((hit.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_build_keeps_all_points() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = random_points(&mut rng, 257);
        let tree = KdTree::build(points.clone());
        assert_eq!(tree.len(), 257);
        for p in &points {
            assert!(tree.iter().any(|q| q == p));
        }
    }

    #[test]
    fn test_nearest_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = random_points(&mut rng, 500);
        let tree = KdTree::build(points.clone());

        for _ in 0..200 {
            let query = Planar([rng.random_range(-120.0..120.0), rng.random_range(-120.0..120.0)]);
            let expected = points
                .iter()
                .map(|p| query.distance(p))
                .fold(f64::INFINITY, f64::min);
            let hit = tree.nearest_one(&query).unwrap();
            assert_eq!(hit.distance, expected);
        }
    }

    #[test]
    fn test_k_nearest_sorted_and_exact() {
        let mut rng = StdRng::seed_from_u64(11);
        let points = random_points(&mut rng, 300);
        let tree = KdTree::build(points.clone());
        let query = Planar([5.0, -5.0]);

        let mut expected: Vec<f64> = points.iter().map(|p| query.distance(p)).collect();
        expected.sort_by(f64::total_cmp);

        let hits = tree.nearest(&query, 8);
        let got: Vec<f64> = hits.iter().map(|n| n.distance).collect();
        assert_eq!(got, expected[..8].to_vec());
    }

    #[test]
    fn test_k_larger_than_tree() {
        let tree = KdTree::build(vec![Planar([0.0, 0.0]), Planar([1.0, 1.0])]);
        assert_eq!(tree.nearest(&Planar([0.0, 0.0]), 5).len(), 2);
        assert!(tree.nearest(&Planar([0.0, 0.0]), 0).is_empty());
    }

    #[test]
    fn test_duplicate_coordinates() {
        let tree = KdTree::build(vec![Planar([1.0, 1.0]); 6]);
        let hits = tree.nearest(&Planar([1.0, 1.0]), 3);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|n| n.distance == 0.0));
    }
}
