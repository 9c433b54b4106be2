//! Metric ball tree for exact nearest-neighbor queries.
//!
//! ## Purpose
//!
//! This module provides the ball tree search backend used by the `balltree`
//! and `geo_balltree` adapters. Unlike an axis-aligned k-d tree it supports
//! arbitrary metrics, which is what makes haversine queries over latitude /
//! longitude points possible.
//!
//! ## Design notes
//!
//! * **Median splitting**: nodes split their point range at the median of
//!   the dimension with the largest spread, via `select_nth_unstable_by`.
//! * **Triangle-inequality pruning**: a branch is skipped when the distance
//!   to its ball center minus its radius cannot beat the current best.
//! * **Generics**: generic over `Float` point types.
//!
//! ## Invariants
//!
//! * The radius of a node is the maximum metric distance from its center to
//!   any member point, so pruning is exact for any metric satisfying the
//!   triangle inequality.
//! * Queries never mutate the tree; build order fully determines layout.

use num_traits::Float;

use super::geo;

/// Distance metric used by a ball tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeMetric {
    /// Straight-line distance in coordinate space.
    #[default]
    Euclidean,
    /// Great-circle distance between `(lat, lon)` points given in radians.
    Haversine,
}

impl TreeMetric {
    /// Distance between two points of equal dimension.
    pub fn distance<T: Float>(&self, a: &[T], b: &[T]) -> T {
        match self {
            TreeMetric::Euclidean => {
                let mut acc = T::zero();
                for (&x, &y) in a.iter().zip(b.iter()) {
                    let diff = x - y;
                    acc = acc + diff * diff;
                }
                acc.sqrt()
            }
            TreeMetric::Haversine => geo::haversine(a, b),
        }
    }
}

/// Default number of points per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 40;

#[derive(Debug, Clone)]
struct BallNode<T> {
    center: Vec<T>,
    radius: T,
    /// Child node ids for internal nodes; `None` marks a leaf.
    children: Option<(usize, usize)>,
    /// Range into the index permutation covered by this node.
    start: usize,
    end: usize,
}

/// Ball tree over a flat, row-major `(n, dims)` point buffer.
#[derive(Debug, Clone)]
pub struct BallTree<T> {
    points: Vec<T>,
    dims: usize,
    leaf_size: usize,
    metric: TreeMetric,
    nodes: Vec<BallNode<T>>,
    indices: Vec<usize>,
}

impl<T: Float> BallTree<T> {
    /// Build a tree from `n * dims` row-major values.
    pub fn build(points: Vec<T>, dims: usize, leaf_size: usize, metric: TreeMetric) -> Self {
        let n = if dims == 0 { 0 } else { points.len() / dims };
        let mut tree = Self {
            points,
            dims,
            leaf_size: leaf_size.max(1),
            metric,
            nodes: Vec::new(),
            indices: (0..n).collect(),
        };
        if n > 0 {
            tree.build_node(0, n);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn metric(&self) -> TreeMetric {
        self.metric
    }

    fn point(&self, index: usize) -> &[T] {
        &self.points[index * self.dims..(index + 1) * self.dims]
    }

    /// Create the node covering `indices[start..end]`; returns its id.
    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let count = end - start;

        let mut center = vec![T::zero(); self.dims];
        for &index in &self.indices[start..end] {
            for (acc, &value) in center.iter_mut().zip(self.point(index)) {
                *acc = *acc + value;
            }
        }
        let denom = T::from(count).unwrap_or_else(T::one);
        for acc in center.iter_mut() {
            *acc = *acc / denom;
        }

        let mut radius = T::zero();
        for &index in &self.indices[start..end] {
            let d = self.metric.distance(&center, self.point(index));
            if d > radius {
                radius = d;
            }
        }

        let id = self.nodes.len();
        self.nodes.push(BallNode {
            center,
            radius,
            children: None,
            start,
            end,
        });

        if count > self.leaf_size {
            let split_dim = self.widest_dimension(start, end);
            let mid = start + count / 2;
            let points = &self.points;
            let dims = self.dims;
            self.indices[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
                let va = points[a * dims + split_dim];
                let vb = points[b * dims + split_dim];
                va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let left = self.build_node(start, mid);
            let right = self.build_node(mid, end);
            self.nodes[id].children = Some((left, right));
        }

        id
    }

    fn widest_dimension(&self, start: usize, end: usize) -> usize {
        let mut best_dim = 0;
        let mut best_spread = T::neg_infinity();
        for dim in 0..self.dims {
            let mut lo = T::infinity();
            let mut hi = T::neg_infinity();
            for &index in &self.indices[start..end] {
                let value = self.points[index * self.dims + dim];
                if value < lo {
                    lo = value;
                }
                if value > hi {
                    hi = value;
                }
            }
            let spread = hi - lo;
            if spread > best_spread {
                best_spread = spread;
                best_dim = dim;
            }
        }
        best_dim
    }

    /// Distance and position of the nearest indexed point.
    ///
    /// Returns `None` only for an empty tree.
    pub fn nearest(&self, query: &[T]) -> Option<(T, usize)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = (T::infinity(), 0);
        self.search(0, query, &mut best);
        Some(best)
    }

    fn search(&self, node_id: usize, query: &[T], best: &mut (T, usize)) {
        let node = &self.nodes[node_id];
        let to_center = self.metric.distance(query, &node.center);
        if to_center - node.radius > best.0 {
            return;
        }

        match node.children {
            None => {
                for &index in &self.indices[node.start..node.end] {
                    let d = self.metric.distance(query, self.point(index));
                    if d < best.0 {
                        *best = (d, index);
                    }
                }
            }
            Some((left, right)) => {
                let to_left = self.metric.distance(query, &self.nodes[left].center);
                let to_right = self.metric.distance(query, &self.nodes[right].center);
                if to_left <= to_right {
                    self.search(left, query, best);
                    self.search(right, query, best);
                } else {
                    self.search(right, query, best);
                    self.search(left, query, best);
                }
            }
        }
    }
}
