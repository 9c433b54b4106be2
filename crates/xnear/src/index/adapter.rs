//! The pluggable index adapter contract.
//!
//! ## Purpose
//!
//! This module defines the uniform build/query capability every
//! nearest-neighbor search backend is wrapped behind. Heterogeneous backends
//! (k-d trees, ball trees, spherical point indexes) become interchangeable
//! once an adapter implements this contract for them.
//!
//! ## Key concepts
//!
//! * **Opaque handles**: `build` returns a type-erased `IndexHandle`; the
//!   adapter that built a handle is the only one that can query it, and
//!   downcasts it back to its native structure.
//! * **k = 1 semantics**: `query` returns exactly one nearest neighbor per
//!   input point. Larger neighborhoods are not part of the contract.
//!
//! ## Invariants
//!
//! * `build` and `query` never mutate their input points.
//! * Any coordinate transform (for instance degrees to radians) is fixed at
//!   adapter construction and applied identically on both paths, so indexed
//!   and query points always live in the same space.

use std::any::Any;

use ndarray::{Array1, ArrayView2};

use crate::errors::XnearError;

/// Opaque handle to a built search structure.
pub type IndexHandle = Box<dyn Any + Send + Sync>;

/// One nearest-neighbor answer for one query point.
///
/// `position` is a global flat index into the unpartitioned point array;
/// partition offsets are already applied, so records from different
/// partitions are directly comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRecord {
    pub distance: f64,
    pub position: usize,
}

/// Uniform wrapper around one nearest-neighbor search backend.
///
/// Construction-time options (leaf size, metric tuning) belong to the
/// adapter instance and are reused for every `build`/`query` call on it.
pub trait IndexAdapter: Send + Sync {
    /// Build an index from a `(n_points, n_coords)` point array.
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError>;

    /// Query the nearest indexed neighbor of each point in a
    /// `(n_queries, n_coords)` array.
    ///
    /// Returns the distances and the positions of the neighbors in the
    /// array passed to `build`.
    fn query(
        &self,
        index: &IndexHandle,
        points: ArrayView2<'_, f64>,
    ) -> Result<(Array1<f64>, Array1<usize>), XnearError>;
}
