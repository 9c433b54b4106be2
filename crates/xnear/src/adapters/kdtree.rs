//! Euclidean k-d tree adapter.
//!
//! ## Purpose
//!
//! Wraps the `kdtree` crate's axis-aligned k-d tree behind the adapter
//! contract. This is the default choice for plain cartesian coordinates of
//! any dimension.

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use ndarray::{Array1, ArrayView2};

use crate::errors::XnearError;
use crate::index::{AdapterOptions, IndexAdapter, IndexHandle};

/// Built k-d tree handle, mapping tree entries back to row positions.
pub struct KdTreeIndex {
    tree: KdTree<f64, usize, Vec<f64>>,
}

impl KdTreeIndex {
    pub(crate) fn build(
        points: ArrayView2<'_, f64>,
        leaf_size: Option<usize>,
    ) -> Result<Self, XnearError> {
        let dims = points.ncols();
        let mut tree = match leaf_size {
            Some(capacity) => KdTree::with_capacity(dims, capacity),
            None => KdTree::new(dims),
        };
        for (position, row) in points.rows().into_iter().enumerate() {
            tree.add(row.to_vec(), position)
                .map_err(|e| XnearError::Backend(e.to_string()))?;
        }
        Ok(Self { tree })
    }

    /// Nearest row position and its squared Euclidean distance.
    pub(crate) fn nearest(&self, point: &[f64]) -> Result<(f64, usize), XnearError> {
        let found = self
            .tree
            .nearest(point, 1, &squared_euclidean)
            .map_err(|e| XnearError::Backend(e.to_string()))?;
        found
            .first()
            .map(|&(squared, &position)| (squared, position))
            .ok_or_else(|| XnearError::Backend("k-d tree query returned no neighbor".to_string()))
    }
}

/// Adapter for an exact Euclidean k-d tree.
#[derive(Debug, Clone, Default)]
pub struct KdTreeAdapter {
    options: AdapterOptions,
}

impl KdTreeAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl IndexAdapter for KdTreeAdapter {
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError> {
        let index = KdTreeIndex::build(points, self.options.get_leaf_size())?;
        Ok(Box::new(index))
    }

    fn query(
        &self,
        index: &IndexHandle,
        points: ArrayView2<'_, f64>,
    ) -> Result<(Array1<f64>, Array1<usize>), XnearError> {
        let index = index
            .downcast_ref::<KdTreeIndex>()
            .ok_or(XnearError::ForeignHandle {
                expected: "KdTreeIndex",
            })?;

        let mut distances = Array1::zeros(points.nrows());
        let mut positions = Array1::zeros(points.nrows());
        for (i, row) in points.rows().into_iter().enumerate() {
            let (squared, position) = index.nearest(&row.to_vec())?;
            distances[i] = squared.sqrt();
            positions[i] = position;
        }
        Ok((distances, positions))
    }
}
