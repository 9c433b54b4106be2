//! Ball tree adapters: Euclidean and haversine.
//!
//! ## Purpose
//!
//! Wraps the metric ball tree backend behind the adapter contract, once with
//! the Euclidean metric for cartesian points and once with the haversine
//! metric for geographic points.
//!
//! The geographic variant expects coordinates in latitude, longitude order,
//! in degrees, for both indexed and query points; it converts to radians on
//! both paths and reports great-circle distances in radians on the unit
//! sphere.

use ndarray::{Array1, ArrayView2};

use crate::errors::XnearError;
use crate::index::{AdapterOptions, IndexAdapter, IndexHandle};
use crate::math::balltree::{BallTree, TreeMetric, DEFAULT_LEAF_SIZE};

/// Built ball tree handle.
pub struct BallTreeIndex {
    tree: BallTree<f64>,
}

fn build_tree(
    points: ArrayView2<'_, f64>,
    options: &AdapterOptions,
    metric: TreeMetric,
    to_radians: bool,
) -> Result<BallTreeIndex, XnearError> {
    if metric == TreeMetric::Haversine && points.ncols() != 2 {
        return Err(XnearError::InvalidInput(format!(
            "the haversine metric expects (lat, lon) points, got {} columns",
            points.ncols()
        )));
    }

    let mut flat = Vec::with_capacity(points.len());
    for &value in points.iter() {
        flat.push(if to_radians { value.to_radians() } else { value });
    }

    let leaf_size = options.get_leaf_size().unwrap_or(DEFAULT_LEAF_SIZE);
    let tree = BallTree::build(flat, points.ncols(), leaf_size, metric);
    Ok(BallTreeIndex { tree })
}

fn query_tree(
    index: &IndexHandle,
    points: ArrayView2<'_, f64>,
    to_radians: bool,
) -> Result<(Array1<f64>, Array1<usize>), XnearError> {
    let index = index
        .downcast_ref::<BallTreeIndex>()
        .ok_or(XnearError::ForeignHandle {
            expected: "BallTreeIndex",
        })?;

    let mut distances = Array1::zeros(points.nrows());
    let mut positions = Array1::zeros(points.nrows());
    let mut query = Vec::with_capacity(points.ncols());
    for (i, row) in points.rows().into_iter().enumerate() {
        query.clear();
        query.extend(
            row.iter()
                .map(|&v| if to_radians { v.to_radians() } else { v }),
        );
        let (distance, position) = index
            .tree
            .nearest(&query)
            .ok_or_else(|| XnearError::Backend("ball tree holds no points".to_string()))?;
        distances[i] = distance;
        positions[i] = position;
    }
    Ok((distances, positions))
}

/// Adapter for an exact Euclidean ball tree.
#[derive(Debug, Clone, Default)]
pub struct BallTreeAdapter {
    options: AdapterOptions,
}

impl BallTreeAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl IndexAdapter for BallTreeAdapter {
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError> {
        let index = build_tree(points, &self.options, TreeMetric::Euclidean, false)?;
        Ok(Box::new(index))
    }

    fn query(
        &self,
        index: &IndexHandle,
        points: ArrayView2<'_, f64>,
    ) -> Result<(Array1<f64>, Array1<usize>), XnearError> {
        query_tree(index, points, false)
    }
}

/// Adapter for a haversine-metric ball tree over `(lat, lon)` points.
///
/// Degrees in, great-circle radians out.
#[derive(Debug, Clone, Default)]
pub struct GeoBallTreeAdapter {
    options: AdapterOptions,
}

impl GeoBallTreeAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl IndexAdapter for GeoBallTreeAdapter {
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError> {
        let index = build_tree(points, &self.options, TreeMetric::Haversine, true)?;
        Ok(Box::new(index))
    }

    fn query(
        &self,
        index: &IndexHandle,
        points: ArrayView2<'_, f64>,
    ) -> Result<(Array1<f64>, Array1<usize>), XnearError> {
        query_tree(index, points, true)
    }
}
