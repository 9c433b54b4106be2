//! Input abstractions for coordinate data.
//!
//! ## Purpose
//!
//! This module provides the containers through which a host array structure
//! hands coordinate data to xnear, and the coercion of an ordered list of
//! same-shaped coordinates into a single 2-D point array of shape
//! `(n_points, n_coords)`.
//!
//! ## Design notes
//!
//! * **Minimal host contract**: a coordinate is its dimension names, its
//!   values and an optional row partitioning. Nothing else about the host
//!   array library is assumed.
//! * **Fixed element order**: flattening is always row-major, so flat
//!   positions are stable across dense and chunked code paths.
//! * **Fail-fast validation**: chunk vectors are validated at construction
//!   and coercion time, before any index work begins.
//!
//! ## Key concepts
//!
//! * **Chunks**: a coordinate may declare a partitioning of its row-major
//!   flattening (`chunks` entries sum to the element count). Chunked
//!   coordinates produce a chunked point array and later a forest of
//!   per-partition indexes.
//!
//! ## Invariants
//!
//! * `dims.len()` equals the rank of `data`.
//! * A chunked point array never splits rows across the column axis.
//!
//! ## Non-goals
//!
//! * This module does not reconcile differing chunk structures beyond the
//!   equality check; chunk layout is the caller's choice.

use ndarray::{Array2, ArrayD, ArrayView2, Axis};

use crate::errors::XnearError;

// ============================================================================
// Coordinate containers
// ============================================================================

/// One labeled coordinate: dimension names, values and optional chunking.
#[derive(Debug, Clone)]
pub struct CoordArray {
    dims: Vec<String>,
    data: ArrayD<f64>,
    chunks: Option<Vec<usize>>,
}

impl CoordArray {
    /// Create a coordinate from dimension names and values.
    ///
    /// The number of dimension names must equal the rank of `data`.
    pub fn new<D, S>(dims: D, data: ArrayD<f64>) -> Result<Self, XnearError>
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(XnearError::InvalidInput(format!(
                "got {} dimension names for an array of rank {}",
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            dims,
            data,
            chunks: None,
        })
    }

    /// Declare a partitioning of this coordinate's row-major flattening.
    ///
    /// The chunk row counts must sum to the element count.
    pub fn with_chunks(mut self, chunks: Vec<usize>) -> Result<Self, XnearError> {
        if chunks.is_empty() || chunks.iter().any(|&c| c == 0) {
            return Err(XnearError::InvalidInput(
                "chunks must be a non-empty list of non-zero row counts".to_string(),
            ));
        }
        let total: usize = chunks.iter().sum();
        if total != self.data.len() {
            return Err(XnearError::InvalidInput(format!(
                "chunk row counts sum to {} but the coordinate holds {} elements",
                total,
                self.data.len()
            )));
        }
        self.chunks = Some(chunks);
        Ok(self)
    }

    /// Dimension names, in order.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Shape of the coordinate array.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the coordinate holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Declared row partitioning, if any.
    pub fn chunks(&self) -> Option<&[usize]> {
        self.chunks.as_deref()
    }

    /// The coordinate values.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }
}

/// An ordered collection of named coordinates.
///
/// This is the crate's entire contract with the host array structure: the
/// host exposes coordinates by name; xnear returns positional indexers the
/// host applies with its own positional-selection operation.
#[derive(Debug, Clone, Default)]
pub struct CoordSet {
    coords: Vec<(String, CoordArray)>,
}

impl CoordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a coordinate, replacing any existing coordinate of that name.
    pub fn insert(&mut self, name: impl Into<String>, coord: CoordArray) {
        let name = name.into();
        if let Some(slot) = self.coords.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = coord;
        } else {
            self.coords.push((name, coord));
        }
    }

    /// Look up a coordinate by name.
    pub fn get(&self, name: &str) -> Option<&CoordArray> {
        self.coords
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Resolve a list of names, failing on the first absent one.
    pub fn select<'a>(&'a self, names: &[&str]) -> Result<Vec<&'a CoordArray>, XnearError> {
        names
            .iter()
            .map(|&name| {
                self.get(name)
                    .ok_or_else(|| XnearError::MissingCoord(name.to_string()))
            })
            .collect()
    }

    /// Iterate coordinates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoordArray)> {
        self.coords.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, CoordArray)> for CoordSet {
    fn from_iter<I: IntoIterator<Item = (S, CoordArray)>>(iter: I) -> Self {
        let mut set = CoordSet::new();
        for (name, coord) in iter {
            set.insert(name, coord);
        }
        set
    }
}

// ============================================================================
// Point-array coercion
// ============================================================================

/// A 2-D point array of shape `(n_points, n_coords)`, optionally partitioned
/// along the row axis.
#[derive(Debug, Clone)]
pub struct PointArray {
    data: Array2<f64>,
    chunks: Option<Vec<usize>>,
}

impl PointArray {
    pub fn n_points(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_coords(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_chunked(&self) -> bool {
        self.chunks.is_some()
    }

    /// Row partitioning, if the source coordinates were chunked.
    pub fn chunks(&self) -> Option<&[usize]> {
        self.chunks.as_deref()
    }

    /// The full point array.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Views over the row partitions, each retaining all columns.
    ///
    /// A dense point array yields a single partition covering every row.
    pub fn row_chunks(&self) -> Vec<ArrayView2<'_, f64>> {
        match &self.chunks {
            None => vec![self.data.view()],
            Some(chunks) => {
                let mut out = Vec::with_capacity(chunks.len());
                let mut start = 0;
                for &rows in chunks {
                    out.push(self.data.slice_axis(Axis(0), (start..start + rows).into()));
                    start += rows;
                }
                out
            }
        }
    }
}

/// Re-arrange an ordered list of same-shaped coordinates into a 2-D point
/// array of shape `(n_points, n_coords)`.
///
/// Coordinate order defines column order. If any coordinate declares chunks,
/// the result is chunked: every explicitly chunked coordinate must declare
/// the same chunk structure, and unchunked coordinates are realigned to it.
pub fn coords_to_point_array(coords: &[&CoordArray]) -> Result<PointArray, XnearError> {
    if coords.is_empty() {
        return Err(XnearError::InvalidInput(
            "at least one coordinate is required to build a point array".to_string(),
        ));
    }

    let n_points = coords[0].len();
    if n_points == 0 {
        return Err(XnearError::InvalidInput(
            "cannot build a point array from empty coordinates".to_string(),
        ));
    }
    for coord in &coords[1..] {
        if coord.len() != n_points {
            return Err(XnearError::InvalidInput(format!(
                "coordinates hold {} and {} elements; all must match",
                n_points,
                coord.len()
            )));
        }
    }

    // All explicitly chunked coordinates must agree on the partitioning.
    let mut chunks: Option<Vec<usize>> = None;
    for coord in coords {
        if let Some(declared) = coord.chunks() {
            match &chunks {
                None => chunks = Some(declared.to_vec()),
                Some(existing) if existing.as_slice() != declared => {
                    return Err(XnearError::ChunkMismatch {
                        left: existing.clone(),
                        right: declared.to_vec(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    // Column-stack the row-major flattening of every coordinate.
    let mut data = Array2::<f64>::zeros((n_points, coords.len()));
    for (col, coord) in coords.iter().enumerate() {
        for (row, &value) in coord.values().iter().enumerate() {
            data[[row, col]] = value;
        }
    }

    Ok(PointArray { data, chunks })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord_1d(values: Vec<f64>) -> CoordArray {
        let data = ArrayD::from_shape_vec(vec![values.len()], values).unwrap();
        CoordArray::new(["points"], data).unwrap()
    }

    #[test]
    fn test_column_order_follows_input_order() {
        let a = coord_1d(vec![1.0, 2.0]);
        let b = coord_1d(vec![10.0, 20.0]);

        let points = coords_to_point_array(&[&a, &b]).unwrap();

        assert_eq!(points.n_points(), 2);
        assert_eq!(points.n_coords(), 2);
        assert_eq!(points.view()[[0, 0]], 1.0);
        assert_eq!(points.view()[[0, 1]], 10.0);
        assert_eq!(points.view()[[1, 1]], 20.0);
    }

    #[test]
    fn test_row_major_flattening() {
        let data = ArrayD::from_shape_vec(vec![2, 2], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let coord = CoordArray::new(["y", "x"], data).unwrap();

        let points = coords_to_point_array(&[&coord]).unwrap();

        let column: Vec<f64> = points.view().column(0).to_vec();
        assert_eq!(column, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_chunk_inference_and_realignment() {
        let chunked = coord_1d(vec![1.0, 2.0, 3.0, 4.0])
            .with_chunks(vec![3, 1])
            .unwrap();
        let dense = coord_1d(vec![5.0, 6.0, 7.0, 8.0]);

        let points = coords_to_point_array(&[&chunked, &dense]).unwrap();

        assert_eq!(points.chunks(), Some(&[3, 1][..]));
        let parts = points.row_chunks();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].nrows(), 3);
        assert_eq!(parts[1].nrows(), 1);
        assert_eq!(parts[1][[0, 1]], 8.0);
    }

    #[test]
    fn test_conflicting_chunks_rejected() {
        let a = coord_1d(vec![1.0, 2.0, 3.0, 4.0])
            .with_chunks(vec![2, 2])
            .unwrap();
        let b = coord_1d(vec![1.0, 2.0, 3.0, 4.0])
            .with_chunks(vec![3, 1])
            .unwrap();

        let err = coords_to_point_array(&[&a, &b]).unwrap_err();
        assert!(matches!(err, XnearError::ChunkMismatch { .. }));
    }

    #[test]
    fn test_bad_chunk_sum_rejected() {
        let err = coord_1d(vec![1.0, 2.0, 3.0])
            .with_chunks(vec![2, 2])
            .unwrap_err();
        assert!(matches!(err, XnearError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_coordinates_rejected() {
        let err = coords_to_point_array(&[]).unwrap_err();
        assert!(matches!(err, XnearError::InvalidInput(_)));
    }
}
