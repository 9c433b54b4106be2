//! Spherical point index adapter.
//!
//! ## Purpose
//!
//! Indexes latitude / longitude points by mapping them onto 3-D unit vectors
//! and searching chords with the Euclidean k-d tree backend. Chord lengths
//! convert monotonically to great-circle angles, so nearest-by-chord is
//! nearest-by-arc and results are interchangeable with the haversine ball
//! tree.
//!
//! Coordinates must be given in latitude, longitude order, in degrees, for
//! both indexed and query points. Distances are great-circle radians.

use ndarray::{Array1, Array2, ArrayView2};

use super::kdtree::KdTreeIndex;
use crate::errors::XnearError;
use crate::index::{AdapterOptions, IndexAdapter, IndexHandle};
use crate::math::geo;

fn to_unit_vectors(points: ArrayView2<'_, f64>) -> Result<Array2<f64>, XnearError> {
    if points.ncols() != 2 {
        return Err(XnearError::InvalidInput(format!(
            "a spherical point index expects (lat, lon) points, got {} columns",
            points.ncols()
        )));
    }
    let mut out = Array2::zeros((points.nrows(), 3));
    for (i, row) in points.rows().into_iter().enumerate() {
        let v = geo::latlon_deg_to_unit_vector(row[0], row[1]);
        out[[i, 0]] = v[0];
        out[[i, 1]] = v[1];
        out[[i, 2]] = v[2];
    }
    Ok(out)
}

/// Adapter for a spherical point index over `(lat, lon)` points.
#[derive(Debug, Clone, Default)]
pub struct SpherePointAdapter {
    options: AdapterOptions,
}

impl SpherePointAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self { options }
    }
}

impl IndexAdapter for SpherePointAdapter {
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError> {
        let unit = to_unit_vectors(points)?;
        let index = KdTreeIndex::build(unit.view(), self.options.get_leaf_size())?;
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
        let unit = to_unit_vectors(points)?;

        let mut distances = Array1::zeros(unit.nrows());
        let mut positions = Array1::zeros(unit.nrows());
        for (i, row) in unit.rows().into_iter().enumerate() {
            let (squared_chord, position) = index.nearest(&row.to_vec())?;
            distances[i] = geo::chord_to_arc(squared_chord.sqrt());
            positions[i] = position;
        }
        Ok((distances, positions))
    }
}
