//! Per-partition index wrapper.
//!
//! ## Purpose
//!
//! This module owns one built index and the global offset of its partition's
//! first point, and globalizes every query answer by that offset. It is the
//! unit the distributed engine replicates across partitions.
//!
//! ## Invariants
//!
//! * A wrapper exclusively owns its handle; queries are read-only against it
//!   and may be repeated freely.
//! * Positions returned by `query` already include the offset, so results
//!   from different partitions merge without further bookkeeping.

use ndarray::ArrayView2;

use super::adapter::{IndexAdapter, IndexHandle, QueryRecord};
use super::registry::{AdapterFactory, AdapterOptions};
use crate::errors::XnearError;

/// One built index plus the offset of its partition in the logical,
/// unpartitioned point array.
pub struct IndexWrapper {
    adapter: Box<dyn IndexAdapter>,
    index: IndexHandle,
    offset: usize,
}

impl IndexWrapper {
    /// Construct the adapter from `factory` and `options`, build the index
    /// over `points` and remember `offset`.
    ///
    /// Build failures propagate unmodified.
    pub fn build(
        factory: &AdapterFactory,
        options: &AdapterOptions,
        points: ArrayView2<'_, f64>,
        offset: usize,
    ) -> Result<Self, XnearError> {
        let adapter = factory(options);
        let index = adapter.build(points)?;
        tracing::debug!(n_points = points.nrows(), offset, "built index partition");
        Ok(Self {
            adapter,
            index,
            offset,
        })
    }

    /// Query the nearest neighbor of each point, with globalized positions.
    pub fn query(&self, points: ArrayView2<'_, f64>) -> Result<Vec<QueryRecord>, XnearError> {
        let (distances, positions) = self.adapter.query(&self.index, points)?;
        Ok(distances
            .iter()
            .zip(positions.iter())
            .map(|(&distance, &position)| QueryRecord {
                distance,
                position: position + self.offset,
            })
            .collect())
    }

    /// The raw underlying index handle.
    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    /// Global position of this partition's first point.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl std::fmt::Debug for IndexWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWrapper")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
