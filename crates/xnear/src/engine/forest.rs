//! Deferred per-partition index construction.
//!
//! ## Purpose
//!
//! When the indexed coordinates are partitioned, one index is built per
//! partition. This module provides the deferred wrapper around a single
//! partition build and the ordered forest of those wrappers, with the offset
//! bookkeeping that keeps positions global.
//!
//! ## Design notes
//!
//! * **Built on first use**: a deferred wrapper holds everything needed to
//!   build (factory, options, its partition's points, its offset) and a
//!   `OnceCell` that caches the built wrapper after the first `force`.
//! * **Pure builds**: building a partition has no side effects, so repeated
//!   or concurrent execution is safe; the cell keeps exactly one result.
//! * **Deterministic offsets**: offsets are assigned in partition order as
//!   cumulative row counts, independent of the order partitions are later
//!   forced in.

use ndarray::Array2;
use once_cell::sync::OnceCell;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::errors::XnearError;
use crate::index::{AdapterFactory, AdapterOptions, IndexWrapper};
use crate::input::PointArray;

/// A per-partition index build that runs on first use.
pub struct LazyIndexWrapper {
    factory: AdapterFactory,
    options: AdapterOptions,
    points: Array2<f64>,
    offset: usize,
    cell: OnceCell<IndexWrapper>,
}

impl LazyIndexWrapper {
    fn new(
        factory: AdapterFactory,
        options: AdapterOptions,
        points: Array2<f64>,
        offset: usize,
    ) -> Self {
        Self {
            factory,
            options,
            points,
            offset,
            cell: OnceCell::new(),
        }
    }

    /// Global position of this partition's first point.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of points in this partition.
    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    /// The built wrapper, if this partition has been forced already.
    pub fn get(&self) -> Option<&IndexWrapper> {
        self.cell.get()
    }

    /// Build the partition's index if needed and return it.
    pub fn force(&self) -> Result<&IndexWrapper, XnearError> {
        self.cell.get_or_try_init(|| {
            IndexWrapper::build(&self.factory, &self.options, self.points.view(), self.offset)
        })
    }
}

impl std::fmt::Debug for LazyIndexWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyIndexWrapper")
            .field("offset", &self.offset)
            .field("n_points", &self.n_points())
            .field("built", &self.cell.get().is_some())
            .finish()
    }
}

/// Ordered collection of per-partition index wrappers.
#[derive(Debug)]
pub struct IndexForest {
    wrappers: Vec<LazyIndexWrapper>,
}

impl IndexForest {
    /// Create one deferred wrapper per row partition of `points`, with
    /// offsets equal to the cumulative row count of preceding partitions.
    pub(crate) fn build(
        factory: AdapterFactory,
        options: AdapterOptions,
        points: &PointArray,
    ) -> Self {
        let mut wrappers = Vec::new();
        let mut offset = 0;
        for chunk in points.row_chunks() {
            wrappers.push(LazyIndexWrapper::new(
                factory.clone(),
                options.clone(),
                chunk.to_owned(),
                offset,
            ));
            offset += chunk.nrows();
        }
        tracing::debug!(partitions = wrappers.len(), "planned index forest");
        Self { wrappers }
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// The deferred wrappers, in partition order.
    pub fn wrappers(&self) -> &[LazyIndexWrapper] {
        &self.wrappers
    }

    /// Whether partition `i` has been built yet.
    pub fn is_built(&self, i: usize) -> bool {
        self.wrappers
            .get(i)
            .is_some_and(|wrapper| wrapper.get().is_some())
    }

    /// Build and retain every partition's index now.
    ///
    /// The first failure aborts and propagates.
    pub fn force_all(&self) -> Result<(), XnearError> {
        #[cfg(feature = "parallel")]
        {
            self.wrappers
                .par_iter()
                .try_for_each(|wrapper| wrapper.force().map(|_| ()))
        }
        #[cfg(not(feature = "parallel"))]
        {
            for wrapper in &self.wrappers {
                wrapper.force()?;
            }
            Ok(())
        }
    }
}
