//! Two-stage map-reduce query across partitions.
//!
//! ## Purpose
//!
//! This module executes a nearest-neighbor query when either the indexed
//! coordinates or the query coordinates are partitioned. The map stage
//! queries every partition's index against every query row chunk; the reduce
//! stage picks, per query row, the globally nearest candidate.
//!
//! ## Design notes
//!
//! * **Ordered reassembly**: map results are collected back in the original
//!   (query chunk, partition) order, so final records correspond one-to-one
//!   with input query rows regardless of execution order.
//! * **Brute-force reduce**: the reduce is a linear scan over partitions per
//!   query row, taking the first minimum on ties.
//! * **Deferred failure**: any partition build or query error aborts the
//!   whole call; there is no partial result or retry.
//!
//! ## Invariants
//!
//! * Positions in map-stage records are already global, so the reduce can
//!   compare and emit them without offset arithmetic.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::forest::LazyIndexWrapper;
use crate::errors::XnearError;
use crate::index::{IndexWrapper, QueryRecord};
use crate::input::PointArray;

/// One searchable partition: either an already built wrapper or a deferred
/// one that is forced on first query.
pub(crate) enum Partition<'a> {
    Built(&'a IndexWrapper),
    Deferred(&'a LazyIndexWrapper),
}

impl Partition<'_> {
    fn query(
        &self,
        points: ndarray::ArrayView2<'_, f64>,
    ) -> Result<Vec<QueryRecord>, XnearError> {
        match self {
            Partition::Built(wrapper) => wrapper.query(points),
            Partition::Deferred(lazy) => lazy.force()?.query(points),
        }
    }
}

/// Query every partition against every query row chunk, then keep the
/// nearest candidate per query row.
pub(crate) fn map_reduce(
    partitions: &[Partition<'_>],
    query: &PointArray,
) -> Result<Vec<QueryRecord>, XnearError> {
    let chunks = query.row_chunks();
    tracing::debug!(
        query_chunks = chunks.len(),
        partitions = partitions.len(),
        "running map-reduce query"
    );

    // Map: one record block per (query chunk x partition) pair.
    #[cfg(feature = "parallel")]
    let blocks: Vec<Vec<Vec<QueryRecord>>> = chunks
        .par_iter()
        .map(|chunk| {
            partitions
                .par_iter()
                .map(|partition| partition.query(chunk.view()))
                .collect::<Result<Vec<_>, XnearError>>()
        })
        .collect::<Result<Vec<_>, XnearError>>()?;
    #[cfg(not(feature = "parallel"))]
    let blocks: Vec<Vec<Vec<QueryRecord>>> = chunks
        .iter()
        .map(|chunk| {
            partitions
                .iter()
                .map(|partition| partition.query(chunk.view()))
                .collect::<Result<Vec<_>, XnearError>>()
        })
        .collect::<Result<Vec<_>, XnearError>>()?;

    // Reduce: first minimum distance across partitions, per query row.
    let mut out = Vec::with_capacity(query.n_points());
    for per_partition in &blocks {
        let rows = per_partition.first().map_or(0, Vec::len);
        for row in 0..rows {
            let mut best = per_partition[0][row];
            for records in &per_partition[1..] {
                if records[row].distance < best.distance {
                    best = records[row];
                }
            }
            out.push(best);
        }
    }
    Ok(out)
}
