//! High-level selection front-end.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. A [`Selector`]
//! is pointed at a subset of a host structure's coordinates, builds a
//! nearest-neighbor index (or a forest of per-partition indexes) over them
//! once, and afterwards translates label-based query coordinates into
//! positional indexers the host applies with its own positional-selection
//! operation.
//!
//! ## Key concepts
//!
//! * **Shape descriptor**: the shared dimension names and shape of the
//!   indexed coordinates are captured at `set_index` time and used later to
//!   unravel flat global positions into per-dimension indices.
//! * **Persist**: for partitioned coordinates, `persist` controls whether
//!   the forest is materialized eagerly at `set_index` time or built on
//!   first use.
//!
//! ## Invariants
//!
//! * All indexed coordinates must share identical dimension names in
//!   identical order; likewise all query coordinates among themselves.
//! * Positional indexers returned by `select` have the query coordinates'
//!   shape and are directly consumable by the host, with no further
//!   transformation.

use ndarray::{ArrayD, IxDyn};

use crate::engine::{map_reduce, IndexForest, Partition};
use crate::errors::XnearError;
use crate::index::{
    default_registry, AdapterOptions, IndexHandle, IndexRegistry, IndexSpec, IndexWrapper,
    QueryRecord,
};
use crate::input::{coords_to_point_array, CoordArray, CoordSet};
use crate::math::unravel_index;

// ============================================================================
// Result types
// ============================================================================

/// The built index handle(s) exposed by [`Selector::index`].
pub enum IndexHandles<'a> {
    /// The unpartitioned case: one handle.
    Single(&'a IndexHandle),
    /// One handle per partition, in partition order.
    Forest(Vec<&'a IndexHandle>),
}

/// Positional indexers produced by [`Selector::select`].
///
/// One index array per indexed dimension, each shaped like the query
/// coordinates.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Dimension names of the query coordinates.
    pub query_dims: Vec<String>,
    /// `(indexed dimension name, positional indices)` pairs, in the indexed
    /// dimensions' order.
    pub indexers: Vec<(String, ArrayD<usize>)>,
}

// ============================================================================
// Selector
// ============================================================================

enum IndexState {
    Single(IndexWrapper),
    Forest(IndexForest),
}

struct BuiltIndex {
    state: IndexState,
    coord_names: Vec<String>,
    dims: Vec<String>,
    shape: Vec<usize>,
}

/// Nearest-neighbor selection over a subset of coordinate labels.
#[derive(Default)]
pub struct Selector {
    registry: Option<IndexRegistry>,
    built: Option<BuiltIndex>,
}

impl Selector {
    /// Create a selector resolving index names against the default registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector resolving index names against a custom registry.
    pub fn with_registry(registry: IndexRegistry) -> Self {
        Self {
            registry: Some(registry),
            built: None,
        }
    }

    fn registry(&self) -> &IndexRegistry {
        self.registry.as_ref().unwrap_or_else(|| default_registry())
    }

    /// Build an index over the named coordinates of `coords`.
    ///
    /// The coordinates must all share the same dimensions in the same order;
    /// their order in `names` defines the column order every later query
    /// must follow. If the coordinates are chunked, a forest with one index
    /// per partition is created; `persist` then builds every partition
    /// immediately instead of on first use.
    ///
    /// Replaces any previously built index. On error the previous index is
    /// left untouched.
    pub fn set_index(
        &mut self,
        coords: &CoordSet,
        names: &[&str],
        spec: impl Into<IndexSpec>,
        persist: bool,
        options: AdapterOptions,
    ) -> Result<(), XnearError> {
        let coord_refs = coords.select(names)?;
        let dims = check_same_dims(&coord_refs)?;
        let shape = coord_refs[0].shape().to_vec();

        // Resolve the index specification before any build work, so an
        // unknown name fails fast.
        let factory = self.registry().resolve(&spec.into())?;

        let points = coords_to_point_array(&coord_refs)?;

        let state = if points.is_chunked() {
            let forest = IndexForest::build(factory, options, &points);
            if persist {
                forest.force_all()?;
            }
            IndexState::Forest(forest)
        } else {
            IndexState::Single(IndexWrapper::build(&factory, &options, points.view(), 0)?)
        };

        self.built = Some(BuiltIndex {
            state,
            coord_names: names.iter().map(|&n| n.to_string()).collect(),
            dims,
            shape,
        });
        Ok(())
    }

    /// The underlying index handle(s), or `None` if no index has been set.
    ///
    /// For a forest this forces evaluation of every partition.
    pub fn index(&self) -> Result<Option<IndexHandles<'_>>, XnearError> {
        let Some(built) = &self.built else {
            return Ok(None);
        };
        match &built.state {
            IndexState::Single(wrapper) => Ok(Some(IndexHandles::Single(wrapper.index()))),
            IndexState::Forest(forest) => {
                forest.force_all()?;
                let handles = forest
                    .wrappers()
                    .iter()
                    .map(|lazy| lazy.force().map(IndexWrapper::index))
                    .collect::<Result<Vec<_>, XnearError>>()?;
                Ok(Some(IndexHandles::Forest(handles)))
            }
        }
    }

    /// The index forest, if the indexed coordinates were partitioned.
    ///
    /// Allows observing which partitions are built without forcing any.
    pub fn forest(&self) -> Option<&IndexForest> {
        match &self.built {
            Some(BuiltIndex {
                state: IndexState::Forest(forest),
                ..
            }) => Some(forest),
            _ => None,
        }
    }

    /// Names of the indexed coordinates, if an index has been set.
    pub fn coord_names(&self) -> Option<&[String]> {
        self.built.as_ref().map(|b| b.coord_names.as_slice())
    }

    /// Nearest-neighbor records (distance and global flat position) for the
    /// given query coordinates.
    pub fn query(&self, indexers: &CoordSet) -> Result<Vec<QueryRecord>, XnearError> {
        let (records, _, _) = self.query_parts(indexers)?;
        Ok(records)
    }

    /// Select positional indexers for the given query coordinates.
    ///
    /// Queries the index for the nearest indexed point of every query point,
    /// then unravels the flat global positions against the indexed
    /// coordinates' shape. Fails with [`XnearError::IndexNotBuilt`] before
    /// `set_index`.
    pub fn select(&self, indexers: &CoordSet) -> Result<Selection, XnearError> {
        let (records, query_dims, query_shape) = self.query_parts(indexers)?;
        let built = self.built.as_ref().ok_or(XnearError::IndexNotBuilt)?;

        let mut per_dim: Vec<Vec<usize>> =
            vec![Vec::with_capacity(records.len()); built.shape.len()];
        for record in &records {
            for (slot, value) in per_dim
                .iter_mut()
                .zip(unravel_index(record.position, &built.shape))
            {
                slot.push(value);
            }
        }

        let indexers_out = built
            .dims
            .iter()
            .zip(per_dim)
            .map(|(dim, values)| {
                ArrayD::from_shape_vec(IxDyn(&query_shape), values)
                    .map(|array| (dim.clone(), array))
                    .map_err(|e| XnearError::InvalidInput(e.to_string()))
            })
            .collect::<Result<Vec<_>, XnearError>>()?;

        Ok(Selection {
            query_dims,
            indexers: indexers_out,
        })
    }

    /// Shared query path: validates the indexers, coerces them to a point
    /// array and dispatches to the direct or map-reduce execution.
    fn query_parts(
        &self,
        indexers: &CoordSet,
    ) -> Result<(Vec<QueryRecord>, Vec<String>, Vec<usize>), XnearError> {
        let built = self.built.as_ref().ok_or(XnearError::IndexNotBuilt)?;

        let names: Vec<&str> = built.coord_names.iter().map(String::as_str).collect();
        let coord_refs = indexers.select(&names)?;
        let query_dims = check_same_dims(&coord_refs)?;
        let query_shape = coord_refs[0].shape().to_vec();

        let points = coords_to_point_array(&coord_refs)?;

        let records = match &built.state {
            IndexState::Single(wrapper) if !points.is_chunked() => wrapper.query(points.view())?,
            IndexState::Single(wrapper) => map_reduce(&[Partition::Built(wrapper)], &points)?,
            IndexState::Forest(forest) => {
                let partitions: Vec<Partition<'_>> = forest
                    .wrappers()
                    .iter()
                    .map(Partition::Deferred)
                    .collect();
                map_reduce(&partitions, &points)?
            }
        };

        Ok((records, query_dims, query_shape))
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.built {
            None => "unset".to_string(),
            Some(BuiltIndex {
                state: IndexState::Single(_),
                ..
            }) => "single".to_string(),
            Some(BuiltIndex {
                state: IndexState::Forest(forest),
                ..
            }) => format!("forest({})", forest.len()),
        };
        f.debug_struct("Selector").field("index", &state).finish()
    }
}

/// All coordinates must share identical dimension names in identical order.
fn check_same_dims(coords: &[&CoordArray]) -> Result<Vec<String>, XnearError> {
    let Some(first) = coords.first() else {
        return Err(XnearError::InvalidInput(
            "at least one coordinate name is required".to_string(),
        ));
    };
    let dims = first.dims().to_vec();
    for coord in &coords[1..] {
        if coord.dims() != dims.as_slice() {
            return Err(XnearError::DimensionMismatch {
                left: dims,
                right: coord.dims().to_vec(),
            });
        }
    }
    Ok(dims)
}
