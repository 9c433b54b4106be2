//! Error types for xnear.
//!
//! ## Purpose
//!
//! This module defines the single error enum used across the crate. All
//! fallible operations return `Result<_, XnearError>` and propagate with `?`.
//!
//! ## Key concepts
//!
//! * **Configuration errors** (`DimensionMismatch`, `MissingCoord`,
//!   `ChunkMismatch`, `InvalidInput`) are raised synchronously, before any
//!   index work begins.
//! * **Backend errors** wrap failures from an underlying search structure
//!   without retry or suppression.
//! * **Precondition errors** (`IndexNotBuilt`) carry an actionable message.

use thiserror::Error;

/// Errors produced while building or querying nearest-neighbor indexes.
#[derive(Debug, Error)]
pub enum XnearError {
    /// Coordinates passed to index construction or selection do not share
    /// the same dimensions in the same order.
    #[error("coordinates must all have the same dimensions in the same order: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// A coordinate name was requested that the coordinate set does not hold.
    #[error("no coordinate named '{0}'")]
    MissingCoord(String),

    /// An index-type name has no entry in the registry.
    #[error("no index adapter registered under the name '{0}'")]
    UnregisteredIndex(String),

    /// A query was issued before `set_index` built an index.
    #[error("the index(es) has/have not been built yet; call `set_index` first")]
    IndexNotBuilt,

    /// Explicitly chunked coordinates declare different chunk structures.
    #[error("inconsistent chunk structure across coordinates: {left:?} vs {right:?}")]
    ChunkMismatch { left: Vec<usize>, right: Vec<usize> },

    /// An adapter was handed an index handle built by a different adapter.
    #[error("index handle was not built by this adapter (expected {expected})")]
    ForeignHandle { expected: &'static str },

    /// A failure inside an underlying search backend, propagated unmodified.
    #[error("index backend error: {0}")]
    Backend(String),

    /// Malformed input data (empty point sets, bad chunk vectors, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
