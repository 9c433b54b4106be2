//! # xnear
//!
//! Nearest-neighbor selection for labeled n-dimensional arrays.
//!
//! xnear lets a set of same-shaped coordinate arrays be queried by nearest
//! neighbor instead of exact label match: build a point-search index once
//! over the flattened coordinates, then repeatedly translate new coordinate
//! values into positional indices back into the original array shape.
//!
//! Search backends (k-d trees, ball trees, spherical point indexes) plug in
//! behind one uniform build/query contract and are picked by registered name
//! or supplied as custom adapters. Chunked coordinates transparently become
//! a forest of per-partition indexes queried with a two-stage map-reduce.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ndarray::ArrayD;
//! use xnear::prelude::*;
//!
//! let mut coords = CoordSet::new();
//! coords.insert("lat", CoordArray::new(["points"], lat_values)?);
//! coords.insert("lon", CoordArray::new(["points"], lon_values)?);
//!
//! let mut selector = Selector::new();
//! selector.set_index(&coords, &["lat", "lon"], "geo_balltree", true,
//!                    AdapterOptions::new())?;
//!
//! let selection = selector.select(&query_coords)?;
//! // selection.indexers: one positional index array per indexed dimension,
//! // ready for the host array structure's positional selection.
//! ```

pub mod adapters;
pub mod api;
pub mod engine;
pub mod errors;
pub mod index;
pub mod input;
pub mod math;

pub use api::{IndexHandles, Selection, Selector};
pub use errors::XnearError;
pub use index::{
    default_registry, AdapterFactory, AdapterOptions, IndexAdapter, IndexHandle, IndexRegistry,
    IndexSpec, IndexWrapper, QueryRecord,
};
pub use input::{coords_to_point_array, CoordArray, CoordSet, PointArray};

/// Commonly used types, re-exported in one place.
pub mod prelude {
    pub use crate::adapters::{
        BallTreeAdapter, GeoBallTreeAdapter, KdTreeAdapter, SpherePointAdapter,
    };
    pub use crate::api::{IndexHandles, Selection, Selector};
    pub use crate::errors::XnearError;
    pub use crate::index::{
        default_registry, AdapterFactory, AdapterOptions, IndexAdapter, IndexHandle,
        IndexRegistry, IndexSpec, QueryRecord,
    };
    pub use crate::input::{CoordArray, CoordSet};
}
