//! Distributed query engine: deferred forests and map-reduce execution.

mod executor;
mod forest;

pub(crate) use executor::{map_reduce, Partition};
pub use forest::{IndexForest, LazyIndexWrapper};
