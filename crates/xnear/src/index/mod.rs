//! Index contract, registry and per-partition wrapper.

mod adapter;
mod registry;
mod wrapper;

pub use adapter::{IndexAdapter, IndexHandle, QueryRecord};
pub use registry::{default_registry, AdapterFactory, AdapterOptions, IndexRegistry, IndexSpec};
pub use wrapper::IndexWrapper;
