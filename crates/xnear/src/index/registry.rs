//! Index registry and name resolution.
//!
//! ## Purpose
//!
//! This module maps index-type names to adapter constructor functions, so
//! every entry point can accept either a registered name or a custom adapter
//! factory. A process-wide default registry is seeded with the built-in
//! adapters; independent registries can be created empty or pre-seeded, so
//! registering a custom adapter never requires mutating global state.
//!
//! ## Design notes
//!
//! * **Plain mapping**: the registry is an ordinary name-to-factory map with
//!   read-only mapping semantics (lookup, iteration, length, summary).
//! * **Override is non-fatal**: re-registering a name proceeds, emits a
//!   warning and the new entry wins.
//! * **Static contract check**: a factory's return type already proves the
//!   adapter implements the capability contract; there is nothing left to
//!   validate at registration time.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::adapter::IndexAdapter;
use crate::adapters;
use crate::errors::XnearError;

/// Construction-time adapter options.
///
/// Captured once per adapter instance and reused for every build/query call.
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions {
    leaf_size: Option<usize>,
}

impl AdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of points per tree leaf (backend-specific default
    /// when unset).
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = Some(leaf_size);
        self
    }

    pub fn get_leaf_size(&self) -> Option<usize> {
        self.leaf_size
    }
}

/// Constructor function producing a configured adapter instance.
pub type AdapterFactory = Arc<dyn Fn(&AdapterOptions) -> Box<dyn IndexAdapter> + Send + Sync>;

/// An index specification: a registered name or a custom adapter factory.
#[derive(Clone)]
pub enum IndexSpec {
    Name(String),
    Factory(AdapterFactory),
}

impl fmt::Debug for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpec::Name(name) => f.debug_tuple("Name").field(name).finish(),
            IndexSpec::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<&str> for IndexSpec {
    fn from(name: &str) -> Self {
        IndexSpec::Name(name.to_string())
    }
}

impl From<String> for IndexSpec {
    fn from(name: String) -> Self {
        IndexSpec::Name(name)
    }
}

impl From<AdapterFactory> for IndexSpec {
    fn from(factory: AdapterFactory) -> Self {
        IndexSpec::Factory(factory)
    }
}

/// Mapping of index-type names to adapter factories.
#[derive(Clone, Default)]
pub struct IndexRegistry {
    adapters: BTreeMap<String, AdapterFactory>,
}

impl IndexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-seeded with the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("kdtree", Arc::new(|o: &AdapterOptions| {
            Box::new(adapters::KdTreeAdapter::new(o.clone())) as Box<dyn IndexAdapter>
        }));
        registry.register("balltree", Arc::new(|o: &AdapterOptions| {
            Box::new(adapters::BallTreeAdapter::new(o.clone())) as Box<dyn IndexAdapter>
        }));
        registry.register("geo_balltree", Arc::new(|o: &AdapterOptions| {
            Box::new(adapters::GeoBallTreeAdapter::new(o.clone())) as Box<dyn IndexAdapter>
        }));
        registry.register("sphere_point", Arc::new(|o: &AdapterOptions| {
            Box::new(adapters::SpherePointAdapter::new(o.clone())) as Box<dyn IndexAdapter>
        }));
        registry
    }

    /// Register an adapter factory under `name`.
    ///
    /// Re-registering an existing name is allowed; the previous entry is
    /// replaced and a registration-conflict warning is emitted.
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        let name = name.into();
        if self.adapters.contains_key(&name) {
            tracing::warn!(
                index = %name,
                "overriding an already registered index"
            );
        }
        self.adapters.insert(name, factory);
    }

    /// Look up a factory by name.
    pub fn get(&self, name: &str) -> Option<&AdapterFactory> {
        self.adapters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Iterate registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Resolve an index specification to a factory.
    ///
    /// Registered names are looked up in this registry; custom factories
    /// pass through unchanged.
    pub fn resolve(&self, spec: &IndexSpec) -> Result<AdapterFactory, XnearError> {
        match spec {
            IndexSpec::Name(name) => self
                .get(name)
                .cloned()
                .ok_or_else(|| XnearError::UnregisteredIndex(name.clone())),
            IndexSpec::Factory(factory) => Ok(factory.clone()),
        }
    }
}

impl fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("names", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for IndexRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<IndexRegistry ({} indexes)>", self.len())?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

static DEFAULT_REGISTRY: Lazy<IndexRegistry> = Lazy::new(IndexRegistry::with_defaults);

/// The process-wide registry seeded with the built-in adapters.
///
/// Read-only after initialization; register custom adapters on an owned
/// `IndexRegistry` instead.
pub fn default_registry() -> &'static IndexRegistry {
    &DEFAULT_REGISTRY
}
