//! Built-in index adapters.
//!
//! Each adapter wraps one concrete nearest-neighbor search backend behind
//! the [`IndexAdapter`](crate::index::IndexAdapter) contract:
//!
//! * `KdTreeAdapter` (`"kdtree"`) - Euclidean k-d tree
//! * `BallTreeAdapter` (`"balltree"`) - Euclidean ball tree
//! * `GeoBallTreeAdapter` (`"geo_balltree"`) - haversine ball tree over
//!   latitude / longitude points in degrees
//! * `SpherePointAdapter` (`"sphere_point"`) - spherical point index over
//!   latitude / longitude points in degrees

mod balltree;
mod kdtree;
mod sphere;

pub use balltree::{BallTreeAdapter, GeoBallTreeAdapter};
pub use kdtree::KdTreeAdapter;
pub use sphere::SpherePointAdapter;
