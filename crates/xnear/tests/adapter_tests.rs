//! Adapter contract, registry and wrapper tests.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, ArrayView2};
use xnear::prelude::*;
use xnear::IndexWrapper;

/// Minimal adapter whose queries always report a fixed position.
struct DummyIndex {
    n_points: usize,
}

struct DummyAdapter {
    reported_position: usize,
}

impl IndexAdapter for DummyAdapter {
    fn build(&self, points: ArrayView2<'_, f64>) -> Result<IndexHandle, XnearError> {
        Ok(Box::new(DummyIndex {
            n_points: points.nrows(),
        }))
    }

    fn query(
        &self,
        index: &IndexHandle,
        points: ArrayView2<'_, f64>,
    ) -> Result<(Array1<f64>, Array1<usize>), XnearError> {
        let _ = index
            .downcast_ref::<DummyIndex>()
            .ok_or(XnearError::ForeignHandle {
                expected: "DummyIndex",
            })?;
        let distances = Array1::zeros(points.nrows());
        let positions = Array1::from_elem(points.nrows(), self.reported_position);
        Ok((distances, positions))
    }
}

fn dummy_factory(reported_position: usize) -> AdapterFactory {
    Arc::new(move |_: &AdapterOptions| {
        Box::new(DummyAdapter { reported_position }) as Box<dyn IndexAdapter>
    })
}

fn square_points() -> Array2<f64> {
    let mut points = Array2::zeros((4, 2));
    for (i, (y, x)) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]
        .into_iter()
        .enumerate()
    {
        points[[i, 0]] = y;
        points[[i, 1]] = x;
    }
    points
}

#[test]
fn test_default_registry_has_builtins() {
    let registry = default_registry();
    assert_eq!(registry.len(), 4);
    for name in ["kdtree", "balltree", "geo_balltree", "sphere_point"] {
        assert!(registry.contains(name));
    }
}

#[test]
fn test_registry_override_second_registration_wins() {
    let mut registry = IndexRegistry::new();
    registry.register("dummy", dummy_factory(1));
    registry.register("dummy", dummy_factory(7));

    let factory = registry.resolve(&IndexSpec::from("dummy")).unwrap();
    let adapter = factory(&AdapterOptions::new());
    let handle = adapter.build(square_points().view()).unwrap();
    let (_, positions) = adapter.query(&handle, square_points().view()).unwrap();

    assert!(positions.iter().all(|&p| p == 7));
}

#[test]
fn test_registry_resolve_factory_passes_through() {
    let registry = IndexRegistry::new();
    let spec = IndexSpec::from(dummy_factory(3));

    let factory = registry.resolve(&spec).unwrap();
    let adapter = factory(&AdapterOptions::new());
    let handle = adapter.build(square_points().view()).unwrap();
    let (_, positions) = adapter.query(&handle, square_points().view()).unwrap();

    assert!(positions.iter().all(|&p| p == 3));
}

#[test]
fn test_registry_resolve_unknown_name() {
    let err = IndexRegistry::new()
        .resolve(&IndexSpec::from("missing"))
        .err()
        .unwrap();
    assert!(matches!(err, XnearError::UnregisteredIndex(name) if name == "missing"));
}

#[test]
fn test_registry_display() {
    let mut registry = IndexRegistry::new();
    registry.register("dummy", dummy_factory(0));
    assert_eq!(registry.to_string(), "<IndexRegistry (1 indexes)>\ndummy");
}

#[test]
fn test_wrapper_applies_offset() {
    let points = square_points();
    let wrapper =
        IndexWrapper::build(&dummy_factory(1), &AdapterOptions::new(), points.view(), 5).unwrap();

    let records = wrapper.query(points.view()).unwrap();

    assert_eq!(records.len(), 4);
    for record in records {
        assert_abs_diff_eq!(record.distance, 0.0);
        assert_eq!(record.position, 6);
    }
    assert_eq!(wrapper.offset(), 5);
}

#[test]
fn test_wrapper_exposes_raw_handle() {
    let points = square_points();
    let wrapper =
        IndexWrapper::build(&dummy_factory(0), &AdapterOptions::new(), points.view(), 0).unwrap();

    let handle = wrapper.index().downcast_ref::<DummyIndex>().unwrap();
    assert_eq!(handle.n_points, 4);
}

#[test]
fn test_wrapper_query_is_repeatable() {
    let points = square_points();
    let wrapper =
        IndexWrapper::build(&dummy_factory(2), &AdapterOptions::new(), points.view(), 1).unwrap();

    let first = wrapper.query(points.view()).unwrap();
    let second = wrapper.query(points.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_foreign_handle_is_rejected() {
    let points = square_points();
    let kd = KdTreeAdapter::new(AdapterOptions::new());
    let ball = BallTreeAdapter::new(AdapterOptions::new());

    let handle = kd.build(points.view()).unwrap();
    let err = ball.query(&handle, points.view()).unwrap_err();

    assert!(matches!(err, XnearError::ForeignHandle { .. }));
}

#[test]
fn test_builtin_adapters_find_coincident_points() {
    let points = square_points();
    for name in ["kdtree", "balltree"] {
        let factory = default_registry()
            .resolve(&IndexSpec::from(name))
            .unwrap();
        let adapter = factory(&AdapterOptions::new());
        let handle = adapter.build(points.view()).unwrap();
        let (distances, positions) = adapter.query(&handle, points.view()).unwrap();

        for i in 0..4 {
            assert_abs_diff_eq!(distances[i], 0.0, epsilon = 1e-12);
            assert_eq!(positions[i], i, "adapter '{name}'");
        }
    }
}

#[test]
fn test_leaf_size_option_does_not_change_results() {
    let points = square_points();
    let defaults = BallTreeAdapter::new(AdapterOptions::new());
    let tuned = BallTreeAdapter::new(AdapterOptions::new().leaf_size(1));

    let handle_a = defaults.build(points.view()).unwrap();
    let handle_b = tuned.build(points.view()).unwrap();

    let query = Array2::from_shape_vec((1, 2), vec![0.2, 0.8]).unwrap();
    let (da, pa) = defaults.query(&handle_a, query.view()).unwrap();
    let (db, pb) = tuned.query(&handle_b, query.view()).unwrap();

    assert_eq!(pa, pb);
    assert_abs_diff_eq!(da[0], db[0], epsilon = 1e-12);
}

#[test]
fn test_geo_adapter_rejects_non_latlon_points() {
    let adapter = GeoBallTreeAdapter::new(AdapterOptions::new());
    let points = Array2::<f64>::zeros((3, 3));
    let err = adapter.build(points.view()).unwrap_err();
    assert!(matches!(err, XnearError::InvalidInput(_)));
}
