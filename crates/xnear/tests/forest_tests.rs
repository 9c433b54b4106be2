//! Chunked coordinates: forest construction, offsets, laziness and
//! map-reduce equivalence with the unpartitioned path.

use approx::assert_abs_diff_eq;
use ndarray::{ArrayD, IxDyn};
use xnear::prelude::*;

fn coord(dims: &[&str], shape: &[usize], values: Vec<f64>) -> CoordArray {
    let data = ArrayD::from_shape_vec(IxDyn(shape), values).unwrap();
    CoordArray::new(dims.iter().copied(), data).unwrap()
}

fn chunked_coord(values: Vec<f64>, chunks: Vec<usize>) -> CoordArray {
    coord(&["points"], &[values.len()], values)
        .with_chunks(chunks)
        .unwrap()
}

/// Twelve distinct points on a skewed line, so nearest neighbors are
/// unambiguous.
fn line_values() -> (Vec<f64>, Vec<f64>) {
    let ys: Vec<f64> = (0..12).map(|i| i as f64 * 1.5).collect();
    let xs: Vec<f64> = (0..12).map(|i| 30.0 - i as f64 * 2.0).collect();
    (ys, xs)
}

fn build_selector(chunks: Option<Vec<usize>>, persist: bool) -> Selector {
    let (ys, xs) = line_values();
    let mut coords = CoordSet::new();
    match &chunks {
        None => {
            coords.insert("y", coord(&["points"], &[12], ys));
            coords.insert("x", coord(&["points"], &[12], xs));
        }
        Some(chunks) => {
            coords.insert("y", chunked_coord(ys, chunks.clone()));
            coords.insert("x", chunked_coord(xs, chunks.clone()));
        }
    }

    let mut selector = Selector::new();
    selector
        .set_index(
            &coords,
            &["y", "x"],
            "balltree",
            persist,
            AdapterOptions::new(),
        )
        .unwrap();
    selector
}

fn query_set(ys: Vec<f64>, xs: Vec<f64>) -> CoordSet {
    let n = ys.len();
    let mut queries = CoordSet::new();
    queries.insert("y", coord(&["p"], &[n], ys));
    queries.insert("x", coord(&["p"], &[n], xs));
    queries
}

#[test]
fn test_forest_offsets_are_cumulative_row_counts() {
    let selector = build_selector(Some(vec![5, 4, 3]), true);

    let forest = selector.forest().expect("chunked index builds a forest");
    assert_eq!(forest.len(), 3);

    let offsets: Vec<usize> = forest.wrappers().iter().map(|w| w.offset()).collect();
    assert_eq!(offsets, vec![0, 5, 9]);

    let sizes: Vec<usize> = forest.wrappers().iter().map(|w| w.n_points()).collect();
    assert_eq!(sizes, vec![5, 4, 3]);
}

#[test]
fn test_query_lands_in_owning_partition() {
    let selector = build_selector(Some(vec![5, 4, 3]), true);

    // Point 10 lives in the third partition, whose range is [9, 12).
    let (ys, xs) = line_values();
    let records = selector
        .query(&query_set(vec![ys[10] + 0.1], vec![xs[10] - 0.1]))
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!((9..12).contains(&records[0].position));
    assert_eq!(records[0].position, 10);
}

#[test]
fn test_map_reduce_matches_unpartitioned_results() {
    let dense = build_selector(None, true);
    let chunked = build_selector(Some(vec![5, 4, 3]), true);

    let queries = query_set(
        vec![-1.0, 3.2, 8.0, 11.9, 17.0, 40.0],
        vec![31.0, 25.0, 19.0, 14.0, 7.0, -20.0],
    );

    let from_dense = dense.query(&queries).unwrap();
    let from_chunked = chunked.query(&queries).unwrap();

    assert_eq!(from_dense.len(), from_chunked.len());
    for (a, b) in from_dense.iter().zip(from_chunked.iter()) {
        assert_eq!(a.position, b.position);
        assert_abs_diff_eq!(a.distance, b.distance, epsilon = 1e-9);
    }
}

#[test]
fn test_select_matches_across_partitionings() {
    let dense = build_selector(None, true);
    let chunked = build_selector(Some(vec![2, 2, 2, 2, 2, 2]), true);

    let queries = query_set(vec![0.2, 7.4, 16.3], vec![29.0, 20.0, 9.0]);

    let a = dense.select(&queries).unwrap();
    let b = chunked.select(&queries).unwrap();

    assert_eq!(a.indexers.len(), b.indexers.len());
    for ((dim_a, idx_a), (dim_b, idx_b)) in a.indexers.iter().zip(b.indexers.iter()) {
        assert_eq!(dim_a, dim_b);
        assert_eq!(idx_a, idx_b);
    }
}

#[test]
fn test_chunked_queries_against_single_index() {
    let selector = build_selector(None, true);

    let (ys, xs) = line_values();
    let dense_queries = query_set(ys.clone(), xs.clone());

    let mut chunked_queries = CoordSet::new();
    chunked_queries.insert("y", chunked_coord(ys, vec![4, 4, 4]));
    chunked_queries.insert("x", chunked_coord(xs, vec![4, 4, 4]));

    let from_dense = selector.query(&dense_queries).unwrap();
    let from_chunked = selector.query(&chunked_queries).unwrap();

    assert_eq!(from_dense, from_chunked);
    for (i, record) in from_chunked.iter().enumerate() {
        assert_eq!(record.position, i);
        assert_abs_diff_eq!(record.distance, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_unpersisted_forest_defers_builds() {
    let selector = build_selector(Some(vec![6, 6]), false);

    let forest = selector.forest().unwrap();
    assert!(!forest.is_built(0));
    assert!(!forest.is_built(1));

    // The index accessor forces evaluation of every partition.
    match selector.index().unwrap() {
        Some(IndexHandles::Forest(handles)) => assert_eq!(handles.len(), 2),
        _ => panic!("expected forest handles"),
    }

    let forest = selector.forest().unwrap();
    assert!(forest.is_built(0));
    assert!(forest.is_built(1));
}

#[test]
fn test_persisted_forest_is_built_immediately() {
    let selector = build_selector(Some(vec![6, 6]), true);

    let forest = selector.forest().unwrap();
    assert!(forest.is_built(0));
    assert!(forest.is_built(1));
}

#[test]
fn test_unpersisted_forest_builds_on_first_query() {
    let selector = build_selector(Some(vec![6, 6]), false);
    assert!(!selector.forest().unwrap().is_built(0));

    let records = selector
        .query(&query_set(vec![0.1], vec![29.9]))
        .unwrap();
    assert_eq!(records[0].position, 0);

    let forest = selector.forest().unwrap();
    assert!(forest.is_built(0));
    assert!(forest.is_built(1));
}

#[test]
fn test_single_chunk_still_builds_a_forest() {
    let selector = build_selector(Some(vec![12]), true);

    let forest = selector.forest().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest.wrappers()[0].offset(), 0);

    let records = selector.query(&query_set(vec![0.1], vec![29.9])).unwrap();
    assert_eq!(records[0].position, 0);
}

#[test]
fn test_conflicting_coordinate_chunks_fail_construction() {
    let (ys, xs) = line_values();
    let mut coords = CoordSet::new();
    coords.insert("y", chunked_coord(ys, vec![6, 6]));
    coords.insert("x", chunked_coord(xs, vec![4, 4, 4]));

    let mut selector = Selector::new();
    let err = selector
        .set_index(
            &coords,
            &["y", "x"],
            "balltree",
            true,
            AdapterOptions::new(),
        )
        .unwrap_err();

    assert!(matches!(err, XnearError::ChunkMismatch { .. }));
    assert!(selector.index().unwrap().is_none());
}
