use super::graph::{Adjacency, EdgeId, GraphSnapshot, NetworkGraph};
use crate::config::PathFinderOptions;
use crate::error::PathFinderError;
use crate::pathfinder::PathFinder;
use crate::snapshot::{decode_snapshot, encode_snapshot};
use crate::vertex_key::VertexKey;
use crate::weight_functions::EuclideanDistance;
use geo_types::Coord;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn lines(lines: &[&[[f64; 2]]]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: lines
            .iter()
            .map(|coords| Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(
                    coords.iter().map(|c| c.to_vec()).collect(),
                ))),
                id: None,
                properties: None,
                foreign_members: None,
            })
            .collect(),
        foreign_members: None,
    }
}

// Unit square with a midpoint on its bottom side. Spurs off (0,0) and (1,1)
// make those two corners junctions; every other vertex sits mid-chain.
fn square(track_edge_ids: bool) -> PathFinder {
    let fc = lines(&[
        &[[0.0, 0.0], [0.5, 0.0], [1.0, 0.0]],
        &[[1.0, 0.0], [1.0, 1.0]],
        &[[1.0, 1.0], [0.0, 1.0]],
        &[[0.0, 1.0], [0.0, 0.0]],
        &[[0.0, 0.0], [-1.0, -1.0]],
        &[[1.0, 1.0], [2.0, 2.0]],
    ]);
    let options = PathFinderOptions {
        track_edge_ids,
        ..PathFinderOptions::default()
    };
    PathFinder::from_geojson_with_weights(&fc, &options, &EuclideanDistance).unwrap()
}

#[test]
fn square_corner_to_corner() {
    let mut finder = square(false);
    assert_eq!(finder.junction_count(), 4);

    let result = finder.find_path((0.0, 0.0), (1.0, 1.0)).unwrap();
    assert_close(result.weight, 2.0);
    assert!(result.edge_ids.is_none());

    // Equal cost chains between the same junctions: the one leaving through
    // the smaller neighbour key, (0,1), is the one kept.
    let keys: Vec<VertexKey> = result.path.iter().map(|c| finder.key_for(*c)).collect();
    assert_eq!(
        keys,
        vec![
            finder.key_for((0.0, 0.0)),
            finder.key_for((0.0, 1.0)),
            finder.key_for((1.0, 1.0)),
        ]
    );
}

#[test]
fn square_from_midpoint_uses_phantom() {
    let mut finder = square(true);
    let before = finder.serialize();

    let result = finder.find_path((0.5, 0.0), (1.0, 1.0)).unwrap();
    assert_close(result.weight, 1.5);
    let keys: Vec<VertexKey> = result.path.iter().map(|c| finder.key_for(*c)).collect();
    assert_eq!(
        keys,
        vec![
            finder.key_for((0.5, 0.0)),
            finder.key_for((1.0, 0.0)),
            finder.key_for((1.0, 1.0)),
        ]
    );
    assert_eq!(result.edge_ids, Some(vec![EdgeId(0), EdgeId(1)]));

    assert_eq!(finder.serialize(), before);
}

#[test]
fn both_endpoints_mid_chain() {
    let mut finder = square(true);
    let before = finder.serialize();

    let result = finder.find_path((0.5, 0.0), (0.0, 1.0)).unwrap();
    assert_close(result.weight, 1.5);
    assert_eq!(result.edge_ids.as_ref().unwrap().len(), result.path.len() - 1);

    let result = finder.find_path((0.5, 0.0), (1.0, 0.0)).unwrap();
    assert_close(result.weight, 0.5);
    assert_eq!(result.path.len(), 2);

    let result = finder.find_path((1.0, 0.0), (1.0, 0.0)).unwrap();
    assert_close(result.weight, 0.0);
    assert_eq!(result.path.len(), 1);
    assert_eq!(result.edge_ids, Some(vec![]));

    assert_eq!(finder.serialize(), before);
}

#[test]
fn unknown_points_return_none_without_side_effects() {
    let mut finder = square(false);
    let before = finder.serialize();

    assert!(finder.find_path((0.25, 0.0), (1.0, 1.0)).is_none());
    assert!(finder.find_path((0.5, 0.0), (7.0, 7.0)).is_none());
    assert!(finder.reachable_points((0.3, 0.3), 10.0).is_none());

    assert_eq!(finder.serialize(), before);
}

#[test]
fn non_finite_points_are_not_vertices() {
    let mut finder = square(false);
    let before = finder.serialize();

    // NaN would otherwise round onto the vertex at the origin.
    assert!(finder.find_path((f64::NAN, f64::NAN), (1.0, 1.0)).is_none());
    assert!(finder.find_path((0.0, 0.0), (f64::INFINITY, 1.0)).is_none());
    assert!(finder.find_path_isolated((f64::NAN, 0.0), (1.0, 1.0)).is_none());
    assert!(finder.reachable_points((0.0, f64::NEG_INFINITY), 10.0).is_none());

    assert_eq!(finder.serialize(), before);
}

#[test]
fn disconnected_components_have_no_path() {
    let fc = lines(&[
        &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
        &[[10.0, 0.0], [11.0, 0.0], [12.0, 0.0]],
    ]);
    let mut finder =
        PathFinder::from_geojson_with_weights(&fc, &PathFinderOptions::default(), &EuclideanDistance)
            .unwrap();
    let before = finder.serialize();

    assert!(finder.find_path((1.0, 0.0), (11.0, 0.0)).is_none());
    assert!(finder.find_path((0.0, 0.0), (12.0, 0.0)).is_none());
    assert_close(finder.find_path((0.0, 0.0), (1.0, 0.0)).unwrap().weight, 1.0);

    assert_eq!(finder.serialize(), before);
}

#[test]
fn topology_without_junctions_is_rejected() {
    let ring = lines(&[&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
    let err = PathFinder::from_geojson_with_weights(
        &ring,
        &PathFinderOptions::default(),
        &EuclideanDistance,
    )
    .unwrap_err();
    assert!(matches!(err, PathFinderError::NoJunctions));

    let empty = lines(&[]);
    assert!(matches!(
        PathFinder::from_geojson(&empty, &PathFinderOptions::default()),
        Err(PathFinderError::NoJunctions)
    ));
}

#[test]
fn inconsistent_snapshots_are_rejected() {
    let finder = square(true);

    let mut snapshot = finder.serialize();
    snapshot.graph.compacted.edges = None;
    assert!(matches!(
        PathFinder::from_snapshot(snapshot),
        Err(PathFinderError::InconsistentEdgeTracking)
    ));

    let mut snapshot = finder.serialize();
    let junction = *snapshot.graph.compacted.vertices.keys().next().unwrap();
    snapshot.graph.compacted.coordinates.remove(&junction);
    assert!(matches!(
        PathFinder::from_snapshot(snapshot),
        Err(PathFinderError::InvalidSnapshot(_))
    ));

    let mut snapshot = finder.serialize();
    snapshot.precision = -1.0;
    assert!(matches!(
        PathFinder::from_snapshot(snapshot),
        Err(PathFinderError::InvalidPrecision(_))
    ));
}

#[test]
fn snapshot_restores_an_equivalent_finder() {
    let mut finder = square(true);
    let bytes = encode_snapshot(&finder.serialize()).unwrap();
    let decoded: GraphSnapshot = decode_snapshot(&bytes).unwrap();
    assert_eq!(decoded, finder.serialize());

    let mut restored = PathFinder::from_snapshot(decoded).unwrap();
    assert_eq!(
        restored.find_path((0.5, 0.0), (2.0, 2.0)),
        finder.find_path((0.5, 0.0), (2.0, 2.0))
    );
}

#[test]
fn isochrone_grows_with_the_bound() {
    let mut finder = square(false);
    let start = (0.5, 0.0);

    let near = finder.reachable_costs(start, 0.5).unwrap();
    assert_eq!(near.len(), 2);
    assert_eq!(finder.key_for(near[0].0), finder.key_for(start));
    assert_close(near[0].1, 0.0);
    assert_eq!(finder.key_for(near[1].0), finder.key_for((0.0, 0.0)));
    assert_close(near[1].1, 0.5);

    let far = finder.reachable_costs(start, 10.0).unwrap();
    assert_eq!(far.len(), 5);
    for (coord, cost) in &near {
        let (_, far_cost) = far.iter().find(|(c, _)| c == coord).unwrap();
        assert_close(*far_cost, *cost);
    }

    let points = finder.reachable_points(start, 10.0).unwrap();
    assert_eq!(points.len(), 5);
    assert!(finder.isochrone_convex_hull(start, 10.0).is_some());
    assert!(finder.isochrone_convex_hull(start, 0.5).is_none());
}

#[test]
fn nearest_junction_scans_junctions_only() {
    let finder = square(false);
    let euclid = |a: Coord<f64>, b: Coord<f64>| (a.x - b.x).hypot(a.y - b.y);

    // (1,0) is a chain vertex, so the closest junction is a corner.
    let (coord, distance) = finder.nearest_junction_by((1.0, 0.1), euclid).unwrap();
    assert_eq!(finder.key_for(coord), finder.key_for((1.0, 1.0)));
    assert_close(distance, 0.9);

    let (coord, _) = finder.nearest_junction((1.9, 2.1)).unwrap();
    assert_eq!(finder.key_for(coord), finder.key_for((2.0, 2.0)));

    // Equidistant from (0,0) and (1,1): the smaller key wins.
    let (coord, _) = finder.nearest_junction_by((0.5, 0.5), euclid).unwrap();
    assert_eq!(finder.key_for(coord), finder.key_for((0.0, 0.0)));
}

#[test]
fn nearest_junction_ignores_chain_vertices_without_compaction() {
    // Line (0,0)-(1,0)-(2,0) forking at (2,0) into (3,1) and (3,-1).
    let fc = lines(&[
        &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
        &[[2.0, 0.0], [3.0, 1.0]],
        &[[2.0, 0.0], [3.0, -1.0]],
    ]);
    let options = PathFinderOptions {
        compact: false,
        ..PathFinderOptions::default()
    };
    let finder = PathFinder::from_geojson_with_weights(&fc, &options, &EuclideanDistance).unwrap();
    assert_eq!(finder.junction_count(), finder.vertex_count());
    let euclid = |a: Coord<f64>, b: Coord<f64>| (a.x - b.x).hypot(a.y - b.y);

    // (1,0) is closest but only has two neighbours; (0,0) and (2,0) tie
    // behind it and the smaller key wins.
    let (coord, distance) = finder.nearest_junction_by((1.0, 0.05), euclid).unwrap();
    assert_eq!(finder.key_for(coord), finder.key_for((0.0, 0.0)));
    assert_close(distance, 1.0f64.hypot(0.05));

    let (coord, _) = finder.nearest_junction_by((1.8, 0.1), euclid).unwrap();
    assert_eq!(finder.key_for(coord), finder.key_for((2.0, 0.0)));
}

#[test]
fn isolated_queries_match_and_run_concurrently() {
    let mut finder = square(true);
    let expected = finder.find_path((0.5, 0.0), (0.0, 1.0));
    let before = finder.serialize();

    let finder = &finder;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| finder.find_path_isolated((0.5, 0.0), (0.0, 1.0))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });

    assert_eq!(finder.serialize(), before);
}

// Random grid networks, some segments one-way, integer weights so sums are exact.
fn random_network(rng: &mut StdRng, size: i64) -> NetworkGraph {
    let mut vertices: Adjacency<f64> = BTreeMap::new();
    let mut edge_data: Adjacency<EdgeId> = BTreeMap::new();
    let mut next_id = 0;

    for x in 0..size {
        for y in 0..size {
            for (dx, dy) in [(1, 0), (0, 1)] {
                let (nx, ny) = (x + dx, y + dy);
                if nx >= size || ny >= size || !rng.random_bool(0.6) {
                    continue;
                }
                let (a, b) = (VertexKey::new(x, y), VertexKey::new(nx, ny));
                let weight = rng.random_range(1..=5) as f64;
                let id = EdgeId(next_id);
                next_id += 1;

                let directions = match rng.random_range(0..10) {
                    0 => vec![(a, b)],
                    1 => vec![(b, a)],
                    _ => vec![(a, b), (b, a)],
                };
                vertices.entry(a).or_default();
                vertices.entry(b).or_default();
                for (from, to) in directions {
                    vertices.entry(from).or_default().insert(to, weight);
                    edge_data.entry(from).or_default().insert(to, id);
                }
            }
        }
    }

    let source_vertices = vertices.keys().map(|k| (*k, k.to_coord(1.0))).collect();
    NetworkGraph {
        vertices,
        source_vertices,
        edge_data: Some(edge_data),
    }
}

// All pairs shortest path costs directly on the uncompacted graph.
fn floyd_warshall(network: &NetworkGraph) -> BTreeMap<(VertexKey, VertexKey), f64> {
    let keys: Vec<VertexKey> = network.vertices.keys().copied().collect();
    let mut dist = BTreeMap::new();
    for a in &keys {
        for b in &keys {
            let d = if a == b {
                0.0
            } else {
                network.vertices[a].get(b).copied().unwrap_or(f64::INFINITY)
            };
            dist.insert((*a, *b), d);
        }
    }
    for k in &keys {
        for i in &keys {
            for j in &keys {
                let through = dist[&(*i, *k)] + dist[&(*k, *j)];
                if through < dist[&(*i, *j)] {
                    dist.insert((*i, *j), through);
                }
            }
        }
    }
    dist
}

#[test]
fn compacted_search_matches_brute_force() {
    let options = PathFinderOptions {
        precision: 1.0,
        compact: true,
        track_edge_ids: true,
    };
    let mut checked_graphs = 0;

    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let network = random_network(&mut rng, 4);
        let expected = floyd_warshall(&network);

        let mut finder = match PathFinder::from_network(network.clone(), &options) {
            Ok(finder) => finder,
            Err(PathFinderError::NoJunctions) => continue,
            Err(e) => panic!("seed {}: {}", seed, e),
        };
        checked_graphs += 1;
        let pristine = finder.serialize();

        for ((start, finish), distance) in &expected {
            let start_coord = start.to_coord(1.0);
            let finish_coord = finish.to_coord(1.0);
            let result = finder.find_path(start_coord, finish_coord);

            match result {
                None => assert!(
                    distance.is_infinite(),
                    "seed {}: no path {} -> {} but distance {}",
                    seed,
                    start,
                    finish,
                    distance
                ),
                Some(result) => {
                    assert_eq!(result.weight, *distance, "seed {}: {} -> {}", seed, start, finish);
                    assert_eq!(result.path.first(), Some(&start_coord));
                    assert_eq!(result.path.last(), Some(&finish_coord));

                    // The expanded path walks real segments and adds up to the weight.
                    let walked: f64 = result
                        .path
                        .windows(2)
                        .map(|w| network.vertices[&finder.key_for(w[0])][&finder.key_for(w[1])])
                        .sum();
                    assert_eq!(walked, result.weight);

                    let ids = result.edge_ids.unwrap();
                    assert_eq!(ids.len(), result.path.len() - 1);
                    for (w, id) in result.path.windows(2).zip(&ids) {
                        let (a, b) = (finder.key_for(w[0]), finder.key_for(w[1]));
                        assert_eq!(network.edge_id(&a, &b), Some(*id));
                    }
                }
            }

            assert_eq!(finder.serialize(), pristine, "seed {}: graph changed", seed);
        }

        // Isochrone costs agree with the brute force distances as well.
        let start = *network.vertices.keys().next().unwrap();
        let reached = finder.reachable_costs(start.to_coord(1.0), 6.0).unwrap();
        for (coord, cost) in reached {
            let key = finder.key_for(coord);
            assert_eq!(cost, expected[&(start, key)]);
            assert!(cost <= 6.0);
        }
        assert_eq!(finder.serialize(), pristine);
    }

    assert!(checked_graphs > 10);
}

#[test]
fn compaction_preserves_chain_weights() {
    for seed in 100..110 {
        let mut rng = StdRng::seed_from_u64(seed);
        let network = random_network(&mut rng, 5);
        let expected = floyd_warshall(&network);
        let options = PathFinderOptions {
            precision: 1.0,
            ..PathFinderOptions::default()
        };
        let Ok(finder) = PathFinder::from_network(network.clone(), &options) else {
            continue;
        };

        let compacted = &finder.graph().compacted;
        assert!(compacted.is_consistent());
        for (u, neighbours) in &compacted.vertices {
            for (v, weight) in neighbours {
                // A chain is a path, so it can never beat the shortest path.
                assert!(*weight >= expected[&(*u, *v)]);

                let trace = compacted.trace(u, v).unwrap();
                let mut walk: Vec<VertexKey> = trace.iter().map(|c| finder.key_for(*c)).collect();
                walk.push(*v);
                let summed: f64 = walk.windows(2).map(|w| network.vertices[&w[0]][&w[1]]).sum();
                assert_eq!(summed, *weight);
                assert_eq!(compacted.edge_ids(u, v).map(<[EdgeId]>::len), Some(trace.len()));
            }
        }
    }
}
