//! Collapses chains of degree-2 vertices into direct junction-to-junction edges.

use super::graph::{Adjacency, CompactedGraph, EdgeId, NetworkGraph};
use crate::vertex_key::VertexKey;
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use geo_types::Coord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Result of compacting the neighbourhood of a single vertex.
///
/// The outgoing maps describe chains leaving the vertex. The incoming maps,
/// filled only when incoming tracking is requested, describe the same chains
/// walked in reverse: for each end junction, the cost and trace of travelling
/// from that junction back to the vertex.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompactedNode {
    pub edges: BTreeMap<VertexKey, f64>,
    pub coordinates: BTreeMap<VertexKey, Vec<Coord<f64>>>,
    pub reduced_edges: BTreeMap<VertexKey, Vec<EdgeId>>,
    pub incoming_edges: BTreeMap<VertexKey, f64>,
    pub incoming_coordinates: BTreeMap<VertexKey, Vec<Coord<f64>>>,
    pub incoming_reduced_edges: BTreeMap<VertexKey, Vec<EdgeId>>,
}

// One walk along a chain, from the vertex being compacted to the next end.
struct ChainWalk {
    end: VertexKey,
    weight: f64,
    // None as soon as one segment of the chain is not traversable backwards.
    reverse_weight: Option<f64>,
    // Interior vertices in walking order; the origin and the end are excluded.
    interior: Vec<Coord<f64>>,
    edge_ids: Vec<EdgeId>,
    reverse_edge_ids: Vec<EdgeId>,
}

/// Vertices that stay in the compacted graph.
///
/// A vertex may be folded into a chain only if it has exactly two neighbours,
/// both link back to it, and nothing else links to it. Everything else is a
/// junction; on a network without one-way segments that is every vertex of
/// degree 1 or degree 3 and up.
pub fn find_junctions(vertices: &Adjacency<f64>) -> BTreeSet<VertexKey> {
    let mut in_degree: HashMap<VertexKey, usize> = HashMap::new();
    for neighbours in vertices.values() {
        for n in neighbours.keys() {
            *in_degree.entry(*n).or_default() += 1;
        }
    }

    vertices
        .iter()
        .filter(|(key, neighbours)| {
            let collapsible = neighbours.len() == 2
                && in_degree.get(*key).copied().unwrap_or(0) == 2
                && neighbours
                    .keys()
                    .all(|n| vertices.get(n).is_some_and(|back| back.contains_key(*key)));
            !collapsible
        })
        .map(|(key, _)| *key)
        .collect()
}

fn walk_chain(
    origin: VertexKey,
    first: VertexKey,
    network: &NetworkGraph,
    is_end: &impl Fn(&VertexKey) -> bool,
    track_incoming: bool,
) -> Option<ChainWalk> {
    let vertices = &network.vertices;
    let tracks_ids = network.edge_data.is_some();

    let mut walk = ChainWalk {
        end: first,
        weight: *vertices.get(&origin)?.get(&first)?,
        reverse_weight: vertices.get(&first).and_then(|n| n.get(&origin)).copied(),
        interior: Vec::new(),
        edge_ids: Vec::new(),
        reverse_edge_ids: Vec::new(),
    };
    if tracks_ids {
        walk.edge_ids.extend(network.edge_id(&origin, &first));
        walk.reverse_edge_ids.extend(network.edge_id(&first, &origin));
    }

    let mut visited = HashSet::new();
    let mut prev = origin;
    let mut current = first;

    while current != origin && !is_end(&current) {
        if !visited.insert(current) {
            // Closed loop with no end on it.
            return None;
        }

        let neighbours = vertices.get(&current)?;
        let (&next, &weight) = neighbours.iter().find(|(k, _)| **k != prev)?;

        walk.weight += weight;
        if track_incoming {
            let back = vertices.get(&next).and_then(|n| n.get(&current)).copied();
            walk.reverse_weight = walk.reverse_weight.zip(back).map(|(a, b)| a + b);
        }
        if tracks_ids {
            walk.edge_ids.extend(network.edge_id(&current, &next));
            walk.reverse_edge_ids.extend(network.edge_id(&next, &current));
        }
        walk.interior.push(network.coordinate(&current)?);

        prev = current;
        current = next;
    }

    walk.end = current;
    Some(walk)
}

/// Compact the neighbourhood of `key`.
///
/// Every incident segment is followed through collapsible vertices until a
/// vertex accepted by `is_end` is reached. When several chains lead to the
/// same end only the cheapest is kept. Chains returning to `key` itself are
/// dropped.
///
/// With `track_incoming` the reverse direction of every chain is recorded as
/// well, which is what splicing a phantom vertex into the compacted graph
/// needs. The function only reads its inputs; whether and how the result is
/// applied is up to the caller.
pub fn compact_node(
    key: VertexKey,
    network: &NetworkGraph,
    is_end: impl Fn(&VertexKey) -> bool,
    track_incoming: bool,
) -> CompactedNode {
    let mut result = CompactedNode::default();

    let (Some(neighbours), Some(origin)) = (network.vertices.get(&key), network.coordinate(&key))
    else {
        return result;
    };

    for &neighbour in neighbours.keys() {
        let Some(walk) = walk_chain(key, neighbour, network, &is_end, track_incoming) else {
            continue;
        };
        if walk.end == key || !is_end(&walk.end) {
            continue;
        }

        let cheaper = result.edges.get(&walk.end).is_none_or(|w| *w > walk.weight);
        if cheaper {
            let mut trace = Vec::with_capacity(walk.interior.len() + 1);
            trace.push(origin);
            trace.extend_from_slice(&walk.interior);

            result.edges.insert(walk.end, walk.weight);
            result.coordinates.insert(walk.end, trace);
            result.reduced_edges.insert(walk.end, walk.edge_ids.clone());
        }

        if !track_incoming {
            continue;
        }
        let Some(reverse_weight) = walk.reverse_weight else {
            continue;
        };
        let cheaper = result
            .incoming_edges
            .get(&walk.end)
            .is_none_or(|w| *w > reverse_weight);
        if cheaper {
            let Some(end_coord) = network.coordinate(&walk.end) else {
                continue;
            };
            let mut trace = Vec::with_capacity(walk.interior.len() + 1);
            trace.push(end_coord);
            trace.extend(walk.interior.iter().rev().copied());

            let mut ids = walk.reverse_edge_ids;
            ids.reverse();

            result.incoming_edges.insert(walk.end, reverse_weight);
            result.incoming_coordinates.insert(walk.end, trace);
            result.incoming_reduced_edges.insert(walk.end, ids);
        }
    }

    result
}

/// Build the compacted graph of a whole network.
///
/// With `compact == false` no chain is collapsed and the compacted graph is
/// the full graph with single-segment traces.
pub fn compact_graph(network: &NetworkGraph, compact: bool) -> CompactedGraph {
    let vertices = &network.vertices;
    let ends: BTreeSet<VertexKey> = if compact {
        find_junctions(vertices)
    } else {
        vertices.keys().copied().collect()
    };

    let mut compacted = CompactedGraph {
        vertices: BTreeMap::new(),
        coordinates: BTreeMap::new(),
        edges: network.edge_data.as_ref().map(|_| BTreeMap::new()),
    };

    for key in &ends {
        let node = compact_node(*key, network, |k| ends.contains(k), false);
        compacted.vertices.insert(*key, node.edges);
        compacted.coordinates.insert(*key, node.coordinates);
        if let Some(edges) = compacted.edges.as_mut() {
            edges.insert(*key, node.reduced_edges);
        }
    }

    debug!(
        "Compacted {} vertices into {} junctions",
        vertices.len(),
        compacted.vertices.len()
    );

    compacted
}
