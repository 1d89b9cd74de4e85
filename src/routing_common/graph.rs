// Graph structures shared by the compactor, the searches and the path finder.
//
// Every map is a BTreeMap keyed by `VertexKey` so iteration order, and with it
// every tie-break and every snapshot, is reproducible across runs.

use crate::error::PathFinderError;
use crate::vertex_key::VertexKey;
use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// vertex -> neighbour -> value
pub type Adjacency<T> = BTreeMap<VertexKey, BTreeMap<VertexKey, T>>;

/// Identifier of an input geometry. The preprocessor uses the index of the
/// feature inside the source collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// The uncompacted network: every vertex, every directed segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub vertices: Adjacency<f64>,
    /// Rounded coordinate of every vertex.
    pub source_vertices: BTreeMap<VertexKey, Coord<f64>>,
    /// Input feature of every directed segment, present only when edge ids are tracked.
    pub edge_data: Option<Adjacency<EdgeId>>,
}

impl NetworkGraph {
    pub fn contains(&self, key: &VertexKey) -> bool {
        self.vertices.contains_key(key)
    }

    pub fn degree(&self, key: &VertexKey) -> usize {
        self.vertices.get(key).map_or(0, BTreeMap::len)
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.values().map(BTreeMap::len).sum()
    }

    pub fn coordinate(&self, key: &VertexKey) -> Option<Coord<f64>> {
        self.source_vertices.get(key).copied()
    }

    pub fn edge_id(&self, from: &VertexKey, to: &VertexKey) -> Option<EdgeId> {
        self.edge_data.as_ref()?.get(from)?.get(to).copied()
    }
}

/// Junction-to-junction graph produced by collapsing degree-2 chains.
///
/// For every `(u, v)` present in `vertices`:
/// - `vertices[u][v]` is the summed weight of the chain from `u` to `v`;
/// - `coordinates[u][v]` is the chain's coordinate trace starting at `u` and
///   stopping before `v`;
/// - `edges[u][v]`, when tracked, holds one input edge id per chain segment,
///   so it is exactly as long as the coordinate trace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactedGraph {
    pub vertices: Adjacency<f64>,
    pub coordinates: Adjacency<Vec<Coord<f64>>>,
    pub edges: Option<Adjacency<Vec<EdgeId>>>,
}

impl CompactedGraph {
    pub fn contains(&self, key: &VertexKey) -> bool {
        self.vertices.contains_key(key)
    }

    pub fn junction_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn tracks_edge_ids(&self) -> bool {
        self.edges.is_some()
    }

    pub fn trace(&self, from: &VertexKey, to: &VertexKey) -> Option<&[Coord<f64>]> {
        self.coordinates.get(from)?.get(to).map(Vec::as_slice)
    }

    pub fn edge_ids(&self, from: &VertexKey, to: &VertexKey) -> Option<&[EdgeId]> {
        self.edges.as_ref()?.get(from)?.get(to).map(Vec::as_slice)
    }

    /// Every neighbour reference in `vertices` must resolve to a top-level key,
    /// and the coordinate and edge maps must mirror the weight map entry for entry.
    pub fn is_consistent(&self) -> bool {
        let mirrors = |other_keys: Vec<(&VertexKey, Vec<&VertexKey>)>| {
            other_keys.len() == self.vertices.len()
                && other_keys.iter().all(|(k, neighbours)| {
                    self.vertices
                        .get(*k)
                        .is_some_and(|n| n.keys().collect::<Vec<_>>() == *neighbours)
                })
        };

        let dangling = self
            .vertices
            .values()
            .flat_map(BTreeMap::keys)
            .any(|n| !self.vertices.contains_key(n));
        if dangling {
            return false;
        }

        let coordinate_keys = self
            .coordinates
            .iter()
            .map(|(k, n)| (k, n.keys().collect()))
            .collect();
        if !mirrors(coordinate_keys) {
            return false;
        }

        match &self.edges {
            Some(edges) => mirrors(edges.iter().map(|(k, n)| (k, n.keys().collect())).collect()),
            None => true,
        }
    }
}

/// Everything a path finder owns: the full network plus its compaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingGraph {
    pub network: NetworkGraph,
    pub compacted: CompactedGraph,
}

impl RoutingGraph {
    /// Checks done once at construction so queries never have to re-check them.
    pub fn validate(&self) -> Result<(), PathFinderError> {
        if self.compacted.vertices.is_empty() {
            return Err(PathFinderError::NoJunctions);
        }

        if self.network.edge_data.is_some() != self.compacted.edges.is_some() {
            return Err(PathFinderError::InconsistentEdgeTracking);
        }

        if let Some(missing) = self
            .compacted
            .vertices
            .keys()
            .find(|k| !self.network.source_vertices.contains_key(*k))
        {
            return Err(PathFinderError::InvalidSnapshot(format!(
                "junction {} has no source coordinate",
                missing
            )));
        }

        if !self.compacted.is_consistent() {
            return Err(PathFinderError::InvalidSnapshot(
                "compacted weights, coordinates and edge ids disagree".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serializable form of a path finder. Never contains phantom vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Precision the vertex keys were derived with; queries must reuse it.
    pub precision: f64,
    pub graph: RoutingGraph,
}
