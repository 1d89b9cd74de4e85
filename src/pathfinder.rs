//! Public query surface: shortest paths, isochrones and nearest junctions for
//! arbitrary points of a line network.

use crate::config::PathFinderOptions;
use crate::error::PathFinderError;
use crate::hull;
use crate::routing_common::compactor::compact_graph;
use crate::routing_common::dijkstra::shortest_path;
use crate::routing_common::graph::{
    CompactedGraph, EdgeId, GraphSnapshot, NetworkGraph, RoutingGraph,
};
use crate::routing_common::isochrone::reachable_set;
use crate::routing_common::phantom::PhantomScope;
use crate::routing_common::preprocess::build_network;
use crate::vertex_key::VertexKey;
use crate::weight_functions::{HaversineDistance, WeightFunction, haversine_distance};
use geo_types::{Coord, Polygon};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Every vertex coordinate along the route, finish included.
    pub path: Vec<Coord<f64>>,
    pub weight: f64,
    /// One input edge id per segment of `path`; `None` unless the graph tracks edge ids.
    pub edge_ids: Option<Vec<EdgeId>>,
}

/// Owns a routing graph and answers queries against it.
///
/// Path and isochrone queries temporarily splice their endpoints into the
/// compacted graph and therefore take `&mut self`; the borrow checker keeps
/// two such queries from interleaving on one instance. Wrap the finder in a
/// `Mutex` to share it, or use [`PathFinder::find_path_isolated`], which
/// works on a private copy of the compacted graph and only needs `&self`.
#[derive(Debug, Clone)]
pub struct PathFinder {
    graph: RoutingGraph,
    precision: f64,
}

impl PathFinder {
    /// Build from GeoJSON with great circle distance (metres) as the cost.
    pub fn from_geojson(
        collection: &FeatureCollection,
        options: &PathFinderOptions,
    ) -> Result<Self, PathFinderError> {
        Self::from_geojson_with_weights(collection, options, &HaversineDistance)
    }

    pub fn from_geojson_with_weights(
        collection: &FeatureCollection,
        options: &PathFinderOptions,
        weight_fn: &dyn WeightFunction,
    ) -> Result<Self, PathFinderError> {
        options.validate()?;
        let network = build_network(collection, options, weight_fn);
        Self::from_network(network, options)
    }

    /// Compact an already built network.
    pub fn from_network(
        network: NetworkGraph,
        options: &PathFinderOptions,
    ) -> Result<Self, PathFinderError> {
        options.validate()?;
        let compacted = compact_graph(&network, options.compact);
        Self::new(
            RoutingGraph { network, compacted },
            options.precision,
        )
    }

    /// Restore a finder without re-running preprocessing or compaction.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, PathFinderError> {
        Self::new(snapshot.graph, snapshot.precision)
    }

    fn new(graph: RoutingGraph, precision: f64) -> Result<Self, PathFinderError> {
        if !precision.is_finite() || precision <= 0.0 {
            return Err(PathFinderError::InvalidPrecision(precision));
        }
        graph.validate()?;

        info!(
            "Path finder ready: {} vertices, {} segments, {} junctions",
            graph.network.vertices.len(),
            graph.network.edge_count(),
            graph.compacted.junction_count()
        );

        Ok(Self { graph, precision })
    }

    pub fn serialize(&self) -> GraphSnapshot {
        GraphSnapshot {
            precision: self.precision,
            graph: self.graph.clone(),
        }
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn graph(&self) -> &RoutingGraph {
        &self.graph
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.network.vertices.len()
    }

    pub fn junction_count(&self) -> usize {
        self.graph.compacted.junction_count()
    }

    pub fn key_for(&self, coord: impl Into<Coord<f64>>) -> VertexKey {
        VertexKey::from_coord(coord.into(), self.precision)
    }

    // Key of a query point, or None when it does not round onto a known vertex.
    fn known_key(&self, coord: impl Into<Coord<f64>>) -> Option<VertexKey> {
        let coord = coord.into();
        if !coord.x.is_finite() || !coord.y.is_finite() {
            debug!("Query point {:?} is not finite", coord);
            return None;
        }
        let key = self.key_for(coord);
        if self.graph.network.contains(&key) {
            Some(key)
        } else {
            debug!("Query point {} is not a vertex of the network", key);
            None
        }
    }

    /// Cheapest route between two points of the network.
    ///
    /// Both points must round onto network vertices; they are not snapped to
    /// the closest one. Returns `None` for unknown points and for unreachable
    /// pairs. The compacted graph is unchanged once this returns.
    pub fn find_path(
        &mut self,
        start: impl Into<Coord<f64>>,
        finish: impl Into<Coord<f64>>,
    ) -> Option<PathResult> {
        let start = self.known_key(start)?;
        let finish = self.known_key(finish)?;
        let RoutingGraph { network, compacted } = &mut self.graph;
        route(network, compacted, start, finish)
    }

    /// Like [`PathFinder::find_path`] but on a throwaway copy of the compacted
    /// graph, so concurrent callers can share one finder.
    pub fn find_path_isolated(
        &self,
        start: impl Into<Coord<f64>>,
        finish: impl Into<Coord<f64>>,
    ) -> Option<PathResult> {
        let start = self.known_key(start)?;
        let finish = self.known_key(finish)?;
        let mut working_copy = self.graph.compacted.clone();
        route(&self.graph.network, &mut working_copy, start, finish)
    }

    /// Reached vertices and their cumulative cost from `start`, cheapest first.
    pub fn reachable_costs(
        &mut self,
        start: impl Into<Coord<f64>>,
        max_cost: f64,
    ) -> Option<Vec<(Coord<f64>, f64)>> {
        let start = self.known_key(start)?;
        let RoutingGraph { network, compacted } = &mut self.graph;
        let network: &NetworkGraph = network;

        let mut scope = PhantomScope::new(network, compacted);
        scope.insert(start);
        let costs = reachable_set(&scope.graph().vertices, start, max_cost);

        let mut reached: Vec<(VertexKey, f64)> = costs.into_iter().collect();
        reached.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Some(
            reached
                .into_iter()
                .filter_map(|(key, cost)| Some((network.coordinate(&key)?, cost)))
                .collect(),
        )
    }

    /// Coordinates of every vertex reachable from `start` within `max_cost`.
    pub fn reachable_points(
        &mut self,
        start: impl Into<Coord<f64>>,
        max_cost: f64,
    ) -> Option<Vec<Coord<f64>>> {
        self.reachable_costs(start, max_cost)
            .map(|costs| costs.into_iter().map(|(coord, _)| coord).collect())
    }

    pub fn isochrone_convex_hull(
        &mut self,
        start: impl Into<Coord<f64>>,
        max_cost: f64,
    ) -> Option<Polygon<f64>> {
        hull::convex_hull(&self.reachable_points(start, max_cost)?)
    }

    /// `concavity` follows the geo crate: lower values hug the points tighter.
    pub fn isochrone_concave_hull(
        &mut self,
        start: impl Into<Coord<f64>>,
        max_cost: f64,
        concavity: f64,
    ) -> Option<Polygon<f64>> {
        hull::concave_hull(&self.reachable_points(start, max_cost)?, concavity)
    }

    /// Closest junction to `coord` by great circle distance in metres.
    pub fn nearest_junction(&self, coord: impl Into<Coord<f64>>) -> Option<(Coord<f64>, f64)> {
        self.nearest_junction_by(coord, haversine_distance)
    }

    /// Linear scan over the junctions with a caller supplied distance. Ties go
    /// to the junction with the smallest key.
    ///
    /// Junctions are vertices of the full network with one neighbour or three
    /// and more, whether or not compaction kept other vertices too.
    pub fn nearest_junction_by(
        &self,
        coord: impl Into<Coord<f64>>,
        distance: impl Fn(Coord<f64>, Coord<f64>) -> f64,
    ) -> Option<(Coord<f64>, f64)> {
        let coord = coord.into();
        let network = &self.graph.network;
        let mut best: Option<(Coord<f64>, f64)> = None;

        for (key, neighbours) in &network.vertices {
            if neighbours.len() == 2 || neighbours.is_empty() {
                continue;
            }
            let Some(junction) = network.coordinate(key) else {
                continue;
            };
            let d = distance(coord, junction);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((junction, d));
            }
        }

        best
    }
}

fn route(
    network: &NetworkGraph,
    compacted: &mut CompactedGraph,
    start: VertexKey,
    finish: VertexKey,
) -> Option<PathResult> {
    let mut scope = PhantomScope::new(network, compacted);
    scope.insert(start);
    scope.insert(finish);

    let Some((weight, keys)) = shortest_path(&scope.graph().vertices, start, finish) else {
        debug!("No path from {} to {}", start, finish);
        return None;
    };

    let graph = scope.graph();
    let mut path = Vec::new();
    let mut edge_ids = graph.tracks_edge_ids().then(Vec::new);

    for pair in keys.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let Some(trace) = graph.trace(from, to) else {
            error!("Compacted edge {} -> {} has no coordinate trace", from, to);
            return None;
        };
        path.extend_from_slice(trace);

        if let Some(ids) = edge_ids.as_mut() {
            let Some(reduced) = graph.edge_ids(from, to) else {
                error!("Compacted edge {} -> {} has no edge ids", from, to);
                return None;
            };
            ids.extend_from_slice(reduced);
        }
    }
    path.push(network.coordinate(&finish)?);

    Some(PathResult {
        path,
        weight,
        edge_ids,
    })
}
