//! Builds the full network graph from GeoJSON line features.

use super::graph::{Adjacency, EdgeId, NetworkGraph};
use crate::config::PathFinderOptions;
use crate::vertex_key::VertexKey;
use crate::weight_functions::WeightFunction;
use geo_types::Coord;
use geojson::{FeatureCollection, JsonObject, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// Line strings of one feature, as raw GeoJSON positions.
fn line_strings(value: &Value) -> Vec<&Vec<Vec<f64>>> {
    match value {
        Value::LineString(line) => vec![line],
        Value::MultiLineString(lines) => lines.iter().collect(),
        _ => Vec::new(),
    }
}

struct NetworkBuilder<'a> {
    precision: f64,
    vertices: Adjacency<f64>,
    source_vertices: BTreeMap<VertexKey, Coord<f64>>,
    edge_data: Option<Adjacency<EdgeId>>,
    weight_fn: &'a dyn WeightFunction,
}

impl NetworkBuilder<'_> {
    fn vertex(&mut self, position: &[f64]) -> Option<(VertexKey, Coord<f64>)> {
        let [x, y, ..] = position else {
            return None;
        };
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let key = VertexKey::from_coord(Coord { x: *x, y: *y }, self.precision);
        let coord = *self
            .source_vertices
            .entry(key)
            .or_insert_with(|| key.to_coord(self.precision));
        Some((key, coord))
    }

    fn connect(&mut self, from: VertexKey, to: VertexKey, weight: f64, id: EdgeId) {
        let edges = self.vertices.entry(from).or_default();
        let improved = edges.get(&to).is_none_or(|w| weight < *w);
        if improved {
            edges.insert(to, weight);
            if let Some(edge_data) = self.edge_data.as_mut() {
                edge_data.entry(from).or_default().insert(to, id);
            }
        }
    }

    fn add_segment(&mut self, a: &[f64], b: &[f64], id: EdgeId, properties: Option<&JsonObject>) {
        let (Some((a_key, a_coord)), Some((b_key, b_coord))) = (self.vertex(a), self.vertex(b))
        else {
            return;
        };
        if a_key == b_key {
            return;
        }

        let weight = self.weight_fn.weight(a_coord, b_coord, properties).sanitized();
        if !weight.is_traversable() {
            return;
        }

        self.vertices.entry(a_key).or_default();
        self.vertices.entry(b_key).or_default();
        if let Some(forward) = weight.forward {
            self.connect(a_key, b_key, forward, id);
        }
        if let Some(backward) = weight.backward {
            self.connect(b_key, a_key, backward, id);
        }
    }
}

/// Turn every `LineString` / `MultiLineString` feature into graph segments.
///
/// Consecutive positions become a segment between their rounded vertex keys.
/// Segments collapsing onto one key and segments the weight function rejects
/// in both directions are skipped; when the same segment appears twice the
/// cheaper weight wins. Vertices referenced only by skipped segments are not
/// part of the graph.
pub fn build_network(
    collection: &FeatureCollection,
    options: &PathFinderOptions,
    weight_fn: &dyn WeightFunction,
) -> NetworkGraph {
    let mut builder = NetworkBuilder {
        precision: options.precision,
        vertices: BTreeMap::new(),
        source_vertices: BTreeMap::new(),
        edge_data: options.track_edge_ids.then(BTreeMap::new),
        weight_fn,
    };

    let mut skipped_features = 0usize;
    for (index, feature) in collection.features.iter().enumerate() {
        let lines = feature
            .geometry
            .as_ref()
            .map(|g| line_strings(&g.value))
            .unwrap_or_default();
        if lines.is_empty() {
            skipped_features += 1;
            continue;
        }

        let id = EdgeId(index as u32);
        for line in lines {
            for pair in line.windows(2) {
                builder.add_segment(&pair[0], &pair[1], id, feature.properties.as_ref());
            }
        }
    }

    if skipped_features > 0 {
        warn!("Skipped {} features without line geometry", skipped_features);
    }

    // Coordinates of positions that never made it into a segment are dropped.
    let NetworkBuilder {
        vertices,
        mut source_vertices,
        edge_data,
        ..
    } = builder;
    source_vertices.retain(|k, _| vertices.contains_key(k));

    debug!(
        "Built network with {} vertices from {} features",
        vertices.len(),
        collection.features.len()
    );

    NetworkGraph {
        vertices,
        source_vertices,
        edge_data,
    }
}
