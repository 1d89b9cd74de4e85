//! Temporary splicing of query endpoints into the compacted graph.
//!
//! A query point that falls in the middle of a collapsed chain has no entry
//! in the compacted graph. [`PhantomScope`] inserts such points for the
//! duration of one query and takes them out again when it is dropped, which
//! happens on every exit path of the query, early returns included.

use super::compactor::compact_node;
use super::graph::{CompactedGraph, NetworkGraph};
use crate::vertex_key::VertexKey;
use tracing::{error, trace};

#[derive(Debug)]
struct Phantom {
    key: VertexKey,
    // Vertices that received an entry pointing at `key`.
    incoming: Vec<VertexKey>,
}

pub struct PhantomScope<'g> {
    network: &'g NetworkGraph,
    compacted: &'g mut CompactedGraph,
    inserted: Vec<Phantom>,
}

impl<'g> PhantomScope<'g> {
    pub fn new(network: &'g NetworkGraph, compacted: &'g mut CompactedGraph) -> Self {
        Self {
            network,
            compacted,
            inserted: Vec::new(),
        }
    }

    pub fn graph(&self) -> &CompactedGraph {
        self.compacted
    }

    /// Splice `key` into the compacted graph.
    ///
    /// Returns `false` when `key` is already present (a junction or an
    /// earlier phantom); nothing is changed and nothing will be removed for it.
    /// The chains of `key` are computed against the current compacted graph,
    /// so a second phantom on the same chain as the first attaches to it.
    pub fn insert(&mut self, key: VertexKey) -> bool {
        if self.compacted.contains(&key) || !self.network.contains(&key) {
            return false;
        }

        let compacted = &*self.compacted;
        let node = compact_node(key, self.network, |k| compacted.contains(k), true);

        let mut incoming = Vec::with_capacity(node.incoming_edges.len());
        for (neighbour, weight) in node.incoming_edges {
            let Some(edges) = self.compacted.vertices.get_mut(&neighbour) else {
                continue;
            };
            edges.insert(key, weight);

            if let Some(trace) = node.incoming_coordinates.get(&neighbour) {
                self.compacted
                    .coordinates
                    .entry(neighbour)
                    .or_default()
                    .insert(key, trace.clone());
            }
            if let Some(all_edges) = self.compacted.edges.as_mut() {
                let ids = node
                    .incoming_reduced_edges
                    .get(&neighbour)
                    .cloned()
                    .unwrap_or_default();
                all_edges.entry(neighbour).or_default().insert(key, ids);
            }
            incoming.push(neighbour);
        }

        self.compacted.vertices.insert(key, node.edges);
        self.compacted.coordinates.insert(key, node.coordinates);
        if let Some(all_edges) = self.compacted.edges.as_mut() {
            all_edges.insert(key, node.reduced_edges);
        }

        trace!("Inserted phantom {} with {} incoming chains", key, incoming.len());
        self.inserted.push(Phantom { key, incoming });
        true
    }

    fn remove(&mut self, phantom: Phantom) {
        let Phantom { key, incoming } = phantom;

        for neighbour in &incoming {
            if let Some(edges) = self.compacted.vertices.get_mut(neighbour) {
                edges.remove(&key);
            }
            if let Some(trace) = self.compacted.coordinates.get_mut(neighbour) {
                trace.remove(&key);
            }
            if let Some(ids) = self
                .compacted
                .edges
                .as_mut()
                .and_then(|e| e.get_mut(neighbour))
            {
                ids.remove(&key);
            }
        }

        self.compacted.vertices.remove(&key);
        self.compacted.coordinates.remove(&key);
        if let Some(all_edges) = self.compacted.edges.as_mut() {
            all_edges.remove(&key);
        }

        trace!("Removed phantom {}", key);
    }
}

impl Drop for PhantomScope<'_> {
    fn drop(&mut self) {
        // Last in, first out: a later phantom may point at an earlier one.
        while let Some(phantom) = self.inserted.pop() {
            self.remove(phantom);
        }

        if cfg!(debug_assertions) && !self.compacted.is_consistent() {
            error!("Compacted graph left inconsistent after phantom removal");
        }
    }
}
