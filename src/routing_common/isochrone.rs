use super::dijkstra::State;
use super::graph::Adjacency;
use crate::vertex_key::VertexKey;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BinaryHeap};

/// Every vertex reachable from `start` with a cumulative cost of at most
/// `max_cost`, mapped to that cost. `start` is always present with cost 0.
///
/// Costs are shortest-path costs, so raising `max_cost` only ever adds
/// vertices; the cost reported for a vertex never changes.
pub fn reachable_set(
    graph: &Adjacency<f64>,
    start: VertexKey,
    max_cost: f64,
) -> BTreeMap<VertexKey, f64> {
    let mut costs = BTreeMap::new();
    let mut heap = BinaryHeap::new();

    costs.insert(start, 0.0);
    heap.push(State {
        cost: OrderedFloat(0.0),
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        let cost = cost.into_inner();
        if cost > *costs.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }

        let Some(neighbours) = graph.get(&node) else {
            continue;
        };

        for (&next, &weight) in neighbours {
            let next_cost = cost + weight;
            if next_cost <= max_cost && next_cost < *costs.get(&next).unwrap_or(&f64::INFINITY) {
                costs.insert(next, next_cost);
                heap.push(State {
                    cost: OrderedFloat(next_cost),
                    node: next,
                });
            }
        }
    }

    costs
}
