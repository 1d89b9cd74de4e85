use super::graph::Adjacency;
use crate::vertex_key::VertexKey;
use ahash::AHashMap as HashMap;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(super) struct State {
    pub cost: OrderedFloat<f64>,
    pub node: VertexKey,
}

// Min-heap on cost. Equal costs pop the smaller key first, which makes every
// search over the same graph settle vertices in the same order.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest path from `start` to `finish` over a compacted graph.
///
/// Weights must be non-negative. Returns the total weight and the visited
/// keys, both endpoints included, or `None` when `finish` cannot be reached.
///
/// Ties: vertices with equal tentative cost settle in ascending key order and
/// a predecessor is only replaced by a strictly cheaper one, so among equally
/// cheap paths the one through the earliest settled vertices wins.
pub fn shortest_path(
    graph: &Adjacency<f64>,
    start: VertexKey,
    finish: VertexKey,
) -> Option<(f64, Vec<VertexKey>)> {
    let mut dist: HashMap<VertexKey, f64> = HashMap::new();
    let mut prev: HashMap<VertexKey, VertexKey> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(start, 0.0);
    heap.push(State {
        cost: OrderedFloat(0.0),
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        let cost = cost.into_inner();

        if node == finish {
            let mut path = vec![finish];
            let mut current = finish;
            while let Some(&p) = prev.get(&current) {
                path.push(p);
                current = p;
            }
            path.reverse();
            return Some((cost, path));
        }

        // Stale entry, a cheaper one was already settled.
        if cost > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }

        let Some(neighbours) = graph.get(&node) else {
            continue;
        };

        for (&next, &weight) in neighbours {
            let next_cost = cost + weight;
            if next_cost < *dist.get(&next).unwrap_or(&f64::INFINITY) {
                dist.insert(next, next_cost);
                prev.insert(next, node);
                heap.push(State {
                    cost: OrderedFloat(next_cost),
                    node: next,
                });
            }
        }
    }

    None
}
