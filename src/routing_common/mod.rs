pub mod compactor;
pub mod dijkstra;
pub mod graph;
pub mod isochrone;
pub mod phantom;
pub mod preprocess;

#[cfg(test)]
mod graph_tests;
