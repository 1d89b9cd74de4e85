// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

//! Shortest paths and isochrones over line networks (roads, trails, tracks)
//! for query points that need not be junctions.
//!
//! The network is compacted once: chains of degree-2 vertices collapse into
//! single junction-to-junction edges. Query endpoints lying mid-chain are
//! spliced in as phantom vertices for the duration of one query.

pub mod config;
pub mod error;
pub mod hull;
pub mod pathfinder;
pub mod routing_common;
pub mod snapshot;
pub mod vertex_key;
pub mod weight_functions;

pub use config::PathFinderOptions;
pub use error::PathFinderError;
pub use pathfinder::{PathFinder, PathResult};
pub use routing_common::graph::{EdgeId, GraphSnapshot};
pub use vertex_key::VertexKey;
