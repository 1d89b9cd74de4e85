use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathFinderError {
    #[error("Compacted graph contains no junctions (topology has no intersections or dead ends)")]
    NoJunctions,
    #[error("Edge id tracking differs between the full graph and the compacted graph")]
    InconsistentEdgeTracking,
    #[error("Invalid graph snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("Coordinate precision must be finite and positive, got {0}")]
    InvalidPrecision(f64),
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode graph snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("Failed to decode graph snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Failed to parse options: {0}")]
    Config(#[from] ron::error::SpannedError),
}
