// Binary persistence of routing graphs.
//
// Snapshots are bincode (serde flavour, standard config), the same encoding
// the routing partitions are stored with.

use crate::error::PathFinderError;
use crate::routing_common::graph::GraphSnapshot;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

pub fn encode_snapshot(snapshot: &GraphSnapshot) -> Result<Vec<u8>, PathFinderError> {
    let config = bincode::config::standard();
    Ok(bincode::serde::encode_to_vec(snapshot, config)?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<GraphSnapshot, PathFinderError> {
    let config = bincode::config::standard();
    let (snapshot, _): (GraphSnapshot, usize) = bincode::serde::decode_from_slice(bytes, config)?;
    Ok(snapshot)
}

pub fn save_snapshot(snapshot: &GraphSnapshot, path: impl AsRef<Path>) -> Result<(), PathFinderError> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| PathFinderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let payload = encode_snapshot(snapshot)?;
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&payload).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!("Wrote {} byte graph snapshot to {}", payload.len(), path.display());
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<GraphSnapshot, PathFinderError> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| PathFinderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).map_err(io_err)?;

    decode_snapshot(&buffer)
}
