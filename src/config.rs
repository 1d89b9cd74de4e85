use crate::error::PathFinderError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PRECISION: f64 = 1e-5;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PathFinderOptions {
    /// Grid size used to round coordinates into vertex keys, in coordinate units.
    pub precision: f64,
    // When false every vertex is kept as a junction.
    pub compact: bool,
    /// Record which input feature every segment came from, so paths can
    /// report the original edges they traverse.
    pub track_edge_ids: bool,
}

impl Default for PathFinderOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            compact: true,
            track_edge_ids: false,
        }
    }
}

impl PathFinderOptions {
    pub fn from_ron_str(s: &str) -> Result<Self, PathFinderError> {
        let options: PathFinderOptions = ron::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self, PathFinderError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| PathFinderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    pub fn validate(&self) -> Result<(), PathFinderError> {
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(PathFinderError::InvalidPrecision(self.precision));
        }
        Ok(())
    }
}
