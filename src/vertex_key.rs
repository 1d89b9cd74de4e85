use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a network vertex.
///
/// A coordinate is snapped onto a grid of `precision` sized cells and the key
/// stores the integer cell indices. Two coordinates denote the same physical
/// vertex iff they round to the same key, so there is no dependence on float
/// formatting (trailing zeros, locale, exponent notation).
///
/// Keys order lexicographically by `(x, y)`. That ordering is the tie-break
/// used throughout the search code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexKey {
    pub x: i64,
    pub y: i64,
}

impl VertexKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Snap a coordinate onto the grid. `precision` must be finite and positive,
    /// which `PathFinderOptions::validate` guarantees for every caller in this crate.
    pub fn from_coord(coord: Coord<f64>, precision: f64) -> Self {
        Self {
            x: (coord.x / precision).round() as i64,
            y: (coord.y / precision).round() as i64,
        }
    }

    /// The rounded coordinate this key stands for.
    pub fn to_coord(self, precision: f64) -> Coord<f64> {
        Coord {
            x: self.x as f64 * precision,
            y: self.y as f64 * precision,
        }
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Round a coordinate the same way vertex keys are derived.
pub fn round_coord(coord: Coord<f64>, precision: f64) -> Coord<f64> {
    VertexKey::from_coord(coord, precision).to_coord(precision)
}
