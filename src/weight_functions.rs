//! Edge cost functions used while building the full graph.

use geo::{Distance, Haversine};
use geo_types::{Coord, Point};
use geojson::JsonObject;

/// Cost of one input segment in each direction.
///
/// `None` means the segment cannot be traversed in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeWeight {
    pub forward: Option<f64>,
    pub backward: Option<f64>,
}

impl EdgeWeight {
    pub fn both(weight: f64) -> Self {
        Self {
            forward: Some(weight),
            backward: Some(weight),
        }
    }

    pub fn forward_only(weight: f64) -> Self {
        Self {
            forward: Some(weight),
            backward: None,
        }
    }

    /// Drop directions whose cost is unusable for a non-negative search.
    pub fn sanitized(self) -> Self {
        let usable = |w: Option<f64>| w.filter(|w| w.is_finite() && *w > 0.0);
        Self {
            forward: usable(self.forward),
            backward: usable(self.backward),
        }
    }

    pub fn is_traversable(&self) -> bool {
        self.forward.is_some() || self.backward.is_some()
    }
}

pub trait WeightFunction {
    /// Cost of travelling the segment `from -> to`, given the properties of
    /// the feature the segment belongs to.
    fn weight(&self, from: Coord<f64>, to: Coord<f64>, properties: Option<&JsonObject>)
    -> EdgeWeight;
}

impl<F> WeightFunction for F
where
    F: Fn(Coord<f64>, Coord<f64>, Option<&JsonObject>) -> EdgeWeight,
{
    fn weight(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        properties: Option<&JsonObject>,
    ) -> EdgeWeight {
        self(from, to, properties)
    }
}

/// Great circle length of the segment in metres, same cost both ways.
/// Coordinates are (lon, lat).
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl WeightFunction for HaversineDistance {
    fn weight(&self, from: Coord<f64>, to: Coord<f64>, _: Option<&JsonObject>) -> EdgeWeight {
        EdgeWeight::both(haversine_distance(from, to))
    }
}

/// Planar length of the segment in coordinate units, same cost both ways.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl WeightFunction for EuclideanDistance {
    fn weight(&self, from: Coord<f64>, to: Coord<f64>, _: Option<&JsonObject>) -> EdgeWeight {
        EdgeWeight::both((to.x - from.x).hypot(to.y - from.y))
    }
}

pub fn haversine_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}
