use geo::{ConcaveHull, ConvexHull};
use geo_types::{Coord, MultiPoint, Point, Polygon};

fn unique_points(points: &[Coord<f64>]) -> Vec<Point<f64>> {
    let mut unique: Vec<Coord<f64>> = points
        .iter()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .copied()
        .collect();
    unique.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    unique.dedup();
    unique.into_iter().map(Point::from).collect()
}

/// Convex hull of a reached point set. Fewer than three distinct points do
/// not enclose an area and yield `None`.
pub fn convex_hull(points: &[Coord<f64>]) -> Option<Polygon<f64>> {
    let points = unique_points(points);
    if points.len() < 3 {
        return None;
    }
    Some(MultiPoint(points).convex_hull())
}

/// Concave hull of a reached point set.
///
/// `concavity` is passed straight to geo: larger values approach the convex
/// hull, values near zero follow the points closely.
pub fn concave_hull(points: &[Coord<f64>], concavity: f64) -> Option<Polygon<f64>> {
    let points = unique_points(points);
    if points.len() < 3 {
        return None;
    }
    Some(MultiPoint(points).concave_hull(concavity))
}
