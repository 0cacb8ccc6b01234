//! Read-only measurements answered locally, without the solver.

use crate::render::RenderAdapter;
use crate::scene::{EntityId, Scene};
use kurbo::{Point, Vec2};
use std::fmt;

/// A locally computed measurement, surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryResult {
    /// Acute angle between two lines, in degrees.
    Angle(f64),
    /// Euclidean distance between two points.
    Distance(f64),
}

impl QueryResult {
    /// The raw, unrounded value.
    pub fn value(self) -> f64 {
        match self {
            QueryResult::Angle(v) | QueryResult::Distance(v) => v,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.value())
    }
}

/// Angle in degrees, folded into `[0, 90]`, between two direction vectors.
///
/// Returns `None` if either vector has zero length.
pub fn angle_between_directions(a: Vec2, b: Vec2) -> Option<f64> {
    let norms = a.hypot() * b.hypot();
    if norms == 0.0 {
        return None;
    }
    let cos = (a.dot(b) / norms).clamp(-1.0, 1.0);
    let theta = cos.acos().to_degrees();
    Some(if theta <= 90.0 { theta } else { 180.0 - theta })
}

/// Angle between two lines of the scene.
pub fn angle_between<R: RenderAdapter>(scene: &Scene<R>, a: EntityId, b: EntityId) -> Option<f64> {
    let [a0, a1] = scene.line_endpoints(a)?;
    let [b0, b1] = scene.line_endpoints(b)?;
    angle_between_directions(a1 - a0, b1 - b0)
}

/// Distance between two points of the scene.
pub fn distance_between<R: RenderAdapter>(scene: &Scene<R>, a: EntityId, b: EntityId) -> Option<f64> {
    let a = scene.point(a)?.position;
    let b = scene.point(b)?.position;
    Some(distance(a, b))
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}
