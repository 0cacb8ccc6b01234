//! Render adapter abstraction.
//!
//! The drawing surface is retained-mode: the core pushes primitive
//! create/move/highlight operations and never reads geometry back.

use crate::scene::EntityId;
use kurbo::Point;

/// Retained-mode drawing surface driven by the scene and the tools.
pub trait RenderAdapter {
    /// Create the marker primitive for a point.
    fn add_point_marker(&mut self, id: EntityId, at: Point);

    /// Move an existing point marker.
    fn move_point_marker(&mut self, id: EntityId, at: Point);

    /// Create the segment primitive for a line.
    fn add_segment(&mut self, line: EntityId, start: Point, end: Point);

    /// Move one vertex (0 or 1) of a line segment.
    fn move_segment_vertex(&mut self, line: EntityId, index: usize, at: Point);

    /// Toggle the selection highlight of a point marker or line segment.
    fn set_highlighted(&mut self, id: EntityId, highlighted: bool);

    /// Show (or update) the provisional line drawn during a Line gesture.
    fn show_preview_line(&mut self, start: Point, end: Point);

    /// Remove the provisional line, if any.
    fn clear_preview_line(&mut self);
}

/// Renderer that draws nothing. Useful for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RenderAdapter for NullRenderer {
    fn add_point_marker(&mut self, _id: EntityId, _at: Point) {}
    fn move_point_marker(&mut self, _id: EntityId, _at: Point) {}
    fn add_segment(&mut self, _line: EntityId, _start: Point, _end: Point) {}
    fn move_segment_vertex(&mut self, _line: EntityId, _index: usize, _at: Point) {}
    fn set_highlighted(&mut self, _id: EntityId, _highlighted: bool) {}
    fn show_preview_line(&mut self, _start: Point, _end: Point) {}
    fn clear_preview_line(&mut self) {}
}
