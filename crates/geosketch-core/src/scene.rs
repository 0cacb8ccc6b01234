//! Scene store: the points and lines of the diagram.
//!
//! The scene owns its [`RenderAdapter`] so that every mutation is pushed to
//! the drawing surface before the mutating call returns.

use crate::render::RenderAdapter;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Identifier shared by points, endpoints and lines.
pub type EntityId = Uuid;

/// Scene errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// What a point is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    /// A free-standing point.
    Free,
    /// One of the two terminal vertices of a line.
    EndPoint {
        /// The owning line.
        line: EntityId,
        /// Which vertex of the line (0 or 1).
        segment: usize,
    },
}

/// A point in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub(crate) id: EntityId,
    /// Committed position.
    pub position: Point,
    pub kind: PointKind,
    /// Transient selection highlight.
    pub highlighted: bool,
}

impl ScenePoint {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_endpoint(&self) -> bool {
        matches!(self.kind, PointKind::EndPoint { .. })
    }

    /// Owning line and vertex index, for endpoints.
    pub fn owner(&self) -> Option<(EntityId, usize)> {
        match self.kind {
            PointKind::EndPoint { line, segment } => Some((line, segment)),
            PointKind::Free => None,
        }
    }
}

/// A line segment. Its geometry lives in its two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneLine {
    pub(crate) id: EntityId,
    /// Endpoint ids, indexed by segment index.
    pub endpoints: [EntityId; 2],
    /// Transient selection highlight.
    pub highlighted: bool,
}

impl SceneLine {
    pub fn id(&self) -> EntityId {
        self.id
    }
}

/// Borrowed view of any scene entity.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Point(&'a ScenePoint),
    Line(&'a SceneLine),
}

/// The complete set of points and lines.
#[derive(Debug)]
pub struct Scene<R: RenderAdapter> {
    points: HashMap<EntityId, ScenePoint>,
    /// Point ids in creation order. Hit-testing depends on this order.
    point_order: Vec<EntityId>,
    lines: HashMap<EntityId, SceneLine>,
    /// Line ids in creation order.
    line_order: Vec<EntityId>,
    renderer: R,
}

impl<R: RenderAdapter + Default> Default for Scene<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: RenderAdapter> Scene<R> {
    /// Create an empty scene drawing onto `renderer`.
    pub fn new(renderer: R) -> Self {
        Self {
            points: HashMap::new(),
            point_order: Vec::new(),
            lines: HashMap::new(),
            line_order: Vec::new(),
            renderer,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Create a free point and draw its marker.
    pub fn create_point(&mut self, position: Point) -> EntityId {
        let id = Uuid::new_v4();
        self.insert_point(ScenePoint {
            id,
            position,
            kind: PointKind::Free,
            highlighted: false,
        });
        self.renderer.add_point_marker(id, position);
        id
    }

    /// Create a line with two new endpoints. Returns `(line, endpoint0, endpoint1)`.
    pub fn create_line(&mut self, start: Point, end: Point) -> (EntityId, EntityId, EntityId) {
        let line = Uuid::new_v4();
        let endpoints = [Uuid::new_v4(), Uuid::new_v4()];

        self.lines.insert(
            line,
            SceneLine {
                id: line,
                endpoints,
                highlighted: false,
            },
        );
        self.line_order.push(line);
        for (segment, (&id, position)) in endpoints.iter().zip([start, end]).enumerate() {
            self.insert_point(ScenePoint {
                id,
                position,
                kind: PointKind::EndPoint { line, segment },
                highlighted: false,
            });
        }

        self.renderer.add_segment(line, start, end);
        self.renderer.add_point_marker(endpoints[0], start);
        self.renderer.add_point_marker(endpoints[1], end);
        (line, endpoints[0], endpoints[1])
    }

    fn insert_point(&mut self, point: ScenePoint) {
        self.point_order.push(point.id);
        self.points.insert(point.id, point);
    }

    /// Commit a new position for a point or endpoint.
    ///
    /// Moving an endpoint moves only that vertex of its line, never the sibling.
    pub fn set_position(&mut self, id: EntityId, position: Point) -> SceneResult<()> {
        let point = self.points.get_mut(&id).ok_or(SceneError::UnknownEntity(id))?;
        point.position = position;
        let owner = point.owner();
        self.push_position(id, owner, position);
        Ok(())
    }

    /// Move a point on the drawing surface only, leaving the scene untouched.
    pub fn preview_position(&mut self, id: EntityId, position: Point) -> SceneResult<()> {
        let owner = self.point(id).ok_or(SceneError::UnknownEntity(id))?.owner();
        self.push_position(id, owner, position);
        Ok(())
    }

    /// Push the committed position of a point back to the drawing surface.
    pub fn revert_preview(&mut self, id: EntityId) -> SceneResult<()> {
        let point = self.point(id).ok_or(SceneError::UnknownEntity(id))?;
        let (owner, position) = (point.owner(), point.position);
        self.push_position(id, owner, position);
        Ok(())
    }

    fn push_position(&mut self, id: EntityId, owner: Option<(EntityId, usize)>, position: Point) {
        self.renderer.move_point_marker(id, position);
        if let Some((line, segment)) = owner {
            self.renderer.move_segment_vertex(line, segment, position);
        }
    }

    /// Set or clear the highlight flag of a point or line.
    pub fn set_highlighted(&mut self, id: EntityId, highlighted: bool) -> SceneResult<()> {
        if let Some(point) = self.points.get_mut(&id) {
            point.highlighted = highlighted;
        } else if let Some(line) = self.lines.get_mut(&id) {
            line.highlighted = highlighted;
        } else {
            return Err(SceneError::UnknownEntity(id));
        }
        self.renderer.set_highlighted(id, highlighted);
        Ok(())
    }

    /// Look up any entity.
    pub fn get(&self, id: EntityId) -> Option<Entity<'_>> {
        self.points
            .get(&id)
            .map(Entity::Point)
            .or_else(|| self.lines.get(&id).map(Entity::Line))
    }

    pub fn point(&self, id: EntityId) -> Option<&ScenePoint> {
        self.points.get(&id)
    }

    pub fn line(&self, id: EntityId) -> Option<&SceneLine> {
        self.lines.get(&id)
    }

    /// Current positions of a line's two endpoints.
    pub fn line_endpoints(&self, id: EntityId) -> Option<[Point; 2]> {
        let line = self.lines.get(&id)?;
        let start = self.points.get(&line.endpoints[0])?.position;
        let end = self.points.get(&line.endpoints[1])?.position;
        Some([start, end])
    }

    /// All points (free and endpoints) in creation order.
    pub fn points(&self) -> impl Iterator<Item = &ScenePoint> + '_ {
        self.point_order.iter().filter_map(|id| self.points.get(id))
    }

    /// All lines in creation order.
    pub fn lines(&self) -> impl Iterator<Item = &SceneLine> + '_ {
        self.line_order.iter().filter_map(|id| self.lines.get(id))
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty()
    }
}
