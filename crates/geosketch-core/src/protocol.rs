//! Wire protocol between the editor and the remote solver.
//!
//! Outbound frames are `{"operation": <tag>, "data": <payload>}` text frames,
//! one per completed gesture. Inbound frames carry authoritative positions.

use crate::scene::EntityId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A position as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for WirePoint {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<WirePoint> for Point {
    fn from(p: WirePoint) -> Self {
        Point::new(p.x, p.y)
    }
}

/// Reference to a point in a `connect_points` intent.
///
/// Endpoints are addressed by their owning line plus vertex index; free
/// points by their own id with no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRef {
    pub uid: EntityId,
    #[serde(rename = "pointNum", default, skip_serializing_if = "Option::is_none")]
    pub point_num: Option<usize>,
}

/// Editing intent sent to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "data", rename_all = "snake_case")]
pub enum Intent {
    CreatePoint {
        uid: EntityId,
        point: WirePoint,
    },
    CreateLine {
        uid: EntityId,
        point1: WirePoint,
        point2: WirePoint,
    },
    DragPoint {
        uid: EntityId,
        point: WirePoint,
    },
    DragLine {
        uid: EntityId,
        point1: WirePoint,
        point2: WirePoint,
    },
    Vertical {
        uid: EntityId,
    },
    Horizontal {
        uid: EntityId,
    },
    Parallel {
        uid1: EntityId,
        uid2: EntityId,
    },
    Perpendicular {
        uid1: EntityId,
        uid2: EntityId,
    },
    ConnectPoints {
        point1: PointRef,
        point2: PointRef,
    },
    AttachPointToLine {
        /// The point.
        uid1: EntityId,
        /// The line.
        uid2: EntityId,
    },
    AngleBetweenLines {
        uid1: EntityId,
        uid2: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle: Option<f64>,
    },
    #[serde(rename = "dist_between_points")]
    DistanceBetweenPoints {
        uid1: EntityId,
        uid2: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dist: Option<f64>,
    },
}

impl Intent {
    /// The `operation` tag of this intent.
    pub fn operation(&self) -> &'static str {
        match self {
            Intent::CreatePoint { .. } => "create_point",
            Intent::CreateLine { .. } => "create_line",
            Intent::DragPoint { .. } => "drag_point",
            Intent::DragLine { .. } => "drag_line",
            Intent::Vertical { .. } => "vertical",
            Intent::Horizontal { .. } => "horizontal",
            Intent::Parallel { .. } => "parallel",
            Intent::Perpendicular { .. } => "perpendicular",
            Intent::ConnectPoints { .. } => "connect_points",
            Intent::AttachPointToLine { .. } => "attach_point_to_line",
            Intent::AngleBetweenLines { .. } => "angle_between_lines",
            Intent::DistanceBetweenPoints { .. } => "dist_between_points",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Authoritative position of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointUpdate {
    pub uid: EntityId,
    pub x: f64,
    pub y: f64,
}

/// Authoritative positions of both endpoints of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub uid: EntityId,
    pub point1: WirePoint,
    pub point2: WirePoint,
}

/// Coordinates returned by the solver. Fields the solver omits are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<LineUpdate>,
}

impl SolverUpdate {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty()
    }
}
