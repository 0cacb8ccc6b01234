//! Tool system: turns pointer gestures into scene edits and solver intents.

mod pair;

pub use pair::{PairKind, PairSelection, Pick};

use crate::config::EditorConfig;
use crate::hit_test::{find_line, find_point};
use crate::measure::QueryResult;
use crate::protocol::Intent;
use crate::render::RenderAdapter;
use crate::scene::{EntityId, Scene};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available tools, identified on the wire and in the shell by their tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Point,
    Line,
    Drag,
    Vertical,
    Horizontal,
    Connect,
    Parallel,
    Perpendicular,
    AttachPointToLine,
    AngleBetweenLines,
    #[serde(rename = "dist_between_points")]
    DistanceBetweenPoints,
    GetAngleBetweenLines,
    #[serde(rename = "get_dist_between_points")]
    GetDistanceBetweenPoints,
}

impl ToolKind {
    pub const ALL: [ToolKind; 13] = [
        ToolKind::Point,
        ToolKind::Line,
        ToolKind::Drag,
        ToolKind::Vertical,
        ToolKind::Horizontal,
        ToolKind::Connect,
        ToolKind::Parallel,
        ToolKind::Perpendicular,
        ToolKind::AttachPointToLine,
        ToolKind::AngleBetweenLines,
        ToolKind::DistanceBetweenPoints,
        ToolKind::GetAngleBetweenLines,
        ToolKind::GetDistanceBetweenPoints,
    ];

    /// Shell tag for this tool.
    pub fn tag(self) -> &'static str {
        match self {
            ToolKind::Point => "point",
            ToolKind::Line => "line",
            ToolKind::Drag => "drag",
            ToolKind::Vertical => "vertical",
            ToolKind::Horizontal => "horizontal",
            ToolKind::Connect => "connect",
            ToolKind::Parallel => "parallel",
            ToolKind::Perpendicular => "perpendicular",
            ToolKind::AttachPointToLine => "attach_point_to_line",
            ToolKind::AngleBetweenLines => "angle_between_lines",
            ToolKind::DistanceBetweenPoints => "dist_between_points",
            ToolKind::GetAngleBetweenLines => "get_angle_between_lines",
            ToolKind::GetDistanceBetweenPoints => "get_dist_between_points",
        }
    }

    /// Whether the tool consumes the numeric input value.
    pub fn uses_input_value(self) -> bool {
        matches!(self, ToolKind::AngleBetweenLines | ToolKind::DistanceBetweenPoints)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A tool tag that names no tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolKind {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// What a completed gesture produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// An editing intent for the solver.
    Intent(Intent),
    /// A local measurement for the UI.
    Query(QueryResult),
}

/// Everything a tool may touch while handling one pointer event.
pub(crate) struct ToolContext<'a, R: RenderAdapter> {
    pub scene: &'a mut Scene<R>,
    pub config: &'a EditorConfig,
    pub input_value: Option<f64>,
}

impl<R: RenderAdapter> ToolContext<'_, R> {
    pub fn highlight(&mut self, id: EntityId, on: bool) {
        if let Err(e) = self.scene.set_highlighted(id, on) {
            log::error!("Highlight of stale selection: {e}");
        }
    }
}

/// Provisional line of an in-progress Line gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDraft {
    pub start: Point,
    pub end: Point,
}

impl LineDraft {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Point captured by an in-progress Drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTarget {
    pub id: EntityId,
    /// Last position shown on the surface.
    pub current: Point,
}

/// The active tool together with its per-gesture state.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Point,
    Line { draft: Option<LineDraft> },
    Drag { target: Option<DragTarget> },
    Vertical,
    Horizontal,
    Pair(PairSelection),
}

impl Tool {
    /// A fresh tool with no gesture state.
    pub fn new(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Point => Tool::Point,
            ToolKind::Line => Tool::Line { draft: None },
            ToolKind::Drag => Tool::Drag { target: None },
            ToolKind::Vertical => Tool::Vertical,
            ToolKind::Horizontal => Tool::Horizontal,
            ToolKind::Connect => Tool::Pair(PairSelection::new(PairKind::Connect)),
            ToolKind::Parallel => Tool::Pair(PairSelection::new(PairKind::Parallel)),
            ToolKind::Perpendicular => Tool::Pair(PairSelection::new(PairKind::Perpendicular)),
            ToolKind::AttachPointToLine => Tool::Pair(PairSelection::new(PairKind::AttachPointToLine)),
            ToolKind::AngleBetweenLines => Tool::Pair(PairSelection::new(PairKind::SetAngle)),
            ToolKind::DistanceBetweenPoints => Tool::Pair(PairSelection::new(PairKind::SetDistance)),
            ToolKind::GetAngleBetweenLines => Tool::Pair(PairSelection::new(PairKind::GetAngle)),
            ToolKind::GetDistanceBetweenPoints => Tool::Pair(PairSelection::new(PairKind::GetDistance)),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::Point => ToolKind::Point,
            Tool::Line { .. } => ToolKind::Line,
            Tool::Drag { .. } => ToolKind::Drag,
            Tool::Vertical => ToolKind::Vertical,
            Tool::Horizontal => ToolKind::Horizontal,
            Tool::Pair(selection) => match selection.kind {
                PairKind::Connect => ToolKind::Connect,
                PairKind::Parallel => ToolKind::Parallel,
                PairKind::Perpendicular => ToolKind::Perpendicular,
                PairKind::AttachPointToLine => ToolKind::AttachPointToLine,
                PairKind::SetAngle => ToolKind::AngleBetweenLines,
                PairKind::SetDistance => ToolKind::DistanceBetweenPoints,
                PairKind::GetAngle => ToolKind::GetAngleBetweenLines,
                PairKind::GetDistance => ToolKind::GetDistanceBetweenPoints,
            },
        }
    }

    pub(crate) fn on_press<R: RenderAdapter>(
        &mut self,
        ctx: &mut ToolContext<'_, R>,
        position: Point,
    ) -> Option<ToolOutput> {
        let radius = ctx.config.hit_radius_px;
        match self {
            Tool::Point => {
                let uid = ctx.scene.create_point(position);
                Some(ToolOutput::Intent(Intent::CreatePoint {
                    uid,
                    point: position.into(),
                }))
            }
            Tool::Line { draft } => {
                ctx.scene.renderer_mut().show_preview_line(position, position);
                *draft = Some(LineDraft {
                    start: position,
                    end: position,
                });
                None
            }
            Tool::Drag { target } => {
                *target = find_point(ctx.scene, position, radius, false).and_then(|id| {
                    let current = ctx.scene.point(id)?.position;
                    Some(DragTarget { id, current })
                });
                None
            }
            Tool::Vertical => {
                let uid = find_line(ctx.scene, position, radius)?;
                Some(ToolOutput::Intent(Intent::Vertical { uid }))
            }
            Tool::Horizontal => {
                let uid = find_line(ctx.scene, position, radius)?;
                Some(ToolOutput::Intent(Intent::Horizontal { uid }))
            }
            Tool::Pair(selection) => selection.on_press(ctx, position),
        }
    }

    pub(crate) fn on_drag<R: RenderAdapter>(&mut self, ctx: &mut ToolContext<'_, R>, position: Point) {
        match self {
            Tool::Line { draft: Some(draft) } => {
                draft.end = position;
                ctx.scene.renderer_mut().show_preview_line(draft.start, draft.end);
            }
            Tool::Drag { target: Some(target) } => {
                target.current = position;
                if let Err(e) = ctx.scene.preview_position(target.id, position) {
                    log::error!("Drag target vanished: {e}");
                }
            }
            _ => {}
        }
    }

    pub(crate) fn on_release<R: RenderAdapter>(
        &mut self,
        ctx: &mut ToolContext<'_, R>,
        position: Point,
    ) -> Option<ToolOutput> {
        match self {
            Tool::Line { draft } => {
                let draft = draft.take()?;
                ctx.scene.renderer_mut().clear_preview_line();
                if draft.length() < ctx.config.min_line_length_px {
                    log::debug!("Discarding line shorter than {}px", ctx.config.min_line_length_px);
                    return None;
                }
                let (uid, _, _) = ctx.scene.create_line(draft.start, draft.end);
                Some(ToolOutput::Intent(Intent::CreateLine {
                    uid,
                    point1: draft.start.into(),
                    point2: draft.end.into(),
                }))
            }
            Tool::Drag { target } => {
                let target = target.take()?;
                if let Err(e) = ctx.scene.set_position(target.id, position) {
                    log::error!("Drag target vanished: {e}");
                    return None;
                }
                let owner = ctx.scene.point(target.id)?.owner();
                let intent = match owner {
                    None => Intent::DragPoint {
                        uid: target.id,
                        point: position.into(),
                    },
                    Some((line, _)) => {
                        let [start, end] = ctx.scene.line_endpoints(line)?;
                        Intent::DragLine {
                            uid: line,
                            point1: start.into(),
                            point2: end.into(),
                        }
                    }
                };
                Some(ToolOutput::Intent(intent))
            }
            _ => None,
        }
    }

    /// Abandon the current gesture, removing anything it drew provisionally.
    pub(crate) fn cancel<R: RenderAdapter>(&mut self, ctx: &mut ToolContext<'_, R>) {
        match self {
            Tool::Line { draft } => {
                if draft.take().is_some() {
                    ctx.scene.renderer_mut().clear_preview_line();
                }
            }
            Tool::Drag { target } => {
                if let Some(target) = target.take() {
                    if let Err(e) = ctx.scene.revert_preview(target.id) {
                        log::error!("Drag target vanished: {e}");
                    }
                }
            }
            Tool::Pair(selection) => selection.clear(ctx),
            Tool::Point | Tool::Vertical | Tool::Horizontal => {}
        }
    }
}

/// Owns the active tool.
#[derive(Debug, Clone)]
pub struct ToolManager {
    tool: Tool,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolManager {
    /// Start with the default tool.
    pub fn new() -> Self {
        Self {
            tool: Tool::new(ToolKind::default()),
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Switch tools, rolling back the current gesture.
    ///
    /// Returns `false` if `kind` is already active, in which case nothing changes.
    pub(crate) fn set_tool<R: RenderAdapter>(&mut self, kind: ToolKind, ctx: &mut ToolContext<'_, R>) -> bool {
        if self.tool.kind() == kind {
            return false;
        }
        self.tool.cancel(ctx);
        self.tool = Tool::new(kind);
        log::debug!("Tool switched to {kind}");
        true
    }

    pub(crate) fn press<R: RenderAdapter>(
        &mut self,
        ctx: &mut ToolContext<'_, R>,
        position: Point,
    ) -> Option<ToolOutput> {
        self.tool.on_press(ctx, position)
    }

    pub(crate) fn drag<R: RenderAdapter>(&mut self, ctx: &mut ToolContext<'_, R>, position: Point) {
        self.tool.on_drag(ctx, position);
    }

    pub(crate) fn release<R: RenderAdapter>(
        &mut self,
        ctx: &mut ToolContext<'_, R>,
        position: Point,
    ) -> Option<ToolOutput> {
        self.tool.on_release(ctx, position)
    }

    /// Whether a press/drag gesture is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self.tool,
            Tool::Line { draft: Some(_) } | Tool::Drag { target: Some(_) }
        )
    }
}
