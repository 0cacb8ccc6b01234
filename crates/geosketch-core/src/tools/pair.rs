//! Two-slot selection shared by the relational and measuring tools.

use super::{ToolContext, ToolOutput};
use crate::hit_test::{find_line, find_point};
use crate::measure::{self, QueryResult};
use crate::protocol::{Intent, PointRef};
use crate::render::RenderAdapter;
use crate::scene::{EntityId, PointKind};
use kurbo::Point;

/// What a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Any point, free or endpoint.
    Point,
    /// Endpoints only.
    EndPoint,
    Line,
}

/// The tools driven by a pair selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    Connect,
    Parallel,
    Perpendicular,
    AttachPointToLine,
    SetAngle,
    SetDistance,
    GetAngle,
    GetDistance,
}

impl PairKind {
    /// Accepted target for slot A.
    pub fn first_pick(self) -> Pick {
        match self {
            PairKind::Connect => Pick::EndPoint,
            PairKind::AttachPointToLine | PairKind::SetDistance | PairKind::GetDistance => Pick::Point,
            PairKind::Parallel | PairKind::Perpendicular | PairKind::SetAngle | PairKind::GetAngle => {
                Pick::Line
            }
        }
    }

    /// Accepted target for slot B.
    pub fn second_pick(self) -> Pick {
        match self {
            PairKind::Connect | PairKind::SetDistance | PairKind::GetDistance => Pick::Point,
            PairKind::AttachPointToLine
            | PairKind::Parallel
            | PairKind::Perpendicular
            | PairKind::SetAngle
            | PairKind::GetAngle => Pick::Line,
        }
    }
}

/// Slot A / slot B selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSelection {
    pub kind: PairKind,
    pub first: Option<EntityId>,
    pub second: Option<EntityId>,
}

impl PairSelection {
    pub fn new(kind: PairKind) -> Self {
        Self {
            kind,
            first: None,
            second: None,
        }
    }

    /// Handle a press. Returns the completed gesture's output, if any.
    pub(crate) fn on_press<R: RenderAdapter>(
        &mut self,
        ctx: &mut ToolContext<'_, R>,
        position: Point,
    ) -> Option<ToolOutput> {
        if self.first.is_some() && self.second.is_some() {
            self.clear(ctx);
        }

        let Some(first) = self.first else {
            let hit = pick(ctx, self.kind.first_pick(), position)?;
            self.first = Some(hit);
            ctx.highlight(hit, true);
            log::debug!("{:?}: slot A = {}", self.kind, hit);
            return None;
        };

        let hit = pick(ctx, self.kind.second_pick(), position)?;
        if hit == first {
            return None;
        }
        self.second = Some(hit);
        ctx.highlight(first, false);
        log::debug!("{:?}: slot B = {}", self.kind, hit);
        self.complete(ctx, first, hit)
    }

    /// Drop both slots and their highlights.
    pub(crate) fn clear<R: RenderAdapter>(&mut self, ctx: &mut ToolContext<'_, R>) {
        for id in [self.first.take(), self.second.take()].into_iter().flatten() {
            ctx.highlight(id, false);
        }
    }

    fn complete<R: RenderAdapter>(
        &self,
        ctx: &mut ToolContext<'_, R>,
        a: EntityId,
        b: EntityId,
    ) -> Option<ToolOutput> {
        let intent = match self.kind {
            PairKind::Connect => Intent::ConnectPoints {
                point1: point_ref(ctx, a)?,
                point2: point_ref(ctx, b)?,
            },
            PairKind::Parallel => Intent::Parallel { uid1: a, uid2: b },
            PairKind::Perpendicular => Intent::Perpendicular { uid1: a, uid2: b },
            PairKind::AttachPointToLine => Intent::AttachPointToLine { uid1: a, uid2: b },
            PairKind::SetAngle => Intent::AngleBetweenLines {
                uid1: a,
                uid2: b,
                angle: ctx.input_value,
            },
            PairKind::SetDistance => Intent::DistanceBetweenPoints {
                uid1: a,
                uid2: b,
                dist: ctx.input_value,
            },
            PairKind::GetAngle => {
                let Some(angle) = measure::angle_between(ctx.scene, a, b) else {
                    log::warn!("Cannot measure angle between degenerate lines {a} and {b}");
                    return None;
                };
                return Some(ToolOutput::Query(QueryResult::Angle(angle)));
            }
            PairKind::GetDistance => {
                let distance = measure::distance_between(ctx.scene, a, b)?;
                return Some(ToolOutput::Query(QueryResult::Distance(distance)));
            }
        };
        Some(ToolOutput::Intent(intent))
    }
}

fn pick<R: RenderAdapter>(ctx: &ToolContext<'_, R>, accept: Pick, position: Point) -> Option<EntityId> {
    let radius = ctx.config.hit_radius_px;
    match accept {
        Pick::Point => find_point(ctx.scene, position, radius, false),
        Pick::EndPoint => find_point(ctx.scene, position, radius, true),
        Pick::Line => find_line(ctx.scene, position, radius),
    }
}

fn point_ref<R: RenderAdapter>(ctx: &ToolContext<'_, R>, id: EntityId) -> Option<PointRef> {
    let point = ctx.scene.point(id)?;
    Some(match point.kind {
        PointKind::EndPoint { line, segment } => PointRef {
            uid: line,
            point_num: Some(segment),
        },
        PointKind::Free => PointRef {
            uid: id,
            point_num: None,
        },
    })
}
