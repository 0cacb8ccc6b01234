//! Loopback solver.
//!
//! Answers placement intents with the coordinates it was given, so clients see
//! the same update path a real solver would drive. Relational intents are
//! acknowledged in the log only; nothing is solved.

use geosketch_core::protocol::{Intent, LineUpdate, PointUpdate, SolverUpdate};
use tracing::{debug, info};

/// Per-connection loopback solver.
#[derive(Debug, Default)]
pub struct LoopbackSolver {
    handled: u64,
}

impl LoopbackSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of intents seen on this connection.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Build the reply for one intent, if it warrants one.
    pub fn apply(&mut self, intent: &Intent) -> Option<SolverUpdate> {
        self.handled += 1;
        match *intent {
            Intent::CreatePoint { uid, point } | Intent::DragPoint { uid, point } => {
                Some(SolverUpdate {
                    points: vec![PointUpdate {
                        uid,
                        x: point.x,
                        y: point.y,
                    }],
                    lines: Vec::new(),
                })
            }
            Intent::CreateLine {
                uid,
                point1,
                point2,
            }
            | Intent::DragLine {
                uid,
                point1,
                point2,
            } => Some(SolverUpdate {
                points: Vec::new(),
                lines: vec![LineUpdate {
                    uid,
                    point1,
                    point2,
                }],
            }),
            Intent::AngleBetweenLines { angle: None, .. }
            | Intent::DistanceBetweenPoints { dist: None, .. } => {
                debug!("{} without a value, ignored", intent.operation());
                None
            }
            _ => {
                info!("Constraint {} acknowledged (not solved)", intent.operation());
                None
            }
        }
    }
}
