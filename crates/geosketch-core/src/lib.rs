//! GeoSketch Core Library
//!
//! Renderer-agnostic editing core for a constraint-based geometry sketcher:
//! the scene of points and lines, the tool state machines, and the channel
//! that exchanges edit intents and solved positions with an external solver.

pub mod config;
pub mod editor;
pub mod measure;
pub mod protocol;
pub mod render;
pub mod scene;
pub mod session;
pub mod sync;
pub mod tools;

pub use config::{EditorConfig, SyncConfig};
pub use editor::{Editor, parse_input_value};
pub use measure::QueryResult;
pub use protocol::{Intent, PointRef, SolverUpdate, WirePoint};
pub use render::{NullRenderer, RenderAdapter};
pub use scene::{Entity, EntityId, PointKind, Scene, SceneError, SceneLine, ScenePoint};
pub use session::Session;
pub use sync::{ConnectionState, NativeWebSocket, SyncChannel, SyncError, Transport, TransportEvent};
pub use tools::{ToolKind, ToolManager, ToolOutput};
