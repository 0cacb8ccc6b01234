//! Editor and sync configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pick radius for point and line hit-testing, in pixels.
pub const HIT_RADIUS_PX: f64 = 5.0;
/// Line gestures shorter than this are discarded.
pub const MIN_LINE_LENGTH_PX: f64 = 10.0;
/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Default solver endpoint (matches the loopback server).
pub const DEFAULT_SOLVER_URL: &str = "ws://localhost:3030/ws";
/// Environment variable overriding the solver endpoint.
pub const SOLVER_URL_ENV: &str = "GEOSKETCH_SOLVER_URL";

/// Tunables for gesture interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Exclusive pick radius in pixels.
    pub hit_radius_px: f64,
    /// Minimum committed line length in pixels.
    pub min_line_length_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_radius_px: HIT_RADIUS_PX,
            min_line_length_px: MIN_LINE_LENGTH_PX,
        }
    }
}

/// Connection settings for the solver channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket URL of the solver.
    pub url: String,
    /// Delay before each reconnect attempt. Never grows.
    #[serde(with = "duration_millis")]
    pub reconnect_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOLVER_URL.to_string(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

impl SyncConfig {
    /// Defaults, with the URL taken from `GEOSKETCH_SOLVER_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(SOLVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::default().with_url(url.trim()),
            _ => Self::default(),
        }
    }

    /// Replace the solver URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
