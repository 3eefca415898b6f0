//! Engine tunables loaded from JSON.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a failed requirement's skip finds its end when blocks are nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NestedSkip {
    /// Resume at the first `EndBlock` carrying the skip label, even if it
    /// closes an inner block that reused the label.
    #[default]
    LabelMatch,
    /// Count same-label `StartBlock`s inside the skipped region and resume
    /// only at the `EndBlock` that closes the outer block.
    DepthTracked,
}

/// Default throttle window for pointer move events.
pub const DEFAULT_POINTER_MOVE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub nested_skip: NestedSkip,
    pub pointer_move_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nested_skip: NestedSkip::LabelMatch,
            pointer_move_delay_ms: DEFAULT_POINTER_MOVE_DELAY_MS,
        }
    }
}

impl EngineConfig {
    /// Parse a config document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub const fn pointer_move_delay(&self) -> Duration {
        Duration::from_millis(self.pointer_move_delay_ms)
    }
}
