//! Pointer events as delivered by the host's input bridge.
//!
//! Coordinates arrive already mapped into the content's logical space.
//! Button presses pass straight through; moves are coalesced so at most one
//! is forwarded per delay window, carrying the latest position.
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    ButtonDown { button: u8 },
    ButtonUp { button: u8 },
    Move { x: i32, y: i32 },
}

#[derive(Debug, Clone)]
pub struct MoveThrottle {
    delay: Duration,
    window_started: Option<Instant>,
    latest: Option<(i32, i32)>,
}

impl MoveThrottle {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            window_started: None,
            latest: None,
        }
    }

    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.pointer_move_delay())
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Feed a raw event. Button events are returned immediately; moves are
    /// held until [`MoveThrottle::poll`] releases them.
    pub fn push(&mut self, event: PointerEvent, now: Instant) -> Option<PointerEvent> {
        match event {
            PointerEvent::Move { x, y } => {
                self.latest = Some((x, y));
                self.window_started.get_or_insert(now);
                None
            }
            PointerEvent::ButtonDown { .. } | PointerEvent::ButtonUp { .. } => Some(event),
        }
    }

    /// Release the pending move once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<PointerEvent> {
        let started = self.window_started?;
        if now.saturating_duration_since(started) < self.delay {
            return None;
        }
        self.window_started = None;
        self.latest
            .take()
            .map(|(x, y)| PointerEvent::Move { x, y })
    }

    /// When the pending move becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.window_started.map(|started| started + self.delay)
    }
}

impl Default for MoveThrottle {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
