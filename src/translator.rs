// Gesture -> wheel command translation with a send-rate gate
//
// The translator owns the drag state and the rate limiter. The end of a drag
// always yields the neutral command, regardless of the limiter.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::DriveConfig;
use crate::input::{GestureEvent, GesturePhase, Point};
use crate::messages::WheelCommand;
use crate::motor::drag_to_wheels;
use crate::surface::{GestureSurface, Marker};

/// Status text shown once a drag ends
pub const STOPPED_STATUS: &str = "STOPPED";

/// Enforces a minimum gap between accepted move commands
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Claim a send slot at `now`; the first call always succeeds
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let open = match self.last_accepted {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        };
        if open {
            self.last_accepted = Some(now);
        }
        open
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub origin: Point,
    pub current: Point,
    pub active: bool,
}

impl DragState {
    fn begin(at: Point) -> Self {
        Self {
            origin: at,
            current: at,
            active: true,
        }
    }

    /// Displacement from origin to the current pointer
    pub fn delta(&self) -> (f64, f64) {
        (
            self.current.x - self.origin.x,
            self.current.y - self.origin.y,
        )
    }
}

pub struct Translator {
    config: DriveConfig,
    drag: DragState,
    limiter: RateLimiter,
    accepted: u64,
}

impl Translator {
    pub fn new(config: DriveConfig) -> Self {
        let limiter = RateLimiter::new(config.min_interval);
        Self {
            config,
            drag: DragState::default(),
            limiter,
            accepted: 0,
        }
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Move commands that passed the rate gate so far
    ///
    /// The driver may still collapse an accepted move into a newer one.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Process one gesture event; returns the command to transmit, if any
    pub fn handle(
        &mut self,
        event: &GestureEvent,
        now: Instant,
        surface: &mut dyn GestureSurface,
    ) -> Option<WheelCommand> {
        match event.phase {
            GesturePhase::Start => {
                let at = event.source.coords()?;
                debug!("Drag started at ({}, {})", at.x, at.y);
                self.drag = DragState::begin(at);
                surface.place_marker(Marker::Origin, at);
                None
            }
            GesturePhase::Move => self.on_move(event, now, surface),
            GesturePhase::End => Some(self.stop(surface)),
        }
    }

    fn on_move(
        &mut self,
        event: &GestureEvent,
        now: Instant,
        surface: &mut dyn GestureSurface,
    ) -> Option<WheelCommand> {
        if !self.drag.active {
            return None;
        }
        let at = event.source.coords()?;
        self.drag.current = at;

        if !self.limiter.try_acquire(now) {
            return None;
        }

        let (dx, dy) = self.drag.delta();
        let command = drag_to_wheels(dx, dy, surface.min_size(), &self.config);
        self.accepted += 1;

        surface.show_status(&command.status_text(self.accepted));
        surface.place_marker(Marker::Target, at);
        Some(command)
    }

    /// End the drag and return the neutral command
    pub fn stop(&mut self, surface: &mut dyn GestureSurface) -> WheelCommand {
        if self.drag.active {
            info!("Drag released, stopping wheels");
        }
        self.drag = DragState::default();
        surface.show_status(STOPPED_STATUS);
        WheelCommand::centre(&self.config)
    }
}
