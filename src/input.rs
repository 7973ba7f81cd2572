// Pointer and touch input, normalized to one coordinate pair per event

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Position on the drag surface (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Where an event's coordinates come from
#[derive(Debug, Clone, PartialEq)]
pub enum PointerSource {
    Mouse { client: Point },
    /// Active touches; only the first one steers
    Touch { touches: Vec<Point> },
}

impl PointerSource {
    /// Single coordinate pair for the event, if it carries one
    pub fn coords(&self) -> Option<Point> {
        match self {
            PointerSource::Mouse { client } => Some(*client),
            PointerSource::Touch { touches } => touches.first().copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    pub source: PointerSource,
}

impl GestureEvent {
    pub fn mouse(phase: GesturePhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            source: PointerSource::Mouse {
                client: Point::new(x, y),
            },
        }
    }

    pub fn touch(phase: GesturePhase, touches: Vec<Point>) -> Self {
        Self {
            phase,
            source: PointerSource::Touch { touches },
        }
    }

    /// Map a terminal mouse report onto a drag gesture (left button only)
    pub fn from_terminal(event: &MouseEvent) -> Option<Self> {
        let phase = match event.kind {
            MouseEventKind::Down(MouseButton::Left) => GesturePhase::Start,
            MouseEventKind::Drag(MouseButton::Left) => GesturePhase::Move,
            MouseEventKind::Up(MouseButton::Left) => GesturePhase::End,
            _ => return None,
        };
        Some(Self::mouse(phase, event.column as f64, event.row as f64))
    }
}
