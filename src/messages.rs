// Define message types for the translator -> controller link

use crate::config::DriveConfig;

/// Number of mecanum wheels on the rover
pub const WHEEL_COUNT: usize = 4;

// Wheel command sent to the rover controller
// Index order is the controller's servo channels: front-right, rear-right, front-left, rear-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelCommand(pub [u16; WHEEL_COUNT]);

impl WheelCommand {
    /// All wheels at the neutral pulse width
    pub fn centre(config: &DriveConfig) -> Self {
        Self([config.centre; WHEEL_COUNT])
    }

    pub fn values(&self) -> [u16; WHEEL_COUNT] {
        self.0
    }

    /// Encode as `application/x-www-form-urlencoded`, keyed by wheel index
    /// e.g. `0=1750&1=1750&2=1250&3=1250`
    pub fn to_form_body(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(wheel, value)| format!("{}={}", wheel, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Status line shown on the surface after an accepted move
    pub fn status_text(&self, accepted: u64) -> String {
        let values: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        format!("{}\n{}", values.join(","), accepted)
    }
}

// Command handed to the driver
// Moves are spaced by the command interval, stops go out immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveRequest {
    Move(WheelCommand),
    Stop(WheelCommand),
}

impl DriveRequest {
    pub fn command(&self) -> WheelCommand {
        match self {
            DriveRequest::Move(cmd) | DriveRequest::Stop(cmd) => *cmd,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, DriveRequest::Move(_))
    }
}
