// Mecanum inverse kinematics for the MWRover 4-wheel base
// Converts a drag displacement into per-wheel servo pulse widths.
//
// Rover wheel layout (channel numbers), front at the top:
//
//      [\] 2   0 [/]
//      [/] 3   1 [\]

use crate::config::DriveConfig;
use crate::messages::{WHEEL_COUNT, WheelCommand};

/// Forward spin sign per wheel channel
pub const FORWARD: [f64; WHEEL_COUNT] = [1.0, 1.0, -1.0, -1.0];

/// Right strafe sign per wheel channel
pub const STRAFE_RIGHT: [f64; WHEEL_COUNT] = [1.0, -1.0, 1.0, -1.0];

/// Convert a drag displacement to wheel commands
///
/// # Arguments
/// * `dx` - Horizontal displacement (positive = right)
/// * `dy` - Vertical displacement in screen axes (positive = down, i.e. backwards)
/// * `doc_min_size` - Smallest dimension of the drag surface; a drag this long saturates
/// * `config` - Servo centre and range
pub fn drag_to_wheels(dx: f64, dy: f64, doc_min_size: f64, config: &DriveConfig) -> WheelCommand {
    let range = config.range as f64;
    let centre = config.centre as f64;
    let min = config.servo_min() as f64;
    let max = config.servo_max() as f64;

    // Guard against an empty surface
    let scale = doc_min_size.max(1.0);
    let forward = range * dy / scale;
    let strafe = range * dx / scale;

    let mut wheels = [config.centre; WHEEL_COUNT];
    for (i, wheel) in wheels.iter_mut().enumerate() {
        // Each wheel saturates on its own
        let pulse = -FORWARD[i] * forward - STRAFE_RIGHT[i] * strafe + centre;
        *wheel = pulse.clamp(min, max).round() as u16;
    }

    WheelCommand(wheels)
}
