// Motor control module for the MWRover mecanum base
//
// Provides:
// - Mecanum drag kinematics (drag displacement -> wheel pulse widths)
// - HTTP command link to the rover controller
// - Non-blocking command driver (one request in flight, latest wins, moves spaced)

mod driver;
pub mod kinematics;
pub mod link;

pub use driver::CommandDriver;
pub use kinematics::drag_to_wheels;
pub use link::{CommandLink, TransportError};
