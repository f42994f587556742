//! Collaborator traits: the motor/button/buzzer driver and the line-state source

use crate::core::types::{Command, LineSample};
use crate::error::Result;

/// Motor, button and buzzer hardware abstraction
///
/// Track commands are fire-and-forget: the driver applies them and returns.
pub trait RobotDriver: Send {
    /// Prepare the hardware (start simulation threads, enable outputs)
    fn initialize(&mut self) -> Result<()>;

    /// Send a command to the hardware
    fn send_command(&mut self, cmd: Command) -> Result<()>;

    /// Sample the operator's confirm button
    fn button_pressed(&mut self) -> bool;
}

/// Consumer side of sensor acquisition
pub trait LineSource: Send {
    /// Block until a reading newer than the last one returned is complete.
    fn next_sample(&mut self) -> Result<LineSample>;

    /// Enable or disable per-channel min/max tracking
    fn set_calibration(&mut self, enabled: bool);

    /// Every channel has seen distinct minimum and maximum readings
    fn is_calibrated(&self) -> bool;
}
