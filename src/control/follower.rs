//! PID line follower
//!
//! # Position error
//!
//! | LineState | Error | Meaning |
//! |-----------|-------|---------|
//! | `010000` | -3 | line far left |
//! | `011000` | -2 | |
//! | `001000` | -1 | |
//! | `001100` | 0 | centred |
//! | `000100` | +1 | |
//! | `000110` | +2 | |
//! | `000010` | +3 | line far right |
//! | other | 0 | line lost, hold course |
//!
//! Fixed-point controller: `output = e*Kp + Σe/Ki + Δe*Kd`; left track gets
//! `speed + output`, right track `speed - output`, each clamped to 0..=100.

use super::robot::Robot;
use crate::config::PidConfig;
use crate::core::types::{LineState, TrackVelocity};
use crate::error::Result;

/// Signed offset of the line from the centre of the bar
pub fn position_error(state: LineState) -> i32 {
    match state.bits() {
        0x10 => -3,
        0x18 => -2,
        0x08 => -1,
        0x0C => 0,
        0x04 => 1,
        0x06 => 2,
        0x02 => 3,
        _ => 0,
    }
}

/// Integer PID state for one run between nodes
#[derive(Debug, Clone)]
pub struct Pid {
    kp: i32,
    ki_divisor: i32,
    kd: i32,
    integral: i32,
    previous_error: i32,
}

impl Pid {
    pub fn new(config: &PidConfig) -> Self {
        Self {
            kp: config.kp,
            ki_divisor: config.ki_divisor.max(1),
            kd: config.kd,
            integral: 0,
            previous_error: 0,
        }
    }

    /// Feed one error sample, get the steering term
    pub fn update(&mut self, error: i32) -> i32 {
        self.integral = self.integral.saturating_add(error);
        let derivative = error - self.previous_error;
        self.previous_error = error;
        (error * self.kp)
            .saturating_add(self.integral / self.ki_divisor)
            .saturating_add(derivative * self.kd)
    }

    pub fn integral(&self) -> i32 {
        self.integral
    }
}

/// Left and right setpoints for a base speed and steering term
pub fn track_speeds(speed: u8, output: i32) -> (u8, u8) {
    let left = (speed as i32 + output).clamp(0, 100);
    let right = (speed as i32 - output).clamp(0, 100);
    (left as u8, right as u8)
}

/// Follows the line until the bar reports a node
#[derive(Debug, Clone)]
pub struct LineFollower {
    config: PidConfig,
}

impl LineFollower {
    pub fn new(config: &PidConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Drive forward under PID control and stop both tracks as soon as the
    /// reading matches the node predicate. Returns that reading.
    pub fn drive_to_node(&self, robot: &mut Robot, speed: u8) -> Result<LineState> {
        let mut pid = Pid::new(&self.config);
        robot.forward(speed)?;

        loop {
            let state = robot.read_line()?;
            if state.is_node() {
                robot.stop()?;
                log::trace!("Node reached: {} (integral {})", state, pid.integral());
                return Ok(state);
            }
            let output = pid.update(position_error(state));
            let (left, right) = track_speeds(speed, output);
            robot.tracks(TrackVelocity::forward(left), TrackVelocity::forward(right))?;
        }
    }
}
