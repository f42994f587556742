//! Spin maneuvers performed at nodes
//!
//! A turn spins in place and counts lines crossed by the two centre sensors:
//! leave the current line (centre bits clear), then stop on the next one
//! (exactly `001100`). When the bar starts on blank floor the first phase
//! ends immediately.

use super::robot::Robot;
use crate::core::types::{LineState, Spin};
use crate::error::{Error, Result};

/// Spin until the centre sensors leave the line they are on
fn leave_line(robot: &mut Robot) -> Result<()> {
    while robot.read_line()?.touches_center() {}
    Ok(())
}

/// Spin until the line sits exactly under the two centre sensors
fn settle_on_line(robot: &mut Robot) -> Result<()> {
    while robot.read_line()? != LineState::CENTER {}
    Ok(())
}

/// Spin in `direction`, crossing `lines` lines, stopping centred on the last
pub fn turn(robot: &mut Robot, direction: Spin, speed: u8, lines: usize) -> Result<()> {
    robot.spin(direction, speed)?;
    for _ in 0..lines {
        leave_line(robot)?;
        settle_on_line(robot)?;
    }
    robot.stop()
}

/// Spin until centred on a line without first leaving the current one.
/// Used at dead ends, where the bar already reads blank.
pub fn spin_to_line(robot: &mut Robot, direction: Spin, speed: u8) -> Result<()> {
    robot.spin(direction, speed)?;
    settle_on_line(robot)?;
    robot.stop()
}

fn sweep(robot: &mut Robot, speed: u8, spin_ms: u64) -> Result<()> {
    robot.spin(Spin::Right, speed)?;
    robot.delay_ms(spin_ms)?;
    settle_on_line(robot)
}

/// Sweep the bar across the line with calibration enabled, then stop centred.
///
/// Spins right for at least `spin_ms`, so every channel passes over both the
/// line and the floor, then keeps spinning until centred.
pub fn calibrate(robot: &mut Robot, speed: u8, spin_ms: u64) -> Result<()> {
    log::info!("Calibrating: spin at {}% for {} ms", speed, spin_ms);
    robot.set_calibration(true);
    let swept = sweep(robot, speed, spin_ms);
    let stopped = robot.stop();
    robot.set_calibration(false);
    swept?;
    stopped?;

    if !robot.is_calibrated() {
        log::error!("Calibration finished but channel bounds did not separate");
        return Err(Error::NotCalibrated);
    }
    log::info!("Calibration complete");
    Ok(())
}
