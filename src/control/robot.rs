//! Control-loop handle over the driver and the line source

use crate::core::driver::{LineSource, RobotDriver};
use crate::core::types::{BeepPattern, Command, LineState, Spin, TrackVelocity};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything the control loop touches: track commands out, line states in.
///
/// Time is measured on the acquisition clock carried by each sample, so
/// delays advance in step with the sensor stream.
pub struct Robot {
    driver: Box<dyn RobotDriver>,
    line: Box<dyn LineSource>,
    last_state: LineState,
    clock_us: u64,
    running: Arc<AtomicBool>,
}

impl Robot {
    pub fn new(driver: Box<dyn RobotDriver>, line: Box<dyn LineSource>) -> Self {
        Self {
            driver,
            line,
            last_state: LineState::EMPTY,
            clock_us: 0,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share an external run flag (cleared by the signal handler)
    pub fn with_run_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Wait for the next complete reading
    pub fn read_line(&mut self) -> Result<LineState> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(Error::Interrupted);
        }
        let sample = self.line.next_sample()?;
        self.last_state = sample.state;
        self.clock_us = sample.timestamp_us;
        Ok(sample.state)
    }

    /// State returned by the most recent [`read_line`](Self::read_line)
    pub fn last_line(&self) -> LineState {
        self.last_state
    }

    /// Acquisition clock at the most recent reading
    pub fn now_us(&self) -> u64 {
        self.clock_us
    }

    /// Set both tracks in one command
    pub fn tracks(&mut self, left: TrackVelocity, right: TrackVelocity) -> Result<()> {
        self.driver.send_command(Command::Tracks { left, right })
    }

    /// Both tracks forward at `speed`
    pub fn forward(&mut self, speed: u8) -> Result<()> {
        self.driver.send_command(Command::forward(speed))
    }

    /// Spin in place
    pub fn spin(&mut self, direction: Spin, speed: u8) -> Result<()> {
        self.driver.send_command(Command::spin(direction, speed))
    }

    pub fn stop(&mut self) -> Result<()> {
        self.driver.send_command(Command::Stop)
    }

    pub fn beep(&mut self, pattern: BeepPattern) -> Result<()> {
        self.driver.send_command(Command::Beep(pattern))
    }

    /// Let `ms` milliseconds of acquisition time pass; tracks keep their
    /// current setpoints.
    pub fn delay_ms(&mut self, ms: u64) -> Result<()> {
        let until = self.clock_us + ms * 1000;
        while self.clock_us < until {
            self.read_line()?;
        }
        Ok(())
    }

    /// Block until the operator presses the button, polling every `poll_ms`.
    pub fn wait_for_button(&mut self, poll_ms: u64) -> Result<()> {
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return Err(Error::Interrupted);
            }
            if self.driver.button_pressed() {
                log::debug!("Button pressed");
                return Ok(());
            }
            self.delay_ms(poll_ms)?;
        }
    }

    pub fn set_calibration(&mut self, enabled: bool) {
        self.line.set_calibration(enabled);
    }

    pub fn is_calibrated(&self) -> bool {
        self.line.is_calibrated()
    }

    /// Stop the tracks and release the device
    pub fn shutdown(&mut self) -> Result<()> {
        self.driver.send_command(Command::Stop)?;
        self.driver.send_command(Command::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::scripted::{RecordingDriver, ScriptedLine};

    #[test]
    fn test_delay_consumes_samples_by_timestamp() {
        let driver = RecordingDriver::new();
        let line = ScriptedLine::from_bits(&[0x0C; 50]).with_period_us(3_000);
        let mut robot = Robot::new(Box::new(driver.clone()), Box::new(line));
        robot.read_line().unwrap();
        assert_eq!(robot.now_us(), 0);
        robot.delay_ms(10).unwrap();
        assert_eq!(robot.now_us(), 12_000);
        assert!(driver.commands().is_empty());
    }

    #[test]
    fn test_wait_for_button_polls_until_pressed() {
        let driver = RecordingDriver::new().with_button_after(3);
        let line = ScriptedLine::from_bits(&[0x0C; 100]);
        let mut robot = Robot::new(Box::new(driver.clone()), Box::new(line));
        robot.wait_for_button(10).unwrap();
        assert_eq!(driver.button_polls(), 4);
    }

    #[test]
    fn test_wait_for_button_honours_run_flag() {
        let driver = RecordingDriver::new().with_button_after(usize::MAX);
        let line = ScriptedLine::from_bits(&[0x0C; 10]);
        let running = Arc::new(AtomicBool::new(false));
        let mut robot = Robot::new(Box::new(driver), Box::new(line)).with_run_flag(running);
        assert!(matches!(robot.wait_for_button(10), Err(Error::Interrupted)));
    }
}
