//! Scripted line source and recording driver
//!
//! Replays a fixed sequence of line states (for example one captured from the
//! diagnostic stream) and records every command, so the control logic can be
//! exercised without threads or physics.

use crate::core::driver::{LineSource, RobotDriver};
use crate::core::types::{Command, LineSample, LineState};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default sample spacing, close to one RC cycle on a light surface
const DEFAULT_PERIOD_US: u64 = 3_000;

/// Samples served after the script runs out before the stream closes
const DEFAULT_HOLD: usize = 10_000;

/// Line source that plays back a list of states
///
/// Once the script is exhausted the last state is repeated `hold` more times,
/// then the stream reports closed.
pub struct ScriptedLine {
    script: VecDeque<LineState>,
    last: LineState,
    hold: usize,
    period_us: u64,
    cycle: u64,
    calibrating: bool,
    calibrated: bool,
}

impl ScriptedLine {
    pub fn new(states: impl IntoIterator<Item = LineState>) -> Self {
        Self {
            script: states.into_iter().collect(),
            last: LineState::EMPTY,
            hold: DEFAULT_HOLD,
            period_us: DEFAULT_PERIOD_US,
            cycle: 0,
            calibrating: false,
            calibrated: true,
        }
    }

    /// Script from raw bit patterns
    pub fn from_bits(bits: &[u8]) -> Self {
        Self::new(bits.iter().map(|&b| LineState::new(b)))
    }

    /// Parse whitespace-separated `0`/`1` strings such as `"001100 111100"`
    pub fn parse(text: &str) -> Result<Self> {
        let states = text
            .split_whitespace()
            .map(|s| s.parse::<LineState>())
            .collect::<Result<Vec<LineState>>>()?;
        Ok(Self::new(states))
    }

    /// Append `count` copies of `state`
    pub fn then(mut self, state: LineState, count: usize) -> Self {
        self.script.extend(std::iter::repeat(state).take(count));
        self
    }

    pub fn with_period_us(mut self, period_us: u64) -> Self {
        self.period_us = period_us;
        self
    }

    /// Repeat the final state this many times before closing
    pub fn with_hold(mut self, hold: usize) -> Self {
        self.hold = hold;
        self
    }

    /// Report uncalibrated until calibration has been switched on and off
    pub fn uncalibrated(mut self) -> Self {
        self.calibrated = false;
        self
    }

    /// Scripted states not yet served
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LineSource for ScriptedLine {
    fn next_sample(&mut self) -> Result<LineSample> {
        let state = match self.script.pop_front() {
            Some(state) => state,
            None if self.hold > 0 && self.cycle > 0 => {
                self.hold -= 1;
                self.last
            }
            None => return Err(Error::SensorStreamClosed),
        };
        self.last = state;
        let sample = LineSample {
            state,
            calibrated: self.calibrated,
            cycle: self.cycle + 1,
            timestamp_us: self.cycle * self.period_us,
        };
        self.cycle += 1;
        Ok(sample)
    }

    fn set_calibration(&mut self, enabled: bool) {
        if self.calibrating && !enabled {
            self.calibrated = true;
        }
        self.calibrating = enabled;
    }

    fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}

#[derive(Debug, Default)]
struct Recording {
    commands: Vec<Command>,
    button_polls: usize,
    initialized: bool,
}

/// Driver that records commands; clones share the same recording
#[derive(Clone)]
pub struct RecordingDriver {
    recording: Arc<Mutex<Recording>>,
    press_after: usize,
}

impl RecordingDriver {
    /// Button reads as pressed on the first poll
    pub fn new() -> Self {
        Self {
            recording: Arc::new(Mutex::new(Recording::default())),
            press_after: 0,
        }
    }

    /// Button reads released for `polls` polls, then pressed
    pub fn with_button_after(mut self, polls: usize) -> Self {
        self.press_after = polls;
        self
    }

    /// Every command sent so far
    pub fn commands(&self) -> Vec<Command> {
        self.recording.lock().commands.clone()
    }

    /// Number of stop commands sent so far
    pub fn stop_count(&self) -> usize {
        self.recording
            .lock()
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Stop))
            .count()
    }

    pub fn button_polls(&self) -> usize {
        self.recording.lock().button_polls
    }

    pub fn is_initialized(&self) -> bool {
        self.recording.lock().initialized
    }
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotDriver for RecordingDriver {
    fn initialize(&mut self) -> Result<()> {
        self.recording.lock().initialized = true;
        Ok(())
    }

    fn send_command(&mut self, cmd: Command) -> Result<()> {
        self.recording.lock().commands.push(cmd);
        Ok(())
    }

    fn button_pressed(&mut self) -> bool {
        let mut rec = self.recording.lock();
        rec.button_polls += 1;
        rec.button_polls > self.press_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_hold_then_close() {
        let mut line = ScriptedLine::from_bits(&[0x0C, 0x3C]).with_hold(2);
        assert_eq!(line.next_sample().unwrap().state, LineState::CENTER);
        let second = line.next_sample().unwrap();
        assert_eq!(second.state, LineState::LEFT);
        assert_eq!(second.timestamp_us, DEFAULT_PERIOD_US);
        assert_eq!(line.next_sample().unwrap().state, LineState::LEFT);
        assert_eq!(line.next_sample().unwrap().state, LineState::LEFT);
        assert!(matches!(line.next_sample(), Err(Error::SensorStreamClosed)));
    }

    #[test]
    fn test_parse_script() {
        let mut line = ScriptedLine::parse("001100\n111111 000000").unwrap();
        assert_eq!(line.remaining(), 3);
        assert_eq!(line.next_sample().unwrap().state, LineState::CENTER);
        assert_eq!(line.next_sample().unwrap().state, LineState::ALL);
        assert!(ScriptedLine::parse("0011").is_err());
    }

    #[test]
    fn test_calibration_toggle() {
        let mut line = ScriptedLine::from_bits(&[]).uncalibrated();
        assert!(!line.is_calibrated());
        line.set_calibration(true);
        line.set_calibration(false);
        assert!(line.is_calibrated());
    }

    #[test]
    fn test_recording_driver_is_shared_between_clones() {
        let driver = RecordingDriver::new();
        let mut boxed: Box<dyn RobotDriver> = Box::new(driver.clone());
        boxed.initialize().unwrap();
        boxed.send_command(Command::forward(40)).unwrap();
        boxed.send_command(Command::Stop).unwrap();
        assert!(driver.is_initialized());
        assert_eq!(driver.commands().len(), 2);
        assert_eq!(driver.stop_count(), 1);
    }
}
