//! RC-discharge acquisition cycle
//!
//! # Cycle
//!
//! ```text
//!  charge      discharge (timer running)             complete
//! ┌──────┐ ┌──────────────────────────────┐ ┌──────────────────────┐
//! │ pins │ │ falling edge per channel,    │ │ calibrate (if on),   │
//! │ high │▶│ any order: ticks recorded    │▶│ recompute LineState, │
//! └──────┘ │ safety timeout if one hangs  │ │ publish              │
//!          └──────────────────────────────┘ └──────────────────────┘
//! ```
//!
//! The producer drives [`Acquisition`] with [`begin_cycle`](Acquisition::begin_cycle),
//! one [`on_falling_edge`](Acquisition::on_falling_edge) per channel and, when a
//! channel never falls, [`on_timer_expired`](Acquisition::on_timer_expired).
//! A channel that misses a cycle keeps its previous reading.

use super::channel::SensorChannel;
use crate::config::SensorsConfig;
use crate::core::types::{LineSample, LineState, SENSOR_COUNT};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Acquisition clock frequency (ticks per second)
pub const TICK_HZ: u32 = 32_768;

/// Convert acquisition clock ticks to microseconds
#[inline]
pub fn ticks_to_us(ticks: u32) -> u64 {
    ticks as u64 * 1_000_000 / TICK_HZ as u64
}

/// Flags shared between the control loop and the acquisition producer
#[derive(Debug, Default)]
pub struct SensorControl {
    calibrating: AtomicBool,
    calibrated: AtomicBool,
}

impl SensorControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable min/max tracking on every completed cycle
    pub fn set_calibration(&self, enabled: bool) {
        self.calibrating.store(enabled, Ordering::Release);
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Acquire)
    }

    /// Every channel has min < max
    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Acquire)
    }

    fn set_calibrated(&self, calibrated: bool) {
        self.calibrated.store(calibrated, Ordering::Release);
    }
}

/// Acquisition state machine for the six reflectance channels
pub struct Acquisition {
    channels: [SensorChannel; SENSOR_COUNT],
    /// Bit `i` set once channel `i` has fallen in the current cycle
    reported: u8,
    in_cycle: bool,
    cycle_start_us: u64,
    cycle: u64,
    switching_level: i32,
    timeout_ticks: u16,
    control: Arc<SensorControl>,
}

const ALL_REPORTED: u8 = (1 << SENSOR_COUNT) - 1;

impl Acquisition {
    pub fn new(config: &SensorsConfig, control: Arc<SensorControl>) -> Self {
        Self {
            channels: [SensorChannel::new(); SENSOR_COUNT],
            reported: 0,
            in_cycle: false,
            cycle_start_us: 0,
            cycle: 0,
            switching_level: config.switching_level,
            timeout_ticks: config.timeout_ticks,
            control,
        }
    }

    /// Charge phase done: start timing the discharge.
    pub fn begin_cycle(&mut self, timestamp_us: u64) {
        self.reported = 0;
        self.in_cycle = true;
        self.cycle_start_us = timestamp_us;
    }

    /// Record a channel's falling edge. Returns the completed sample once all
    /// six channels have reported.
    ///
    /// Edges outside a cycle, repeated edges and out-of-range channels are ignored.
    pub fn on_falling_edge(&mut self, channel: usize, ticks: u16) -> Option<LineSample> {
        if !self.in_cycle || channel >= SENSOR_COUNT {
            return None;
        }
        let bit = 1u8 << channel;
        if self.reported & bit != 0 {
            return None;
        }
        self.reported |= bit;
        self.channels[channel].record(ticks);

        if self.reported == ALL_REPORTED {
            Some(self.complete())
        } else {
            None
        }
    }

    /// Safety timeout fired: finish the cycle with whatever has reported.
    pub fn on_timer_expired(&mut self) -> Option<LineSample> {
        if !self.in_cycle {
            return None;
        }
        let missing: Vec<usize> = (0..SENSOR_COUNT)
            .filter(|&i| self.reported & (1u8 << i) == 0)
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "Acquisition timeout after {} ticks, stale channels {:?}",
                self.timeout_ticks,
                missing
            );
        }
        Some(self.complete())
    }

    fn complete(&mut self) -> LineSample {
        self.in_cycle = false;
        self.cycle += 1;

        if self.control.is_calibrating() {
            for ch in self.channels.iter_mut() {
                ch.calibrate();
            }
        }

        let mut seen = [false; SENSOR_COUNT];
        for (i, ch) in self.channels.iter().enumerate() {
            seen[i] = ch.sees_line(self.switching_level);
        }
        let state = LineState::from_sensors(seen);

        let calibrated = self.channels.iter().all(SensorChannel::is_calibrated);
        if calibrated != self.control.is_calibrated() {
            log::debug!("Sensor calibration state: {}", calibrated);
            self.control.set_calibrated(calibrated);
        }

        LineSample {
            state,
            calibrated,
            cycle: self.cycle,
            timestamp_us: self.cycle_start_us,
        }
    }

    /// Channel readings and bounds
    pub fn channels(&self) -> &[SensorChannel; SENSOR_COUNT] {
        &self.channels
    }

    /// Completed cycles so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquisition() -> (Acquisition, Arc<SensorControl>) {
        let control = Arc::new(SensorControl::new());
        (
            Acquisition::new(&SensorsConfig::default(), Arc::clone(&control)),
            control,
        )
    }

    fn run_cycle(acq: &mut Acquisition, ticks: [u16; SENSOR_COUNT]) -> LineSample {
        acq.begin_cycle(0);
        let mut result = None;
        // Report in reverse order, completion must not depend on order
        for ch in (0..SENSOR_COUNT).rev() {
            result = acq.on_falling_edge(ch, ticks[ch]);
        }
        result.expect("cycle should complete after six edges")
    }

    #[test]
    fn test_cycle_completes_after_all_channels() {
        let (mut acq, _) = acquisition();
        acq.begin_cycle(100);
        for ch in 0..SENSOR_COUNT - 1 {
            assert!(acq.on_falling_edge(ch, 10).is_none());
        }
        let sample = acq.on_falling_edge(SENSOR_COUNT - 1, 10).unwrap();
        assert_eq!(sample.cycle, 1);
        assert_eq!(sample.timestamp_us, 100);
        assert_eq!(acq.cycle(), 1);
    }

    #[test]
    fn test_duplicate_edges_are_ignored() {
        let (mut acq, _) = acquisition();
        acq.begin_cycle(0);
        assert!(acq.on_falling_edge(0, 10).is_none());
        assert!(acq.on_falling_edge(0, 20).is_none());
        assert_eq!(acq.channels()[0].reading(), 10);
        assert!(acq.on_falling_edge(9, 20).is_none());
    }

    #[test]
    fn test_uncalibrated_state_is_empty() {
        let (mut acq, control) = acquisition();
        let sample = run_cycle(&mut acq, [90, 90, 10, 10, 90, 90]);
        assert_eq!(sample.state, LineState::EMPTY);
        assert!(!sample.calibrated);
        assert!(!control.is_calibrated());
    }

    #[test]
    fn test_calibration_then_classification() {
        let (mut acq, control) = acquisition();
        control.set_calibration(true);
        run_cycle(&mut acq, [10; SENSOR_COUNT]);
        run_cycle(&mut acq, [90; SENSOR_COUNT]);
        control.set_calibration(false);
        assert!(control.is_calibrated());

        let sample = run_cycle(&mut acq, [10, 10, 90, 85, 10, 10]);
        assert_eq!(sample.state, LineState::CENTER);
        assert!(sample.calibrated);

        // Bounds frozen once calibration is off
        let sample = run_cycle(&mut acq, [200, 10, 10, 10, 10, 10]);
        assert_eq!(acq.channels()[0].max(), 90);
        assert_eq!(sample.state.bits(), 0x20);
    }

    #[test]
    fn test_timeout_keeps_stale_reading() {
        let (mut acq, control) = acquisition();
        control.set_calibration(true);
        run_cycle(&mut acq, [10; SENSOR_COUNT]);
        run_cycle(&mut acq, [90; SENSOR_COUNT]);
        control.set_calibration(false);
        run_cycle(&mut acq, [10, 10, 90, 90, 10, 10]);

        // Channel 2 never falls this cycle
        acq.begin_cycle(5_000);
        for ch in [0, 1, 3, 4, 5] {
            assert!(acq.on_falling_edge(ch, 10).is_none());
        }
        let sample = acq.on_timer_expired().unwrap();
        assert_eq!(acq.channels()[2].reading(), 90);
        assert_eq!(sample.state.bits(), 0x08);
        assert_eq!(sample.timestamp_us, 5_000);
    }

    #[test]
    fn test_timer_outside_cycle_does_nothing() {
        let (mut acq, _) = acquisition();
        assert!(acq.on_timer_expired().is_none());
        run_cycle(&mut acq, [10; SENSOR_COUNT]);
        assert!(acq.on_timer_expired().is_none());
    }

    #[test]
    fn test_ticks_to_us() {
        assert_eq!(ticks_to_us(32_768), 1_000_000);
        assert_eq!(ticks_to_us(0), 0);
    }
}
