//! Reflectance bar model
//!
//! Six sensors sit on a bar `sensor_offset_mm` ahead of the axle, spaced
//! `sensor_pitch_mm` apart; sensor 0 is leftmost (most significant bit).
//!
//! ```text
//!            heading
//!               ▲
//!   0   1   2   3   4   5      lateral: +25 +15 +5 -5 -15 -25 mm
//!   ●───●───●───●───●───●
//!               │ offset
//!          ═════╪═════  axle
//! ```
//!
//! Darkness falls off linearly across a band `edge_blur_mm` wide centred on
//! each tape edge. A sensor's discharge time is
//! `white + darkness * (black - white)` plus Gaussian noise.

use super::config::{ChassisConfig, LineConfig, SimulationConfig};
use super::maze::{Maze, Point};
use super::physics::Pose;
use crate::core::types::{LineState, SENSOR_COUNT};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Darkness in 0..=1 for a sensor `distance_mm` from the tape centreline
pub fn darkness(distance_mm: f32, line: &LineConfig) -> f32 {
    let half = line.line_width_mm / 2.0;
    let blur = line.edge_blur_mm;
    ((half + blur / 2.0 - distance_mm) / blur).clamp(0.0, 1.0)
}

/// Sensor positions relative to the axle
#[derive(Debug, Clone)]
pub struct SensorBar {
    offset_mm: f32,
    lateral_mm: [f32; SENSOR_COUNT],
}

impl SensorBar {
    pub fn new(chassis: &ChassisConfig) -> Self {
        let mut lateral_mm = [0.0; SENSOR_COUNT];
        let middle = (SENSOR_COUNT as f32 - 1.0) / 2.0;
        for (i, lateral) in lateral_mm.iter_mut().enumerate() {
            *lateral = (middle - i as f32) * chassis.sensor_pitch_mm;
        }
        Self {
            offset_mm: chassis.sensor_offset_mm,
            lateral_mm,
        }
    }

    /// World position of each sensor
    pub fn positions(&self, pose: &Pose) -> [Point; SENSOR_COUNT] {
        let mut out = [Point::default(); SENSOR_COUNT];
        for (p, &lateral) in out.iter_mut().zip(self.lateral_mm.iter()) {
            *p = pose.transform(self.offset_mm, lateral);
        }
        out
    }

    /// World position of the bar's midpoint
    pub fn centre(&self, pose: &Pose) -> Point {
        pose.transform(self.offset_mm, 0.0)
    }
}

/// Turns a pose into six discharge times
pub struct ReflectanceModel {
    bar: SensorBar,
    line: LineConfig,
    white: f32,
    black: f32,
    noise_ticks: f32,
    faulty: [bool; SENSOR_COUNT],
    rng: SmallRng,
}

impl ReflectanceModel {
    /// Seed 0 draws the noise seed from entropy
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = if config.random_seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.random_seed)
        };
        let mut faulty = [false; SENSOR_COUNT];
        for &channel in &config.faulty_channels {
            if let Some(flag) = faulty.get_mut(channel) {
                *flag = true;
            }
        }
        Self {
            bar: SensorBar::new(&config.chassis),
            line: config.line.clone(),
            white: config.white_ticks as f32,
            black: config.black_ticks as f32,
            noise_ticks: config.noise_ticks,
            faulty,
            rng,
        }
    }

    /// Noise-free darkness of each sensor at `pose`.
    ///
    /// Inside the finish pad the bar reads the finish marking regardless of
    /// the tape underneath.
    pub fn darkness(&self, maze: &Maze, pose: &Pose) -> [f32; SENSOR_COUNT] {
        let mut out = [0.0; SENSOR_COUNT];
        if self.bar.centre(pose).distance(maze.finish()) <= self.line.finish_pad_radius_mm {
            for (i, d) in out.iter_mut().enumerate() {
                *d = if LineState::FINISH.sees(i) { 1.0 } else { 0.0 };
            }
            return out;
        }
        for (d, p) in out.iter_mut().zip(self.bar.positions(pose)) {
            *d = darkness(maze.distance_to_line(p), &self.line);
        }
        out
    }

    /// Discharge time per channel; `None` for a channel that never falls
    pub fn read(&mut self, maze: &Maze, pose: &Pose) -> [Option<u16>; SENSOR_COUNT] {
        let darkness = self.darkness(maze, pose);
        let mut out = [None; SENSOR_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            if self.faulty[i] {
                continue;
            }
            let ticks = self.white + darkness[i] * (self.black - self.white) + self.gaussian();
            *slot = Some(ticks.round().clamp(1.0, u16::MAX as f32) as u16);
        }
        out
    }

    fn gaussian(&mut self) -> f32 {
        if self.noise_ticks == 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * self.noise_ticks
    }
}
