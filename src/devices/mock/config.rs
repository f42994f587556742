//! Mock device simulation configuration
//!
//! Every parameter has a default matching the Zumo chassis and a standard
//! black-tape course, so `[device.simulation]` can be omitted entirely.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── maze_file, spacing_mm          # Course
//! ├── random_seed, noise_ticks       # Sensor noise
//! ├── white_ticks, black_ticks       # Discharge times on floor / tape
//! ├── faulty_channels                # Channels that never fall
//! ├── time_limit_s, auto_confirm     # Run control
//! ├── ChassisConfig                  # Tracks and sensor bar geometry
//! └── LineConfig                     # Tape width, edge softness, finish pad
//! ```
//!
//! # Default Values
//!
//! | Parameter | Default | Source |
//! |-----------|---------|--------|
//! | track_width_mm | 85 | Zumo chassis |
//! | max_track_speed_mm_s | 400 | 100 % PWM, 75:1 gearmotors |
//! | sensor_offset_mm | 30 | Reflectance array ahead of the axle |
//! | sensor_pitch_mm | 10 | Array spacing |
//! | line_width_mm | 19 | Electrical tape |

use crate::core::types::SENSOR_COUNT;
use crate::error::{Error, Result};
use serde::Deserialize;

/// Drive train and sensor bar geometry
#[derive(Debug, Clone, Deserialize)]
pub struct ChassisConfig {
    /// Distance between track centres (mm)
    #[serde(default = "default_track_width_mm")]
    pub track_width_mm: f32,

    /// Track speed at 100 % (mm/s)
    #[serde(default = "default_max_track_speed_mm_s")]
    pub max_track_speed_mm_s: f32,

    /// Sensor bar distance ahead of the axle (mm)
    #[serde(default = "default_sensor_offset_mm")]
    pub sensor_offset_mm: f32,

    /// Spacing between adjacent sensors (mm)
    #[serde(default = "default_sensor_pitch_mm")]
    pub sensor_pitch_mm: f32,
}

fn default_track_width_mm() -> f32 {
    85.0
}
fn default_max_track_speed_mm_s() -> f32 {
    400.0
}
fn default_sensor_offset_mm() -> f32 {
    30.0
}
fn default_sensor_pitch_mm() -> f32 {
    10.0
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            track_width_mm: default_track_width_mm(),
            max_track_speed_mm_s: default_max_track_speed_mm_s(),
            sensor_offset_mm: default_sensor_offset_mm(),
            sensor_pitch_mm: default_sensor_pitch_mm(),
        }
    }
}

/// Painted course
#[derive(Debug, Clone, Deserialize)]
pub struct LineConfig {
    /// Tape width (mm)
    #[serde(default = "default_line_width_mm")]
    pub line_width_mm: f32,

    /// Width of the soft transition at each tape edge (mm)
    #[serde(default = "default_edge_blur_mm")]
    pub edge_blur_mm: f32,

    /// Radius of the finish marking around the finish node (mm)
    #[serde(default = "default_finish_pad_radius_mm")]
    pub finish_pad_radius_mm: f32,
}

fn default_line_width_mm() -> f32 {
    19.0
}
fn default_edge_blur_mm() -> f32 {
    4.0
}
fn default_finish_pad_radius_mm() -> f32 {
    15.0
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            line_width_mm: default_line_width_mm(),
            edge_blur_mm: default_edge_blur_mm(),
            finish_pad_radius_mm: default_finish_pad_radius_mm(),
        }
    }
}

/// Root simulation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// ASCII maze file; the built-in course is used when absent
    #[serde(default)]
    pub maze_file: Option<String>,

    /// Distance between adjacent grid nodes (mm)
    #[serde(default = "default_spacing_mm")]
    pub spacing_mm: f32,

    /// Random seed for reproducible noise (0 = random each run)
    #[serde(default)]
    pub random_seed: u64,

    /// Discharge noise standard deviation (ticks)
    #[serde(default = "default_noise_ticks")]
    pub noise_ticks: f32,

    /// Discharge time over bare floor (ticks)
    #[serde(default = "default_white_ticks")]
    pub white_ticks: u16,

    /// Discharge time over tape (ticks)
    #[serde(default = "default_black_ticks")]
    pub black_ticks: u16,

    /// Simulated time after which the sensor stream closes (s)
    #[serde(default = "default_time_limit_s")]
    pub time_limit_s: f32,

    /// Press the button whenever the robot asks
    #[serde(default = "default_true")]
    pub auto_confirm: bool,

    /// Channels that never report a falling edge
    #[serde(default)]
    pub faulty_channels: Vec<usize>,

    #[serde(default)]
    pub chassis: ChassisConfig,

    #[serde(default)]
    pub line: LineConfig,
}

fn default_spacing_mm() -> f32 {
    200.0
}
fn default_noise_ticks() -> f32 {
    2.0
}
fn default_white_ticks() -> u16 {
    10
}
fn default_black_ticks() -> u16 {
    90
}
fn default_time_limit_s() -> f32 {
    600.0
}
fn default_true() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            maze_file: None,
            spacing_mm: default_spacing_mm(),
            random_seed: 0,
            noise_ticks: default_noise_ticks(),
            white_ticks: default_white_ticks(),
            black_ticks: default_black_ticks(),
            time_limit_s: default_time_limit_s(),
            auto_confirm: true,
            faulty_channels: Vec::new(),
            chassis: ChassisConfig::default(),
            line: LineConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Reject geometry and timing the simulator cannot run
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("spacing_mm", self.spacing_mm),
            ("time_limit_s", self.time_limit_s),
            ("chassis.track_width_mm", self.chassis.track_width_mm),
            ("chassis.max_track_speed_mm_s", self.chassis.max_track_speed_mm_s),
            ("chassis.sensor_pitch_mm", self.chassis.sensor_pitch_mm),
            ("line.line_width_mm", self.line.line_width_mm),
            ("line.edge_blur_mm", self.line.edge_blur_mm),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "device.simulation.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.noise_ticks < 0.0 {
            return Err(Error::Config(
                "device.simulation.noise_ticks must not be negative".to_string(),
            ));
        }
        if self.white_ticks >= self.black_ticks {
            return Err(Error::Config(format!(
                "device.simulation.white_ticks ({}) must be below black_ticks ({})",
                self.white_ticks, self.black_ticks
            )));
        }
        if let Some(&channel) = self.faulty_channels.iter().find(|&&c| c >= SENSOR_COUNT) {
            return Err(Error::Config(format!(
                "device.simulation.faulty_channels: no channel {}",
                channel
            )));
        }
        Ok(())
    }
}
