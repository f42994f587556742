//! Configuration for Marga
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) yields a configuration tuned for the Zumo chassis.
//!
//! ```toml
//! [drive]
//! explore_speed = 45
//! replay_speed = 35
//!
//! [pid]
//! kp = 15
//! ki_divisor = 256
//! kd = 1
//!
//! [device]
//! type = "mock"
//!
//! [device.simulation]
//! maze_file = "mazes/ladder.txt"
//! ```

use crate::devices::mock::config::SimulationConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Largest accepted `kp` / `kd`; keeps the steering term within `i32`
pub const MAX_PID_GAIN: i32 = 10_000;

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub pid: PidConfig,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub mission: MissionConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RC-discharge timing, in ticks of the 32768 Hz acquisition clock
#[derive(Clone, Debug, Deserialize)]
pub struct SensorsConfig {
    /// Capacitor charge time before the discharge measurement (default: 5)
    #[serde(default = "default_charge_ticks")]
    pub charge_ticks: u16,

    /// Safety bound for a channel that never falls (default: 0xFFFF)
    #[serde(default = "default_timeout_ticks")]
    pub timeout_ticks: u16,

    /// Reflectance percentage below which a channel reports line (default: 50)
    #[serde(default = "default_switching_level")]
    pub switching_level: i32,
}

/// Base speeds and fixed delays
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Spin speed while calibrating (default: 30)
    #[serde(default = "default_calibration_speed")]
    pub calibration_speed: u8,

    /// Base speed during exploration (default: 45)
    #[serde(default = "default_explore_speed")]
    pub explore_speed: u8,

    /// Base speed during the confirmation run (default: 35)
    #[serde(default = "default_replay_speed")]
    pub replay_speed: u8,

    /// Forward travel after the crossing scan before the exit reading (default: 100)
    #[serde(default = "default_pass_through_ms")]
    pub pass_through_ms: u64,

    /// Minimum spin time while calibrating (default: 2000)
    #[serde(default = "default_calibration_spin_ms")]
    pub calibration_spin_ms: u64,

    /// Pause after the operator confirms, before moving (default: 1000)
    #[serde(default = "default_button_settle_ms")]
    pub button_settle_ms: u64,

    /// Button polling period (default: 10)
    #[serde(default = "default_button_poll_ms")]
    pub button_poll_ms: u64,
}

/// Fixed-point PID gains
#[derive(Clone, Debug, Deserialize)]
pub struct PidConfig {
    /// Proportional gain (default: 15)
    #[serde(default = "default_kp")]
    pub kp: i32,

    /// Integral divisor (default: 256)
    #[serde(default = "default_ki_divisor")]
    pub ki_divisor: i32,

    /// Derivative gain (default: 1)
    #[serde(default = "default_kd")]
    pub kd: i32,
}

/// Route recorder limits
#[derive(Clone, Debug, Deserialize)]
pub struct RouteConfig {
    /// Maximum recorded reactions per exploration (default: 100)
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

/// Mission sequencing
#[derive(Clone, Debug, Deserialize)]
pub struct MissionConfig {
    /// Explore/replay cycles after the single calibration (default: 1)
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

/// Device selection
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device type (default: "mock")
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Simulation parameters for the mock device
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Diagnostic stream destination
#[derive(Clone, Debug, Deserialize)]
pub struct DiagnosticsConfig {
    /// "stdout", "stderr" or a file path (default: "stdout")
    #[serde(default = "default_diagnostics_output")]
    pub output: String,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl MargaConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: MargaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, speed) in [
            ("drive.calibration_speed", self.drive.calibration_speed),
            ("drive.explore_speed", self.drive.explore_speed),
            ("drive.replay_speed", self.drive.replay_speed),
        ] {
            if speed > 100 {
                return Err(Error::Config(format!("{} must be 0..=100, got {}", name, speed)));
            }
        }
        for (name, gain) in [("pid.kp", self.pid.kp), ("pid.kd", self.pid.kd)] {
            if !(0..=MAX_PID_GAIN).contains(&gain) {
                return Err(Error::Config(format!(
                    "{} must be 0..={}, got {}",
                    name, MAX_PID_GAIN, gain
                )));
            }
        }
        if self.pid.ki_divisor <= 0 {
            return Err(Error::Config(format!(
                "pid.ki_divisor must be positive, got {}",
                self.pid.ki_divisor
            )));
        }
        if !(1..=99).contains(&self.sensors.switching_level) {
            return Err(Error::Config(format!(
                "sensors.switching_level must be 1..=99, got {}",
                self.sensors.switching_level
            )));
        }
        if self.sensors.timeout_ticks <= self.sensors.charge_ticks {
            return Err(Error::Config(
                "sensors.timeout_ticks must exceed sensors.charge_ticks".to_string(),
            ));
        }
        if self.route.max_nodes < 2 {
            return Err(Error::Config(format!(
                "route.max_nodes must be at least 2, got {}",
                self.route.max_nodes
            )));
        }
        if self.drive.button_poll_ms == 0 {
            return Err(Error::Config("drive.button_poll_ms must be positive".to_string()));
        }
        self.device.simulation.validate()
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            charge_ticks: default_charge_ticks(),
            timeout_ticks: default_timeout_ticks(),
            switching_level: default_switching_level(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            calibration_speed: default_calibration_speed(),
            explore_speed: default_explore_speed(),
            replay_speed: default_replay_speed(),
            pass_through_ms: default_pass_through_ms(),
            calibration_spin_ms: default_calibration_spin_ms(),
            button_settle_ms: default_button_settle_ms(),
            button_poll_ms: default_button_poll_ms(),
        }
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki_divisor: default_ki_divisor(),
            kd: default_kd(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            output: default_diagnostics_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_charge_ticks() -> u16 {
    5
}
fn default_timeout_ticks() -> u16 {
    0xFFFF
}
fn default_switching_level() -> i32 {
    50
}
fn default_calibration_speed() -> u8 {
    30
}
fn default_explore_speed() -> u8 {
    45
}
fn default_replay_speed() -> u8 {
    35
}
fn default_pass_through_ms() -> u64 {
    100
}
fn default_calibration_spin_ms() -> u64 {
    2000
}
fn default_button_settle_ms() -> u64 {
    1000
}
fn default_button_poll_ms() -> u64 {
    10
}
fn default_kp() -> i32 {
    15
}
fn default_ki_divisor() -> i32 {
    256
}
fn default_kd() -> i32 {
    1
}
fn default_max_nodes() -> usize {
    100
}
fn default_attempts() -> u32 {
    1
}
fn default_device_type() -> String {
    "mock".to_string()
}
fn default_diagnostics_output() -> String {
    "stdout".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = MargaConfig::from_toml("").unwrap();
        assert_eq!(config.sensors.charge_ticks, 5);
        assert_eq!(config.sensors.timeout_ticks, 0xFFFF);
        assert_eq!(config.drive.explore_speed, 45);
        assert_eq!(config.drive.replay_speed, 35);
        assert_eq!(config.pid.kp, 15);
        assert_eq!(config.pid.ki_divisor, 256);
        assert_eq!(config.route.max_nodes, 100);
        assert_eq!(config.device.device_type, "mock");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
            [drive]
            explore_speed = 50

            [pid]
            kd = 3

            [device.simulation]
            noise_ticks = 1.5
        "#;
        let config = MargaConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.drive.explore_speed, 50);
        assert_eq!(config.drive.replay_speed, 35);
        assert_eq!(config.pid.kd, 3);
        assert_eq!(config.pid.kp, 15);
        assert_eq!(config.device.simulation.noise_ticks, 1.5);
    }

    #[test]
    fn test_rejects_out_of_range_speed() {
        let err = MargaConfig::from_toml("[drive]\nreplay_speed = 120\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_integral_divisor() {
        let err = MargaConfig::from_toml("[pid]\nki_divisor = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_out_of_range_gains() {
        let err = MargaConfig::from_toml("[pid]\nkp = 2000000000\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = MargaConfig::from_toml("[pid]\nkd = -1\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = MargaConfig::from_toml("[pid]\nkp = 10000\nkd = 10000\n").unwrap();
        assert_eq!(config.pid.kp, MAX_PID_GAIN);
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = MargaConfig::from_toml("[drive\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
