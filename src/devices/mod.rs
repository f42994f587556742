//! Device implementations

pub mod mock;
pub mod scripted;

use crate::config::MargaConfig;
use crate::core::driver::{LineSource, RobotDriver};
use crate::error::{Error, Result};
use mock::MockDriver;

/// A driver and the line source paired with it
pub struct Device {
    pub driver: Box<dyn RobotDriver>,
    pub line: Box<dyn LineSource>,
}

/// Create a device based on configuration
pub fn create_device(config: &MargaConfig) -> Result<Device> {
    match config.device.device_type.as_str() {
        "mock" => {
            let (driver, line) = MockDriver::new(config)?;
            Ok(Device {
                driver: Box::new(driver),
                line: Box::new(line),
            })
        }
        _ => Err(Error::UnknownDevice(config.device.device_type.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device() {
        let mut config = MargaConfig::default();
        config.device.device_type = "zumo32u4".to_string();
        assert!(matches!(create_device(&config), Err(Error::UnknownDevice(t)) if t == "zumo32u4"));
    }

    #[test]
    fn test_mock_device() {
        assert!(create_device(&MargaConfig::default()).is_ok());
    }
}
