//! Reflectance sensor acquisition
//!
//! - [`channel`]: one RC-discharge channel with calibration bounds
//! - [`acquisition`]: the per-cycle state machine that turns six discharge
//!   times into a [`LineState`](crate::core::types::LineState)
//! - [`publish`]: versioned hand-off from the producer to the control loop

pub mod acquisition;
pub mod channel;
pub mod publish;

pub use acquisition::{Acquisition, SensorControl};
pub use channel::SensorChannel;
pub use publish::{line_channel, LinePublisher, LineSubscriber};

use crate::core::driver::LineSource;
use crate::core::types::LineSample;
use crate::error::Result;
use std::sync::Arc;

/// Control-loop end of the acquisition pipeline
pub struct SensorLink {
    subscriber: LineSubscriber,
    control: Arc<SensorControl>,
}

impl SensorLink {
    pub fn new(subscriber: LineSubscriber, control: Arc<SensorControl>) -> Self {
        Self {
            subscriber,
            control,
        }
    }
}

impl LineSource for SensorLink {
    fn next_sample(&mut self) -> Result<LineSample> {
        self.subscriber.next()
    }

    fn set_calibration(&mut self, enabled: bool) {
        log::debug!("Calibration {}", if enabled { "enabled" } else { "disabled" });
        self.control.set_calibration(enabled);
    }

    fn is_calibrated(&self) -> bool {
        self.control.is_calibrated()
    }
}
