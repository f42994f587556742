//! Per-channel discharge reading and calibration bounds

/// One reflectance sensor
///
/// Darker surfaces discharge the capacitor more slowly, so a larger reading
/// means less reflected light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorChannel {
    reading: u16,
    min: u16,
    max: u16,
    initialized: bool,
}

impl SensorChannel {
    /// Create an unread channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a discharge time. The first reading also resets min and max.
    pub fn record(&mut self, ticks: u16) {
        self.reading = ticks;
        if !self.initialized {
            self.min = ticks;
            self.max = ticks;
            self.initialized = true;
        }
    }

    /// Widen the calibration bounds to include the current reading
    pub fn calibrate(&mut self) {
        if !self.initialized {
            return;
        }
        self.min = self.min.min(self.reading);
        self.max = self.max.max(self.reading);
    }

    /// Latest discharge time
    #[inline]
    pub fn reading(&self) -> u16 {
        self.reading
    }

    /// Smallest reading seen while calibrating
    #[inline]
    pub fn min(&self) -> u16 {
        self.min
    }

    /// Largest reading seen while calibrating
    #[inline]
    pub fn max(&self) -> u16 {
        self.max
    }

    /// Has been read at least once
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Calibration bounds have separated
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.initialized && self.min < self.max
    }

    /// Reflectance percentage: `100 - 100 * (reading - min) / (max - min)`.
    ///
    /// `None` until the bounds have separated. Readings outside the bounds
    /// give values outside 0..=100.
    pub fn reflectance(&self) -> Option<i32> {
        if !self.is_calibrated() {
            return None;
        }
        let span = self.max as i32 - self.min as i32;
        let offset = self.reading as i32 - self.min as i32;
        Some(100 - 100 * offset / span)
    }

    /// Line under this sensor: reflectance below `switching_level`.
    /// An uncalibrated channel never reports line.
    pub fn sees_line(&self, switching_level: i32) -> bool {
        self.reflectance().is_some_and(|r| r < switching_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_read_resets_bounds() {
        let mut ch = SensorChannel::new();
        ch.record(40);
        assert_eq!((ch.min(), ch.max()), (40, 40));
        ch.record(90);
        assert_eq!((ch.min(), ch.max()), (40, 40));
        assert_eq!(ch.reading(), 90);
    }

    #[test]
    fn test_uncalibrated_channel_is_guarded() {
        let mut ch = SensorChannel::new();
        assert_eq!(ch.reflectance(), None);
        ch.record(50);
        ch.calibrate();
        assert_eq!(ch.reflectance(), None);
        assert!(!ch.sees_line(50));
    }

    #[test]
    fn test_reflectance_percentages() {
        let mut ch = SensorChannel::new();
        ch.record(10);
        ch.record(90);
        ch.calibrate();
        assert!(ch.is_calibrated());

        assert_eq!(ch.reflectance(), Some(0));
        assert!(ch.sees_line(50));

        ch.record(10);
        assert_eq!(ch.reflectance(), Some(100));
        assert!(!ch.sees_line(50));

        ch.record(50);
        assert_eq!(ch.reflectance(), Some(50));
        assert!(!ch.sees_line(50), "exactly 50% is not below the threshold");

        ch.record(51);
        assert!(ch.sees_line(50));
    }

    #[test]
    fn test_calibrate_only_widens() {
        let mut ch = SensorChannel::new();
        ch.record(30);
        ch.record(20);
        ch.calibrate();
        ch.record(80);
        ch.calibrate();
        ch.record(50);
        ch.calibrate();
        assert_eq!((ch.min(), ch.max()), (20, 80));
    }
}
