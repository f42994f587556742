//! Three-phase maze mission
//!
//! ```text
//!  button ─▶ calibrate
//!     │
//!     └─▶ for each attempt:
//!           button ─▶ explore ─▶ double beep ─▶ optimize ─▶ route dump
//!           button ─▶ replay  ─▶ double beep
//! ```
//!
//! Every button press is followed by a settle delay so the operator's hand is
//! clear before the tracks move. Any error stops the tracks and ends the
//! mission.

use super::explorer::{Exploration, Explorer};
use super::replay::Replayer;
use super::{Navigator, NodeVisit};
use crate::config::MargaConfig;
use crate::control::maneuver::calibrate;
use crate::control::Robot;
use crate::core::types::BeepPattern;
use crate::error::{Error, Result};
use crate::route::{optimize, Route};
use crate::streaming::{DiagnosticEvent, Diagnostics};

/// One explore/replay cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptReport {
    pub raw: Route,
    pub optimized: Route,
    pub exploration: Vec<NodeVisit>,
    pub replay: Vec<NodeVisit>,
}

/// Everything a finished mission produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionReport {
    pub attempts: Vec<AttemptReport>,
}

/// Sequences calibration, exploration and replay
pub struct Mission {
    config: MargaConfig,
    navigator: Navigator,
}

impl Mission {
    pub fn new(config: MargaConfig, diagnostics: Diagnostics) -> Self {
        let navigator = Navigator::new(&config, diagnostics);
        Self { config, navigator }
    }

    /// Run every phase; the tracks are stopped before an error is returned
    pub fn run(&self, robot: &mut Robot) -> Result<MissionReport> {
        let result = self.run_phases(robot);
        if let Err(e) = &result {
            log::error!("Mission aborted: {}", e);
            self.message(&format!("Error: {}", e));
            if let Err(stop_err) = robot.stop() {
                log::warn!("Failed to stop tracks: {}", stop_err);
            }
        }
        result
    }

    fn run_phases(&self, robot: &mut Robot) -> Result<MissionReport> {
        let drive = &self.config.drive;

        self.message("Press button to calibrate");
        self.confirm(robot)?;
        calibrate(robot, drive.calibration_speed, drive.calibration_spin_ms)?;

        let mut report = MissionReport::default();
        for attempt in 1..=self.config.mission.attempts {
            log::info!("Attempt {}/{}", attempt, self.config.mission.attempts);
            report.attempts.push(self.attempt(robot)?);
        }
        Ok(report)
    }

    fn attempt(&self, robot: &mut Robot) -> Result<AttemptReport> {
        let drive = &self.config.drive;

        self.message("Press button to explore");
        self.confirm(robot)?;
        if !robot.is_calibrated() {
            return Err(Error::NotCalibrated);
        }
        let Exploration { route: raw, visits } =
            Explorer::new(&self.navigator, self.config.route.max_nodes).explore(robot, drive.explore_speed)?;
        robot.beep(BeepPattern::Double)?;

        let optimized = optimize(&raw)?;
        log::info!("Route {} optimized to {}", raw, optimized);
        self.navigator.diagnostics().send(DiagnosticEvent::RawRoute(raw.clone()));
        self.navigator
            .diagnostics()
            .send(DiagnosticEvent::OptimizedRoute(optimized.clone()));

        self.message("Press button to replay");
        self.confirm(robot)?;
        let replay = Replayer::new(&self.navigator).replay(robot, &optimized, drive.replay_speed)?;
        robot.beep(BeepPattern::Double)?;

        Ok(AttemptReport {
            raw,
            optimized,
            exploration: visits,
            replay,
        })
    }

    /// Wait for the button, then let the settle delay pass
    fn confirm(&self, robot: &mut Robot) -> Result<()> {
        robot.wait_for_button(self.config.drive.button_poll_ms)?;
        robot.delay_ms(self.config.drive.button_settle_ms)
    }

    fn message(&self, text: &str) {
        self.navigator.diagnostics().message(text);
    }
}
