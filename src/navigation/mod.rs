//! Maze navigation: exploration, replay and the three-phase mission
//!
//! ```text
//!            ┌──────────── per node ─────────────┐
//!  follower ─▶ drive_to_node ─▶ check_node ─▶ reaction
//!                                              │
//!                     explore: left-hand rule, append to raw route
//!                     replay:  read next move from optimized route
//! ```
//!
//! Both passes share [`Navigator`], which owns the follower, the classifier
//! and the diagnostic handle, and emits one [`NodeVisit`] per node.

pub mod explorer;
pub mod mission;
pub mod replay;

pub use explorer::{Exploration, Explorer};
pub use mission::{AttemptReport, Mission, MissionReport};
pub use replay::Replayer;

use crate::config::MargaConfig;
use crate::control::{LineFollower, NodeClassifier, Robot};
use crate::core::types::{LineState, NodeType, Reaction};
use crate::error::Result;
use crate::streaming::{DiagnosticEvent, Diagnostics};

/// What happened at one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVisit {
    /// Reading that stopped the follower
    pub arrival: LineState,
    /// Reading after classification
    pub exit: LineState,
    pub node: NodeType,
    pub reaction: Reaction,
}

/// Follow the line to the next node and classify it
pub struct Navigator {
    follower: LineFollower,
    classifier: NodeClassifier,
    diagnostics: Diagnostics,
}

impl Navigator {
    pub fn new(config: &MargaConfig, diagnostics: Diagnostics) -> Self {
        Self {
            follower: LineFollower::new(&config.pid),
            classifier: NodeClassifier::new(config.drive.pass_through_ms),
            diagnostics,
        }
    }

    /// Drive to the next node; returns (arrival, exit, node)
    pub fn approach(&self, robot: &mut Robot, speed: u8) -> Result<(LineState, LineState, NodeType)> {
        let arrival = self.follower.drive_to_node(robot, speed)?;
        let node = self.classifier.check_node(robot, arrival, speed)?;
        Ok((arrival, robot.last_line(), node))
    }

    /// Log and stream a visit before its maneuver starts
    pub fn report(&self, visit: &NodeVisit) {
        log::debug!(
            "Node {:?} ({} -> {}): {}",
            visit.node,
            visit.arrival,
            visit.exit,
            visit.reaction
        );
        self.diagnostics.send(DiagnosticEvent::Visit(*visit));
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
