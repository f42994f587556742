//! Node classifier
//!
//! Called with the reading that stopped the follower.
//!
//! ```text
//!  arrival ──▶ 000000 ? ──yes──▶ DeadEnd
//!     │         101101 ? ──yes──▶ MazeEnd
//!     ▼
//!  crossing scan: drive forward, latch left (111100 bits) and
//!  right (001111 bits) until the bar reads blank or centred
//!     ▼
//!  pass-through delay, exit reading ("photo"), stop
//!     ▼
//!  decide(exit line?, left?, right?)
//! ```
//!
//! | Exit line | Left | Right | Node |
//! |-----------|------|-------|------|
//! | no | yes | yes | LeftRightCross |
//! | no | yes | no | LeftTurn |
//! | no | no | yes | RightTurn |
//! | yes | yes | yes | FullCross |
//! | yes | yes | no | StraightLeftCross |
//! | yes | no | yes | StraightRightCross |
//! | any | no | no | error: ambiguous |

use super::robot::Robot;
use crate::core::types::{LineState, NodeType};
use crate::error::{Error, Result};

/// Truth table for decision nodes. `None` when no branch was seen.
pub fn decide(exit_line: bool, left: bool, right: bool) -> Option<NodeType> {
    match (exit_line, left, right) {
        (false, true, true) => Some(NodeType::LeftRightCross),
        (false, true, false) => Some(NodeType::LeftTurn),
        (false, false, true) => Some(NodeType::RightTurn),
        (true, true, true) => Some(NodeType::FullCross),
        (true, true, false) => Some(NodeType::StraightLeftCross),
        (true, false, true) => Some(NodeType::StraightRightCross),
        (_, false, false) => None,
    }
}

/// A single centre sensor counts as the two-sensor centre reading
pub fn normalize_exit(photo: LineState) -> LineState {
    if photo.is_centered() {
        LineState::CENTER
    } else {
        photo
    }
}

/// Branch flags latched during the crossing scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Branches {
    pub left: bool,
    pub right: bool,
}

impl Branches {
    /// Latch flags seen in one reading
    pub fn observe(&mut self, state: LineState) {
        self.left |= state.contains(LineState::LEFT);
        self.right |= state.contains(LineState::RIGHT);
    }
}

/// Drives through intersections and names them
#[derive(Debug, Clone)]
pub struct NodeClassifier {
    pass_through_ms: u64,
}

impl NodeClassifier {
    pub fn new(pass_through_ms: u64) -> Self {
        Self { pass_through_ms }
    }

    /// Classify the node the follower stopped at
    pub fn check_node(&self, robot: &mut Robot, arrival: LineState, speed: u8) -> Result<NodeType> {
        if arrival == LineState::EMPTY {
            return Ok(NodeType::DeadEnd);
        }
        if arrival == LineState::FINISH {
            return Ok(NodeType::MazeEnd);
        }

        robot.forward(speed)?;
        let mut branches = Branches::default();
        let mut state = arrival;
        while state != LineState::EMPTY && !state.is_centered() {
            branches.observe(state);
            state = robot.read_line()?;
        }

        robot.delay_ms(self.pass_through_ms)?;
        let photo = normalize_exit(robot.read_line()?);
        robot.stop()?;

        let exit_line = photo != LineState::EMPTY;
        match decide(exit_line, branches.left, branches.right) {
            Some(node) => {
                log::debug!(
                    "Node {:?}: left={} right={} exit={}",
                    node,
                    branches.left,
                    branches.right,
                    photo
                );
                Ok(node)
            }
            None => {
                log::error!("No branch seen at non-terminal node, exit reading {}", photo);
                Err(Error::AmbiguousNode { line_state: photo })
            }
        }
    }
}
