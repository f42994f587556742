//! First pass through an unknown maze
//!
//! Left-hand rule: prefer left, else straight, else right, else turn around.
//!
//! | Node | Reaction | Maneuver |
//! |------|----------|----------|
//! | MazeEnd | `F` | none, exploration ends |
//! | FullCross, StraightLeftCross, LeftRightCross | `L` | turn left, 1 line |
//! | StraightRightCross | `S` | none |
//! | DeadEnd | `T` | spin right onto the entry line |
//! | LeftTurn | `l` (not recorded) | turn left, 1 line |
//! | RightTurn | `r` (not recorded) | turn right, 1 line |

use super::{Navigator, NodeVisit};
use crate::control::maneuver::{spin_to_line, turn};
use crate::control::Robot;
use crate::core::types::{Move, NodeType, Reaction, Spin};
use crate::error::Result;
use crate::route::Route;

/// Left-hand-rule reaction for a classified node
pub fn choose(node: NodeType) -> Reaction {
    match node {
        NodeType::MazeEnd => Reaction::Move(Move::Finish),
        NodeType::FullCross | NodeType::StraightLeftCross | NodeType::LeftRightCross => {
            Reaction::Move(Move::Left)
        }
        NodeType::StraightRightCross => Reaction::Move(Move::Straight),
        NodeType::DeadEnd => Reaction::Move(Move::TurnAround),
        NodeType::LeftTurn => Reaction::Forced(Spin::Left),
        NodeType::RightTurn => Reaction::Forced(Spin::Right),
    }
}

/// Result of one exploration run
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    /// Recorded reactions, terminated by `F`
    pub route: Route,
    pub visits: Vec<NodeVisit>,
}

/// Explores with the left-hand rule, recording every decision
pub struct Explorer<'a> {
    navigator: &'a Navigator,
    capacity: usize,
}

impl<'a> Explorer<'a> {
    pub fn new(navigator: &'a Navigator, capacity: usize) -> Self {
        Self { navigator, capacity }
    }

    /// Run until the maze exit, returning the raw route
    pub fn explore(&self, robot: &mut Robot, speed: u8) -> Result<Exploration> {
        let mut route = Route::with_capacity(self.capacity);
        let mut visits = Vec::new();
        log::info!("Exploring at {}%", speed);

        loop {
            let (arrival, exit, node) = self.navigator.approach(robot, speed)?;
            let reaction = choose(node);
            let visit = NodeVisit {
                arrival,
                exit,
                node,
                reaction,
            };
            self.navigator.report(&visit);
            visits.push(visit);

            if let Some(m) = reaction.recorded() {
                route.push(m)?;
            }
            perform(robot, reaction, speed)?;

            if reaction.is_finish() {
                break;
            }
        }

        log::info!("Exploration finished after {} nodes: {}", visits.len(), route);
        Ok(Exploration { route, visits })
    }
}

fn perform(robot: &mut Robot, reaction: Reaction, speed: u8) -> Result<()> {
    match reaction {
        Reaction::Move(Move::Left) | Reaction::Forced(Spin::Left) => turn(robot, Spin::Left, speed, 1),
        Reaction::Move(Move::Right) | Reaction::Forced(Spin::Right) => {
            turn(robot, Spin::Right, speed, 1)
        }
        Reaction::Move(Move::TurnAround) => spin_to_line(robot, Spin::Right, speed),
        Reaction::Move(Move::Straight) | Reaction::Move(Move::Finish) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MargaConfig;
    use crate::core::types::Command;
    use crate::devices::scripted::{RecordingDriver, ScriptedLine};
    use crate::error::Error;
    use crate::streaming::Diagnostics;

    /// No pass-through delay: the exit reading is the sample after the scan
    fn navigator() -> Navigator {
        let mut config = MargaConfig::default();
        config.drive.pass_through_ms = 0;
        Navigator::new(&config, Diagnostics::disabled())
    }

    #[test]
    fn test_left_hand_rule() {
        assert_eq!(choose(NodeType::FullCross), Reaction::Move(Move::Left));
        assert_eq!(choose(NodeType::LeftRightCross), Reaction::Move(Move::Left));
        assert_eq!(choose(NodeType::StraightLeftCross), Reaction::Move(Move::Left));
        assert_eq!(choose(NodeType::StraightRightCross), Reaction::Move(Move::Straight));
        assert_eq!(choose(NodeType::DeadEnd), Reaction::Move(Move::TurnAround));
        assert_eq!(choose(NodeType::MazeEnd), Reaction::Move(Move::Finish));
        assert_eq!(choose(NodeType::LeftTurn), Reaction::Forced(Spin::Left));
        assert_eq!(choose(NodeType::RightTurn), Reaction::Forced(Spin::Right));
    }

    #[test]
    fn test_dead_end_then_finish() {
        // Follow, dead end, spin back onto the line, follow, finish pad
        let line = ScriptedLine::parse(
            "001100 001100 000000 \
             000000 000000 100000 001100 \
             001100 001100 101101",
        )
        .unwrap();
        let driver = RecordingDriver::new();
        let mut robot = Robot::new(Box::new(driver.clone()), Box::new(line));
        let nav = navigator();

        let exploration = Explorer::new(&nav, 100).explore(&mut robot, 45).unwrap();
        assert_eq!(exploration.route.to_string(), "TF");
        assert_eq!(exploration.visits.len(), 2);
        assert_eq!(exploration.visits[0].node, NodeType::DeadEnd);
        assert!(driver.commands().contains(&Command::spin(Spin::Right, 45)));
    }

    #[test]
    fn test_forced_turn_not_recorded() {
        // Left corner: 111100 then blank, turn left onto the new line, then finish
        let line = ScriptedLine::parse(
            "001100 111100 111100 000000 000000 \
             000000 110000 001100 \
             001100 101101",
        )
        .unwrap();
        let driver = RecordingDriver::new();
        let mut robot = Robot::new(Box::new(driver.clone()), Box::new(line));
        let nav = navigator();

        let exploration = Explorer::new(&nav, 100).explore(&mut robot, 45).unwrap();
        assert_eq!(exploration.route.to_string(), "F");
        assert_eq!(exploration.visits[0].reaction, Reaction::Forced(Spin::Left));
        assert_eq!(exploration.visits[0].node, NodeType::LeftTurn);
    }

    #[test]
    fn test_route_overflow_is_reported() {
        // Endless dead ends with a two-entry budget
        let mut script = String::new();
        for _ in 0..5 {
            script.push_str("001100 000000 000000 001100 ");
        }
        let line = ScriptedLine::parse(&script).unwrap().with_hold(0);
        let mut robot = Robot::new(Box::new(RecordingDriver::new()), Box::new(line));
        let nav = navigator();

        let result = Explorer::new(&nav, 2).explore(&mut robot, 45);
        assert!(matches!(result, Err(Error::RouteOverflow { capacity: 2 })));
    }
}
