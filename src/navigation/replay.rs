//! Confirmation run over the optimized route
//!
//! Forced corners are handled locally; every other node consumes one symbol.
//!
//! | Node | Symbol | Maneuver |
//! |------|--------|----------|
//! | LeftTurn / RightTurn | none | turn that way, 1 line |
//! | DeadEnd | `T` | leave line, settle on the entry line |
//! | MazeEnd | `F` | stop, run ends |
//! | decision | `S` | none |
//! | decision | `L` / `R` | turn that way, 1 line |
//! | FullCross, LeftRightCross | `T` | spin right, 2 lines |
//! | StraightLeftCross | `T` | spin right, 1 line |
//! | StraightRightCross | `T` | spin left, 1 line |
//!
//! A turn-around at a cross spins toward the side with fewer branch lines
//! between the exit and the entry, counting the lines it must pass.

use super::{Navigator, NodeVisit};
use crate::control::maneuver::turn;
use crate::control::Robot;
use crate::core::types::{Move, NodeType, Reaction, Spin};
use crate::error::{Error, Result};
use crate::route::{Route, RouteCursor};

/// True when the node has a branch `m` can take
fn offers(node: NodeType, m: Move) -> bool {
    use NodeType::*;
    match m {
        Move::TurnAround => node.is_decision() || node == DeadEnd,
        Move::Straight => matches!(node, FullCross | StraightLeftCross | StraightRightCross),
        Move::Left => matches!(node, FullCross | StraightLeftCross | LeftRightCross),
        Move::Right => matches!(node, FullCross | StraightRightCross | LeftRightCross),
        Move::Finish => node == MazeEnd,
    }
}

/// Spin direction and line count for a turn-around at a decision node
fn turn_around(node: NodeType) -> (Spin, usize) {
    match node {
        NodeType::StraightLeftCross => (Spin::Right, 1),
        NodeType::StraightRightCross => (Spin::Left, 1),
        _ => (Spin::Right, 2),
    }
}

/// Re-drives a route node by node
pub struct Replayer<'a> {
    navigator: &'a Navigator,
}

impl<'a> Replayer<'a> {
    pub fn new(navigator: &'a Navigator) -> Self {
        Self { navigator }
    }

    /// Drive `route` until MazeEnd
    pub fn replay(&self, robot: &mut Robot, route: &Route, speed: u8) -> Result<Vec<NodeVisit>> {
        let mut cursor = route.cursor();
        let mut visits = Vec::new();
        log::info!("Replaying {} at {}%", route, speed);

        loop {
            let (arrival, exit, node) = self.navigator.approach(robot, speed)?;
            let reaction = match next_reaction(node, &mut cursor) {
                Ok(reaction) => reaction,
                Err(e) => {
                    log::error!("Replay failed at {:?} after {} symbols: {}", node, cursor.consumed(), e);
                    return Err(e);
                }
            };
            let visit = NodeVisit {
                arrival,
                exit,
                node,
                reaction,
            };
            self.navigator.report(&visit);
            visits.push(visit);

            perform(robot, node, reaction, speed)?;
            if reaction.is_finish() {
                break;
            }
        }

        if cursor.remaining() > 0 {
            log::warn!("Replay reached the exit with {} symbols unused", cursor.remaining());
        }
        log::info!("Replay finished after {} nodes", visits.len());
        Ok(visits)
    }
}

/// Reaction for `node`, consuming a route symbol unless the corner is forced
fn next_reaction(node: NodeType, cursor: &mut RouteCursor<'_>) -> Result<Reaction> {
    match node {
        NodeType::LeftTurn => return Ok(Reaction::Forced(Spin::Left)),
        NodeType::RightTurn => return Ok(Reaction::Forced(Spin::Right)),
        _ => {}
    }

    let m = cursor.next_move()?;
    let valid = match node {
        NodeType::DeadEnd => m == Move::TurnAround,
        NodeType::MazeEnd => m == Move::Finish,
        _ => offers(node, m),
    };
    if !valid {
        return Err(Error::RouteMismatch { node, found: m });
    }
    Ok(Reaction::Move(m))
}

fn perform(robot: &mut Robot, node: NodeType, reaction: Reaction, speed: u8) -> Result<()> {
    match reaction {
        Reaction::Forced(direction) => turn(robot, direction, speed, 1),
        Reaction::Move(Move::Left) => turn(robot, Spin::Left, speed, 1),
        Reaction::Move(Move::Right) => turn(robot, Spin::Right, speed, 1),
        Reaction::Move(Move::TurnAround) if node == NodeType::DeadEnd => turn(robot, Spin::Right, speed, 1),
        Reaction::Move(Move::TurnAround) => {
            let (direction, lines) = turn_around(node);
            turn(robot, direction, speed, lines)
        }
        Reaction::Move(Move::Straight) | Reaction::Move(Move::Finish) => Ok(()),
    }
}
