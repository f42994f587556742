//! Turn-around collapsing optimizer
//!
//! A dead end shows up in the raw route as `X T Y`: the robot took branch
//! `X`, hit a wall, came back and took `Y`. Each such triple is equivalent
//! to a single move from the original heading:
//!
//! | Before | After | Collapsed |
//! |--------|-------|-----------|
//! | L | R | T |
//! | L | S | R |
//! | R | L | T |
//! | S | L | R |
//! | S | S | T |
//! | L | L | S |
//!
//! A pass scans left to right, replacing each matching triple and skipping
//! past it. Passes repeat until one makes no replacement. Triples not in the
//! table are kept as they are, so Finish is never touched.

use super::buffer::Route;
use crate::core::types::Move;
use crate::error::Result;

/// Single move equivalent to `before, TurnAround, after`, if one is defined
pub fn collapse(before: Move, after: Move) -> Option<Move> {
    use Move::*;
    match (before, after) {
        (Left, Right) => Some(TurnAround),
        (Left, Straight) => Some(Right),
        (Right, Left) => Some(TurnAround),
        (Straight, Left) => Some(Right),
        (Straight, Straight) => Some(TurnAround),
        (Left, Left) => Some(Straight),
        _ => None,
    }
}

/// One left-to-right pass. Returns the rewritten moves and whether anything
/// collapsed.
pub fn optimize_pass(moves: &[Move]) -> (Vec<Move>, bool) {
    let mut out = Vec::with_capacity(moves.len());
    let mut compressed = false;
    let mut i = 0;

    while i < moves.len() {
        let collapsed = match (moves.get(i + 1), moves.get(i + 2)) {
            (Some(Move::TurnAround), Some(&after)) => collapse(moves[i], after),
            _ => None,
        };
        match collapsed {
            Some(m) => {
                out.push(m);
                compressed = true;
                i += 3;
            }
            None => {
                out.push(moves[i]);
                i += 1;
            }
        }
    }

    (out, compressed)
}

/// Rewrite to a fixed point, keeping the source route's capacity
pub fn optimize(route: &Route) -> Result<Route> {
    let mut moves = route.moves().to_vec();
    let mut passes = 0usize;

    loop {
        let (next, compressed) = optimize_pass(&moves);
        passes += 1;
        moves = next;
        if !compressed {
            break;
        }
    }

    log::debug!(
        "Optimized {} -> {} symbols in {} passes",
        route.len(),
        moves.len(),
        passes
    );

    Route::from_moves(moves, route.capacity())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(s: &str) -> String {
        optimize(&s.parse().unwrap()).unwrap().to_string()
    }

    #[test]
    fn test_collapse_table() {
        use Move::*;
        assert_eq!(collapse(Left, Right), Some(TurnAround));
        assert_eq!(collapse(Left, Straight), Some(Right));
        assert_eq!(collapse(Right, Left), Some(TurnAround));
        assert_eq!(collapse(Straight, Left), Some(Right));
        assert_eq!(collapse(Straight, Straight), Some(TurnAround));
        assert_eq!(collapse(Left, Left), Some(Straight));
        assert_eq!(collapse(Right, Right), None);
        assert_eq!(collapse(Left, Finish), None);
        assert_eq!(collapse(TurnAround, Left), None);
    }

    #[test]
    fn test_single_pass_examples() {
        assert_eq!(opt("LTSF"), "RF");
        assert_eq!(opt("LTRTF"), "TTF");
    }

    #[test]
    fn test_multi_pass() {
        // LTL -> S, then STL -> R
        assert_eq!(opt("LTLTLF"), "RF");
        assert_eq!(opt("SLTSLF"), "SRLF");
    }

    #[test]
    fn test_nothing_to_collapse() {
        assert_eq!(opt("SRLF"), "SRLF");
        assert_eq!(opt("F"), "F");
        assert_eq!(opt(""), "");
    }

    #[test]
    fn test_unmatched_triple_is_kept() {
        assert_eq!(opt("RTRF"), "RTRF");
        // Turn-around directly before Finish
        assert_eq!(opt("LTF"), "LTF");
    }

    #[test]
    fn test_pass_reports_compression() {
        let route: Route = "LTSF".parse().unwrap();
        let (out, compressed) = optimize_pass(route.moves());
        assert!(compressed);
        assert_eq!(out, vec![Move::Right, Move::Finish]);

        let (out, compressed) = optimize_pass(&out);
        assert!(!compressed);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_full_route_keeps_capacity() {
        let route = Route::from_moves(
            [Move::Left, Move::TurnAround, Move::Straight, Move::Finish],
            4,
        )
        .unwrap();
        let optimized = optimize(&route).unwrap();
        assert_eq!(optimized.to_string(), "RF");
        assert_eq!(optimized.capacity(), 4);

        // Already minimal and at capacity: rebuilt whole, nothing dropped
        let full = Route::from_moves([Move::Straight, Move::Right, Move::Finish], 3).unwrap();
        assert_eq!(optimize(&full).unwrap(), full);
    }

    #[test]
    fn test_idempotent_and_never_longer() {
        for raw in ["LTLTLF", "SLTSLF", "LLTLTRTSF", "STSTLF", "LTRTLTRTF", "RTRSLF"] {
            let route: Route = raw.parse().unwrap();
            let once = optimize(&route).unwrap();
            let twice = optimize(&once).unwrap();
            assert_eq!(once, twice, "{} not idempotent", raw);
            assert!(once.len() <= route.len());
            assert_eq!(once.is_finished(), route.is_finished());
            assert_eq!(once.capacity(), route.capacity());
        }
    }
}
