//! Route buffer and replay cursor

use crate::core::types::Move;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Node budget used when no explicit capacity is given
pub const DEFAULT_CAPACITY: usize = 100;

/// Ordered reaction symbols, terminated by [`Move::Finish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    moves: Vec<Move>,
    capacity: usize,
}

impl Route {
    /// Empty route accepting at most `capacity` symbols (Finish included)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            moves: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Build from symbols, enforcing the same rules as [`Route::push`]
    pub fn from_moves(moves: impl IntoIterator<Item = Move>, capacity: usize) -> Result<Self> {
        let mut route = Self::with_capacity(capacity);
        for m in moves {
            route.push(m)?;
        }
        Ok(route)
    }

    /// Append a symbol
    ///
    /// Fails once the route holds `capacity` symbols or already ends in Finish.
    pub fn push(&mut self, m: Move) -> Result<()> {
        if self.is_finished() {
            return Err(Error::RouteTerminated);
        }
        if self.moves.len() >= self.capacity {
            return Err(Error::RouteOverflow {
                capacity: self.capacity,
            });
        }
        self.moves.push(m);
        Ok(())
    }

    /// Ends with the Finish marker
    pub fn is_finished(&self) -> bool {
        self.moves.last() == Some(&Move::Finish)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Drop every symbol, keeping the capacity
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Symbols other than Finish: one per decision taken
    pub fn decision_count(&self) -> usize {
        self.moves.iter().filter(|m| **m != Move::Finish).count()
    }

    /// Sequential reader starting at the first symbol
    pub fn cursor(&self) -> RouteCursor<'_> {
        RouteCursor {
            route: self,
            position: 0,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.moves {
            write!(f, "{}", m.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Route {
    type Err = Error;

    /// Parse a symbol string such as `"LTSF"`
    fn from_str(s: &str) -> Result<Self> {
        let moves = s
            .trim()
            .chars()
            .map(Move::from_symbol)
            .collect::<Result<Vec<_>>>()?;
        let capacity = moves.len().max(DEFAULT_CAPACITY);
        Self::from_moves(moves, capacity)
    }
}

/// Read position into a route; reading past the end is an error, never a wrap
#[derive(Debug, Clone)]
pub struct RouteCursor<'a> {
    route: &'a Route,
    position: usize,
}

impl RouteCursor<'_> {
    /// Consume the next symbol
    pub fn next_move(&mut self) -> Result<Move> {
        let m = self
            .route
            .moves
            .get(self.position)
            .copied()
            .ok_or(Error::RouteExhausted {
                consumed: self.position,
            })?;
        self.position += 1;
        Ok(m)
    }

    /// Symbols consumed so far
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// Symbols left
    pub fn remaining(&self) -> usize {
        self.route.len() - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let route: Route = "SLTSLF".parse().unwrap();
        assert_eq!(route.len(), 6);
        assert!(route.is_finished());
        assert_eq!(route.to_string(), "SLTSLF");
        assert_eq!(route.decision_count(), 5);
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        assert!(matches!("LXF".parse::<Route>(), Err(Error::InvalidSymbol('X'))));
        // Forced turns are never part of a route
        assert!(matches!("LlF".parse::<Route>(), Err(Error::InvalidSymbol('l'))));
    }

    #[test]
    fn test_push_after_finish_fails() {
        let mut route = Route::with_capacity(10);
        route.push(Move::Left).unwrap();
        route.push(Move::Finish).unwrap();
        assert!(matches!(route.push(Move::Left), Err(Error::RouteTerminated)));
        assert!(matches!("LFL".parse::<Route>(), Err(Error::RouteTerminated)));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut route = Route::with_capacity(2);
        route.push(Move::Left).unwrap();
        route.push(Move::TurnAround).unwrap();
        assert!(matches!(
            route.push(Move::Finish),
            Err(Error::RouteOverflow { capacity: 2 })
        ));
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn test_cursor_exhaustion_is_an_error() {
        let route: Route = "RF".parse().unwrap();
        let mut cursor = route.cursor();
        assert_eq!(cursor.next_move().unwrap(), Move::Right);
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.next_move().unwrap(), Move::Finish);
        assert!(matches!(
            cursor.next_move(),
            Err(Error::RouteExhausted { consumed: 2 })
        ));
        assert_eq!(cursor.consumed(), 2);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut route = Route::from_moves([Move::Left, Move::Finish], 5).unwrap();
        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.capacity(), 5);
        route.push(Move::Straight).unwrap();
    }
}
