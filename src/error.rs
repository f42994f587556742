//! Error types for Marga

use crate::core::types::{LineState, Move, NodeType};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Marga error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Device type not known to `create_device`
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Exploration requested before every channel has min < max
    #[error("Sensors not calibrated: channel bounds have not separated")]
    NotCalibrated,

    /// Non-terminal node with neither a left nor a right branch
    #[error("Ambiguous node: no branch seen, exit reading {line_state}")]
    AmbiguousNode {
        /// Reading taken after passing the node
        line_state: LineState,
    },

    /// Raw route exceeded the node budget
    #[error("Route overflow: more than {capacity} reactions recorded")]
    RouteOverflow {
        /// Maximum number of reactions
        capacity: usize,
    },

    /// Replay asked for a reaction past the end of the route
    #[error("Route exhausted after {consumed} reactions")]
    RouteExhausted {
        /// Number of reactions consumed before running out
        consumed: usize,
    },

    /// Replay consumed a reaction that cannot apply to the node
    #[error("Route mismatch: {node:?} cannot perform {found}")]
    RouteMismatch {
        /// Node being replayed
        node: NodeType,
        /// Move read from the route
        found: Move,
    },

    /// Append attempted after the Finish marker
    #[error("Route already terminated by Finish")]
    RouteTerminated,

    /// Character outside the route alphabet
    #[error("Invalid route symbol: {0:?}")]
    InvalidSymbol(char),

    /// Maze description could not be parsed
    #[error("Invalid maze: {0}")]
    InvalidMaze(String),

    /// Line-state producer stopped publishing
    #[error("Sensor stream closed")]
    SensorStreamClosed,

    /// Operator interrupted the mission
    #[error("Interrupted")]
    Interrupted,

    /// Worker thread could not be started
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
