//! Marga - Line-following maze solver
//!
//! Explores an unknown line maze with the left-hand rule, compresses the
//! recorded route into the shortest equivalent one and replays it.
//!
//! ## Pipeline
//!
//! ```text
//! sensors (RC discharge) ─▶ LineState ─▶ follower (PID) ─▶ classifier
//!                                                            │
//!                         explore: route recorder ◀──────────┤
//!                         replay:  optimized route ──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sensors`]: acquisition cycle, calibration and sample publishing
//! - [`control`]: robot handle, PID follower, node classifier, maneuvers
//! - [`route`]: route buffer and turn-around optimizer
//! - [`navigation`]: exploration, replay and the three-phase mission
//! - [`streaming`]: textual diagnostic stream
//! - [`devices`]: simulated robot and scripted test doubles

pub mod config;
pub mod control;
pub mod core;
pub mod devices;
pub mod error;
pub mod navigation;
pub mod route;
pub mod sensors;
pub mod streaming;

// Re-export commonly used types
pub use config::MargaConfig;
pub use core::types::{LineState, Move, NodeType, Reaction};
pub use error::{Error, Result};
pub use navigation::{Mission, MissionReport};
pub use route::{optimize, Route};
