//! Control loop building blocks
//!
//! - [`robot`]: the handle the loop drives (tracks out, line states in)
//! - [`follower`]: PID line following between nodes
//! - [`classifier`]: drive-through node classification
//! - [`maneuver`]: line-counting spins and the calibration sweep

pub mod classifier;
pub mod follower;
pub mod maneuver;
pub mod robot;

pub use classifier::NodeClassifier;
pub use follower::LineFollower;
pub use robot::Robot;
