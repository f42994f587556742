//! Route recording and compression
//!
//! - [`buffer`]: the bounded, Finish-terminated route and its replay cursor
//! - [`optimizer`]: fixed-point turn-around collapsing

pub mod buffer;
pub mod optimizer;

pub use buffer::{Route, RouteCursor, DEFAULT_CAPACITY};
pub use optimizer::optimize;
