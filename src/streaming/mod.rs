//! Diagnostic stream to the host
//!
//! The robot reports each node visit and both routes as plain text lines; a
//! dedicated thread owns the output so control loops never block on I/O.

pub mod diagnostics;
pub mod writer;

pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use writer::{open_output, DiagnosticWriter};
