//! Textual diagnostic stream
//!
//! Every item is one or more newline-terminated lines:
//!
//! | Event | Lines |
//! |-------|-------|
//! | node visit | arrival state, exit state (`0`/`1` x6, leftmost first), node code, reaction |
//! | raw route | route string, e.g. `LTLTLF` |
//! | optimized route | route string, e.g. `RF` |
//! | message | free text (phase prompts) |
//!
//! Producers hold a cloneable [`Diagnostics`] handle; a writer thread drains
//! the channel (see [`super::writer`]).

use crate::navigation::NodeVisit;
use crate::route::Route;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// One diagnostic item
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    Message(String),
    Visit(NodeVisit),
    RawRoute(Route),
    OptimizedRoute(Route),
}

impl DiagnosticEvent {
    /// Wire text, newline-terminated
    pub fn render(&self) -> String {
        match self {
            Self::Message(text) => format!("{}\n", text),
            Self::Visit(visit) => format!(
                "{}\n{}\n{}\n{}\n",
                visit.arrival,
                visit.exit,
                visit.node.code(),
                visit.reaction.symbol()
            ),
            Self::RawRoute(route) | Self::OptimizedRoute(route) => format!("{}\n", route),
        }
    }
}

/// Sending half of the diagnostic stream
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    tx: Option<Sender<DiagnosticEvent>>,
}

impl Diagnostics {
    /// Connected handle and the receiver a writer drains
    pub fn channel() -> (Self, Receiver<DiagnosticEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// Handle that drops everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Queue an event; a disconnected writer is not an error for the robot
    pub fn send(&self, event: DiagnosticEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                log::debug!("Diagnostic writer gone, event dropped");
            }
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        self.send(DiagnosticEvent::Message(text.into()));
    }
}
