//! Versioned single-writer publish channel for line samples
//!
//! The acquisition producer owns the [`LinePublisher`]; the control loop owns
//! the [`LineSubscriber`]. Each publish replaces the slot under a lock and
//! bumps a version, so readers only ever see whole samples and can wait for a
//! newer one without polling a ready flag.
//!
//! Readers also post *demand*: the version they are waiting for. A paced
//! producer (the simulator) uses [`LinePublisher::wait_for_demand`] to run
//! exactly one cycle per request, which keeps simulated runs deterministic.
//! A free-running producer simply ignores demand.

use crate::core::types::LineSample;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Slot {
    sample: Option<LineSample>,
    version: u64,
    demand: u64,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    changed: Condvar,
}

/// Create a connected publisher/subscriber pair
pub fn line_channel() -> (LinePublisher, LineSubscriber) {
    let shared = Arc::new(Shared::default());
    (
        LinePublisher {
            shared: Arc::clone(&shared),
        },
        LineSubscriber {
            shared,
            last_seen: 0,
        },
    )
}

/// Writer half
#[derive(Debug)]
pub struct LinePublisher {
    shared: Arc<Shared>,
}

impl LinePublisher {
    /// Replace the current sample and wake waiting readers
    pub fn publish(&self, sample: LineSample) {
        let mut slot = self.shared.slot.lock();
        slot.sample = Some(sample);
        slot.version += 1;
        drop(slot);
        self.shared.changed.notify_all();
    }

    /// Wait until a reader asks for a version newer than the current one.
    ///
    /// Returns `false` on timeout or once the channel is closed.
    pub fn wait_for_demand(&self, timeout: Duration) -> bool {
        let mut slot = self.shared.slot.lock();
        while slot.demand <= slot.version && !slot.closed {
            if self.shared.changed.wait_for(&mut slot, timeout).timed_out() {
                return slot.demand > slot.version && !slot.closed;
            }
        }
        !slot.closed
    }

    /// Stop the stream; blocked and future reads fail once drained
    pub fn close(&self) {
        let mut slot = self.shared.slot.lock();
        slot.closed = true;
        drop(slot);
        self.shared.changed.notify_all();
    }
}

impl Drop for LinePublisher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reader half
#[derive(Debug)]
pub struct LineSubscriber {
    shared: Arc<Shared>,
    last_seen: u64,
}

impl LineSubscriber {
    /// Wait for a sample newer than the last one this subscriber returned
    pub fn next(&mut self) -> Result<LineSample> {
        let mut slot = self.shared.slot.lock();
        loop {
            if slot.version > self.last_seen {
                if let Some(sample) = slot.sample {
                    self.last_seen = slot.version;
                    return Ok(sample);
                }
            }
            if slot.closed {
                return Err(Error::SensorStreamClosed);
            }
            let wanted = self.last_seen.max(slot.version) + 1;
            if slot.demand < wanted {
                slot.demand = wanted;
                self.shared.changed.notify_all();
            }
            self.shared.changed.wait(&mut slot);
        }
    }
}
