//! Diagnostic writer thread
//!
//! Drains the diagnostic channel and writes each event's text to the
//! configured sink, flushing after every event so a tailing reader sees node
//! visits as they happen. The thread exits when every [`Diagnostics`] handle
//! has been dropped.
//!
//! [`Diagnostics`]: super::diagnostics::Diagnostics

use super::diagnostics::DiagnosticEvent;
use crate::error::{Error, Result};
use crossbeam_channel::Receiver;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::thread::{self, JoinHandle};

/// Open a diagnostic sink: `stdout`, `stderr`, or a file path (truncated)
pub fn open_output(target: &str) -> Result<Box<dyn Write + Send>> {
    match target {
        "stdout" | "-" => Ok(Box::new(io::stdout())),
        "stderr" => Ok(Box::new(io::stderr())),
        path => {
            let file = File::create(path)?;
            log::info!("Writing diagnostics to {}", path);
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

/// Handle to the running writer thread
pub struct DiagnosticWriter {
    handle: JoinHandle<u64>,
}

impl DiagnosticWriter {
    /// Start draining `receiver` into `output` on a named thread
    pub fn spawn(receiver: Receiver<DiagnosticEvent>, output: Box<dyn Write + Send>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("diagnostics".to_string())
            .spawn(move || write_loop(receiver, output))
            .map_err(|e| Error::ThreadSpawn(e.to_string()))?;
        Ok(Self { handle })
    }

    /// Wait for the channel to drain; returns the number of events written.
    /// Every `Diagnostics` handle must be dropped first.
    pub fn join(self) -> Result<u64> {
        self.handle
            .join()
            .map_err(|_| Error::Other("Diagnostic writer thread panicked".to_string()))
    }
}

fn write_loop(receiver: Receiver<DiagnosticEvent>, mut output: Box<dyn Write + Send>) -> u64 {
    let mut written = 0u64;
    for event in receiver.iter() {
        let text = event.render();
        if let Err(e) = output.write_all(text.as_bytes()).and_then(|_| output.flush()) {
            log::error!("Diagnostic write failed: {}", e);
            break;
        }
        written += 1;
    }
    log::debug!("Diagnostic writer exiting after {} events", written);
    written
}
