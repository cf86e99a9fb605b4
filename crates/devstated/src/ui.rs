//! UI transport that only logs.
//!
//! Stands in for the message bus when no UI process is attached: every call
//! succeeds and every signal is written to the log.

use devstate_core::{IpcError, Signal, UiRequest, UiTransport};

/// Logs UI requests and signals instead of sending them.
#[derive(Debug, Default)]
pub struct LogOnlyUi {
    calls: u64,
}

impl LogOnlyUi {
    /// Fresh transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl UiTransport for LogOnlyUi {
    fn call(&mut self, request: &UiRequest) -> Result<(), IpcError> {
        self.calls += 1;
        tracing::info!(?request, "ui call");
        Ok(())
    }

    fn emit(&mut self, signal: Signal) {
        tracing::info!(?signal, "signal");
    }
}
