//! Scripted UI transport.
//!
//! Records every request and signal, tracks which dialogs the UI would be
//! showing, and fails calls on demand so retry and fallback paths can be
//! driven deterministically.

use std::{collections::HashMap, time::Duration};

use devstate_core::{
    DevlockUiMode, IpcError, ModeTransitionTag, Signal, TklockUiMode, UiRequest, UiTransport,
};

/// Timeout reported for injected failures.
const SIM_CALL_TIMEOUT: Duration = Duration::from_secs(25);

/// Request category used to target failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// [`UiRequest::OpenModeDialog`]
    OpenModeDialog,
    /// [`UiRequest::CloseModeDialog`]
    CloseModeDialog,
    /// [`UiRequest::OpenTklock`]
    OpenTklock,
    /// [`UiRequest::CloseTklock`]
    CloseTklock,
    /// [`UiRequest::OpenDevlock`]
    OpenDevlock,
    /// [`UiRequest::CloseDevlock`]
    CloseDevlock,
    /// [`UiRequest::RequestShutdown`]
    RequestShutdown,
}

impl RequestKind {
    /// Category of `request`.
    pub fn of(request: &UiRequest) -> Self {
        match request {
            UiRequest::OpenModeDialog { .. } => Self::OpenModeDialog,
            UiRequest::CloseModeDialog => Self::CloseModeDialog,
            UiRequest::OpenTklock { .. } => Self::OpenTklock,
            UiRequest::CloseTklock { .. } => Self::CloseTklock,
            UiRequest::OpenDevlock { .. } => Self::OpenDevlock,
            UiRequest::CloseDevlock => Self::CloseDevlock,
            UiRequest::RequestShutdown => Self::RequestShutdown,
        }
    }
}

/// In-memory stand-in for the UI process and the signal bus.
#[derive(Debug, Default)]
pub struct SimUi {
    requests: Vec<UiRequest>,
    signals: Vec<Signal>,
    failures: HashMap<RequestKind, u32>,
    mode_dialog: Option<ModeTransitionTag>,
    tklock_ui: Option<TklockUiMode>,
    devlock_ui: Option<DevlockUiMode>,
    shutdown_requested: bool,
}

impl SimUi {
    /// UI that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `kind`.
    pub fn fail_next(&mut self, kind: RequestKind, times: u32) {
        *self.failures.entry(kind).or_default() += times;
    }

    /// Every call made, failed ones included.
    pub fn requests(&self) -> &[UiRequest] {
        &self.requests
    }

    /// Number of calls of `kind`, failed ones included.
    pub fn count(&self, kind: RequestKind) -> usize {
        self.requests.iter().filter(|r| RequestKind::of(r) == kind).count()
    }

    /// Every signal emitted.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Drain recorded requests and signals.
    pub fn clear_log(&mut self) {
        self.requests.clear();
        self.signals.clear();
    }

    /// Mode dialog currently shown.
    pub fn mode_dialog(&self) -> Option<ModeTransitionTag> {
        self.mode_dialog
    }

    /// Lock UI currently shown.
    pub fn tklock_ui(&self) -> Option<TklockUiMode> {
        self.tklock_ui
    }

    /// PIN UI currently shown.
    pub fn devlock_ui(&self) -> Option<DevlockUiMode> {
        self.devlock_ui
    }

    /// A shutdown was requested.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    fn take_failure(&mut self, kind: RequestKind) -> bool {
        match self.failures.get_mut(&kind) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            },
            _ => false,
        }
    }
}

impl UiTransport for SimUi {
    fn call(&mut self, request: &UiRequest) -> Result<(), IpcError> {
        self.requests.push(request.clone());

        let kind = RequestKind::of(request);
        if self.take_failure(kind) {
            tracing::trace!(?kind, "injected ui failure");
            return Err(IpcError::Timeout(SIM_CALL_TIMEOUT));
        }

        match *request {
            UiRequest::OpenModeDialog { transition, .. } => self.mode_dialog = Some(transition),
            UiRequest::CloseModeDialog => self.mode_dialog = None,
            UiRequest::OpenTklock { mode, .. } => self.tklock_ui = Some(mode),
            UiRequest::CloseTklock { .. } => self.tklock_ui = None,
            UiRequest::OpenDevlock { mode } => self.devlock_ui = Some(mode),
            UiRequest::CloseDevlock => self.devlock_ui = None,
            UiRequest::RequestShutdown => self.shutdown_requested = true,
        }
        Ok(())
    }

    fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }
}
