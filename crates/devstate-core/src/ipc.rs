//! Boundary to the message bus: UI calls, signals and method calls.
//!
//! The transport itself lives outside the core. It delivers [`MethodCall`]s
//! into the context together with a one-shot [`Responder`], and carries the
//! context's outgoing [`UiRequest`]s and [`Signal`]s to their peers.

use tokio::sync::oneshot;

use crate::{
    error::{IpcError, ParseError},
    types::DeviceMode,
};

/// Which confirmation the mode dialog asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeTransitionTag {
    /// Leaving flight mode.
    ToNormal,
    /// Entering flight mode with a connection up.
    ToFlight,
}

/// Lock UI flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TklockUiMode {
    /// Regular lock screen.
    Normal,
    /// Invisible, swallows one event.
    EventEater,
    /// Unlock slider shown over the locked screen.
    Slider,
}

/// PIN UI flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevlockUiMode {
    /// PIN entry.
    Query,
    /// "Wait before retrying" notice.
    Delayed,
    /// Offer to shut down instead of unlocking.
    ShutdownConfirm,
}

/// Blocking request to the UI process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Show the mode change confirmation.
    OpenModeDialog {
        /// Direction of the change.
        transition: ModeTransitionTag,
        /// Method the dialog reports its result to.
        callback: String,
    },
    /// Dismiss the mode change confirmation.
    CloseModeDialog,
    /// Show the lock UI.
    OpenTklock {
        /// Flavour.
        mode: TklockUiMode,
        /// Skip the animation.
        silent: bool,
    },
    /// Dismiss the lock UI.
    CloseTklock {
        /// Skip the animation.
        silent: bool,
    },
    /// Show the PIN UI.
    OpenDevlock {
        /// Flavour.
        mode: DevlockUiMode,
    },
    /// Dismiss the PIN UI.
    CloseDevlock,
    /// Ask the state manager to power off.
    RequestShutdown,
}

/// Broadcast state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Device mode changed or was re-announced.
    DeviceMode(DeviceMode),
    /// Tklock engaged or released.
    TklockMode {
        /// Lock held.
        locked: bool,
    },
    /// Devlock engaged or released.
    DevlockMode {
        /// Lock held.
        locked: bool,
    },
}

/// Outgoing half of the message bus.
pub trait UiTransport {
    /// Make a blocking call to the UI process with a bounded timeout.
    fn call(&mut self, request: &UiRequest) -> Result<(), IpcError>;

    /// Broadcast a signal. Delivery is best-effort.
    fn emit(&mut self, signal: Signal);
}

/// Incoming method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodCall {
    /// Current device mode name.
    GetDeviceMode,
    /// Switch to the named mode. Replies once the change is settled.
    ChangeDeviceMode(String),
    /// `locked` or `unlocked`.
    GetTklockMode,
    /// Apply the named lock request.
    ChangeTklockMode(String),
    /// `locked` or `unlocked`.
    GetDevlockMode,
    /// Mode dialog result.
    ModeChangeCallback(i32),
    /// Lock UI result.
    TklockCallback(i32),
    /// PIN UI result.
    DevlockCallback(i32),
    /// Suspend or resume the inactivity devlock.
    SetAutolockInhibit(bool),
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodReply {
    /// Device mode name.
    Mode(String),
    /// Tklock state name.
    TklockMode(String),
    /// Devlock state name.
    DevlockMode(String),
    /// Request accepted or refused.
    Ack(bool),
}

/// Where a method reply goes. Dropping it unanswered closes the call.
pub type Responder = oneshot::Sender<MethodReply>;

/// Send `reply` if anyone is still waiting for it.
pub(crate) fn respond(responder: Option<Responder>, reply: MethodReply) {
    if let Some(tx) = responder
        && tx.send(reply).is_err()
    {
        tracing::debug!("caller went away before the reply");
    }
}

/// Mode dialog result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChangeResult {
    /// User confirmed.
    Ok,
    /// Anything else.
    Cancel,
}

impl From<i32> for ModeChangeResult {
    fn from(code: i32) -> Self {
        if code == 0 { Self::Ok } else { Self::Cancel }
    }
}

/// Lock UI result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TklockUiResult {
    /// User unlocked through the UI.
    Unlock,
    /// UI asks to be opened again.
    Retry,
    /// Slider timed out.
    Timeout,
    /// UI went away on its own.
    Closed,
}

impl TryFrom<i32> for TklockUiResult {
    type Error = ParseError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Unlock),
            2 => Ok(Self::Retry),
            3 => Ok(Self::Timeout),
            4 => Ok(Self::Closed),
            other => Err(ParseError::TklockResult(other)),
        }
    }
}

/// PIN UI result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevlockUiResult {
    /// UI reports the device locked.
    Locked,
    /// PIN accepted.
    Correct,
    /// PIN rejected.
    Incorrect,
    /// User dismissed the dialog.
    Cancel,
}

impl TryFrom<i32> for DevlockUiResult {
    type Error = ParseError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Locked),
            1 => Ok(Self::Correct),
            2 => Ok(Self::Incorrect),
            3 => Ok(Self::Cancel),
            other => Err(ParseError::DevlockResult(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_nonzero_mode_result_cancels() {
        assert_eq!(ModeChangeResult::from(0), ModeChangeResult::Ok);
        assert_eq!(ModeChangeResult::from(1), ModeChangeResult::Cancel);
        assert_eq!(ModeChangeResult::from(-3), ModeChangeResult::Cancel);
    }

    #[test]
    fn unknown_ui_codes_are_rejected() {
        assert_eq!(TklockUiResult::try_from(0), Err(ParseError::TklockResult(0)));
        assert_eq!(DevlockUiResult::try_from(7), Err(ParseError::DevlockResult(7)));
        assert_eq!(DevlockUiResult::try_from(2), Ok(DevlockUiResult::Incorrect));
    }

    #[test]
    fn respond_survives_dropped_receiver() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        respond(Some(tx), MethodReply::Ack(true));
        respond(None, MethodReply::Ack(false));
    }
}
