//! Inputs to the context and the internal change notices derived from them.

use crate::{
    ipc::{MethodCall, Responder},
    submode::Submode,
    types::{
        AlarmUiState, AudioRoute, CallState, CallType, CoverState, DisplayState, InputEvent,
        LockState, PowerKeyEvent, SystemState,
    },
};

/// A new value for one of the externally fed pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeInput {
    /// State manager.
    SystemState(SystemState),
    /// Display power.
    DisplayState(DisplayState),
    /// Inactivity.
    DeviceInactive(bool),
    /// Telephony call state.
    CallState(CallState),
    /// Telephony call type.
    CallType(CallType),
    /// Alarm dialog.
    AlarmUiState(AlarmUiState),
    /// Audio routing.
    AudioRoute(AudioRoute),
    /// Proximity sensor.
    Proximity(CoverState),
    /// Keyboard slide.
    KeyboardSlide(CoverState),
    /// Lens cover.
    LensCover(CoverState),
    /// Lid cover.
    LidCover(CoverState),
    /// Power key gesture.
    PowerKey(PowerKeyEvent),
    /// Touchscreen or keypad event.
    Input(InputEvent),
    /// Data connection up or down.
    ConnectivityActive(bool),
    /// Tklock request.
    TkLock(LockState),
    /// Devlock request.
    DeviceLock(LockState),
}

/// Something for the context to process.
#[derive(Debug)]
pub enum Event {
    /// Sensor, telephony or other pipe input.
    Input(PipeInput),
    /// Method call, with the channel its reply goes to.
    Method {
        /// The call.
        call: MethodCall,
        /// Reply channel; `None` for fire-and-forget calls.
        reply: Option<Responder>,
    },
}

impl From<PipeInput> for Event {
    fn from(input: PipeInput) -> Self {
        Self::Input(input)
    }
}

/// Committed pipe change, queued by an output trigger for the machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    SystemState(SystemState),
    DisplayState(DisplayState),
    DeviceInactive(bool),
    CallState(CallState),
    AlarmUiState(AlarmUiState),
    AudioRoute(AudioRoute),
    Proximity(CoverState),
    KeyboardSlide(CoverState),
    LensCover(CoverState),
    LidCover(CoverState),
    PowerKey(PowerKeyEvent),
    Input(InputEvent),
    TkLockRequest(LockState),
    DevLockRequest(LockState),
    SubmodeChanged { old: Submode, new: Submode },
}
