//! Closed value types carried on the datapipes.
//!
//! Every sensor, telephony, alarm and display input is one of these small
//! enums. The string forms are the ones used on the method-call surface and in
//! the mode status file.

use std::fmt;

use crate::error::ParseError;

/// Device radio mode.
///
/// `Offline` is accepted as an alias of `Flight` when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Radios on.
    Normal,
    /// Normal, but ask the user before switching.
    NormalConfirm,
    /// Radios off.
    Flight,
    /// Flight, but ask the user first when a connection is active.
    FlightConfirm,
    /// Unparseable or unknown request.
    Invalid,
}

impl DeviceMode {
    /// Parse a mode name. Unknown names map to [`DeviceMode::Invalid`].
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "normal" => Self::Normal,
            "normal-confirm" => Self::NormalConfirm,
            "flight" | "offline" => Self::Flight,
            "flight-confirm" | "offline-confirm" => Self::FlightConfirm,
            _ => Self::Invalid,
        }
    }

    /// Settled mode this request ends in. `Invalid` stays `Invalid`.
    pub fn target(self) -> Self {
        match self {
            Self::Normal | Self::NormalConfirm => Self::Normal,
            Self::Flight | Self::FlightConfirm => Self::Flight,
            Self::Invalid => Self::Invalid,
        }
    }

    /// Name used in signals, replies and the mode file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::NormalConfirm => "normal-confirm",
            Self::Flight => "flight",
            Self::FlightConfirm => "flight-confirm",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock request written to the `tk_lock` and `device_lock` pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockState {
    /// Unlock.
    Off,
    /// Unlock without UI animation.
    OffSilent,
    /// Unlock after the configured delay.
    OffDelayed,
    /// Lock following the normal policy.
    On,
    /// Lock and dim right away.
    OnDimmed,
    /// Lock without UI animation.
    OnSilent,
    /// Lock silently and dim right away.
    OnSilentDimmed,
    /// Flip the current lock state.
    Toggle,
}

impl LockState {
    /// Parse a lock request name as sent by method callers.
    pub fn parse(name: &str) -> Result<Self, ParseError> {
        match name.trim() {
            "unlocked" => Ok(Self::Off),
            "silent-unlocked" => Ok(Self::OffSilent),
            "delayed-unlocked" => Ok(Self::OffDelayed),
            "locked" => Ok(Self::On),
            "locked-dim" => Ok(Self::OnDimmed),
            "silent-locked" => Ok(Self::OnSilent),
            "silent-locked-dim" => Ok(Self::OnSilentDimmed),
            "toggle" => Ok(Self::Toggle),
            other => Err(ParseError::LockState(other.to_string())),
        }
    }

    /// Whether this request asks for the lock to be engaged.
    pub fn is_lock(self) -> bool {
        matches!(self, Self::On | Self::OnDimmed | Self::OnSilent | Self::OnSilentDimmed)
    }
}

/// State of a two-position sensor or cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverState {
    /// Uncovered / slide out / nothing near the proximity sensor.
    Open,
    /// Covered / slide in / something near the proximity sensor.
    Closed,
    /// Not reported yet.
    Undef,
}

/// Telephony call state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// No call.
    None,
    /// Incoming call alerting.
    Ringing,
    /// Call connected.
    Active,
    /// Operator service call (USSD and the like).
    Service,
}

impl CallState {
    /// Ringing or connected.
    pub fn is_ongoing(self) -> bool {
        matches!(self, Self::Ringing | Self::Active)
    }
}

/// Telephony call type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    /// Regular call.
    Normal,
    /// Emergency call.
    Emergency,
}

/// Alarm UI visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmUiState {
    /// No alarm dialog.
    Off,
    /// Alarm dialog shown, silent.
    Visible,
    /// Alarm dialog shown and ringing.
    Ringing,
    /// Not reported yet.
    Invalid,
}

impl AlarmUiState {
    /// Dialog shown, ringing or not.
    pub fn is_alerting(self) -> bool {
        matches!(self, Self::Visible | Self::Ringing)
    }
}

/// System state as reported by the state manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemState {
    /// Shutting down.
    Shutdown,
    /// Normal user session.
    User,
    /// Charging while "off": minimal UI.
    ActDead,
    /// Rebooting.
    Reboot,
    /// Booting.
    Boot,
    /// Not reported yet.
    Undef,
}

/// Display power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    /// Blanked.
    Off,
    /// Dimmed backlight.
    Dim,
    /// Fully on.
    On,
    /// Not reported yet.
    Undef,
}

/// Where call audio is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioRoute {
    /// Earpiece.
    Handset,
    /// Loudspeaker.
    Speaker,
    /// Wired or bluetooth headset.
    Headset,
    /// Not reported yet.
    Undef,
}

/// Power key gesture, classified by the power key module.
///
/// `Idle` is the resting cache value; gestures are executed with
/// `DiscardResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerKeyEvent {
    /// No gesture.
    Idle,
    /// Short press.
    Short,
    /// Double press.
    Double,
    /// Long press.
    Long,
}

/// User input from the touchscreen or keypad.
///
/// `Idle` is the resting cache value. `Swallowed` is what the event-eater
/// filter turns an event into: downstream consumers must ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// No event.
    Idle,
    /// Touchscreen press.
    Touch,
    /// Keypad key, by key code.
    Key(u16),
    /// Event consumed by the event eater.
    Swallowed,
}

impl InputEvent {
    /// A real press that reached the consumers.
    pub fn is_press(self) -> bool {
        matches!(self, Self::Touch | Self::Key(_))
    }
}
