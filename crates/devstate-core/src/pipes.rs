//! The set of datapipes shared by every subsystem.

use std::rc::Rc;

use crate::{
    datapipe::{Datapipe, ReadPolicy, Subsystem},
    error::SubmodeError,
    submode::{Submode, SubmodeChange},
    types::{
        AlarmUiState, AudioRoute, CallState, CallType, CoverState, DeviceMode, DisplayState,
        InputEvent, LockState, PowerKeyEvent, SystemState,
    },
};

/// Every pipe on the bus, created once with its initial value.
///
/// Fields are `Rc` so callbacks can hold on to the pipes they read.
#[derive(Debug)]
pub struct Datapipes {
    /// System state from the state manager.
    pub system_state: Rc<Datapipe<SystemState>>,
    /// Display power state.
    pub display_state: Rc<Datapipe<DisplayState>>,
    /// No user activity for the inactivity timeout.
    pub device_inactive: Rc<Datapipe<bool>>,
    /// Telephony call state.
    pub call_state: Rc<Datapipe<CallState>>,
    /// Telephony call type.
    pub call_type: Rc<Datapipe<CallType>>,
    /// Alarm dialog state.
    pub alarm_ui_state: Rc<Datapipe<AlarmUiState>>,
    /// Audio routing.
    pub audio_route: Rc<Datapipe<AudioRoute>>,
    /// Proximity sensor.
    pub proximity: Rc<Datapipe<CoverState>>,
    /// Hardware keyboard slide.
    pub keyboard_slide: Rc<Datapipe<CoverState>>,
    /// Camera lens cover.
    pub lens_cover: Rc<Datapipe<CoverState>>,
    /// Lid (flip) cover.
    pub lid_cover: Rc<Datapipe<CoverState>>,
    /// Power key gestures. Executed with `DiscardResult`.
    pub power_key: Rc<Datapipe<PowerKeyEvent>>,
    /// Touchscreen and keypad events. Executed with `DiscardResult`.
    pub input_event: Rc<Datapipe<InputEvent>>,
    /// A data connection is up.
    pub connectivity_active: Rc<Datapipe<bool>>,
    /// Current device mode. Owned by mode transition.
    pub device_mode: Rc<Datapipe<DeviceMode>>,
    /// Submode register.
    pub submode: Rc<Datapipe<Submode>>,
    /// Tklock requests.
    pub tk_lock: Rc<Datapipe<LockState>>,
    /// Devlock requests.
    pub device_lock: Rc<Datapipe<LockState>>,
    /// LED pattern activation. Executed with `DiscardResult`.
    pub led_pattern_activate: Rc<Datapipe<String>>,
    /// Vibrator pattern activation. Executed with `DiscardResult`.
    pub vibrator_pattern_activate: Rc<Datapipe<String>>,
    /// Touchscreen event delivery enabled. Owned by tklock.
    pub touchscreen_enabled: Rc<Datapipe<bool>>,
    /// Keypad event delivery enabled. Owned by tklock.
    pub keypad_enabled: Rc<Datapipe<bool>>,
}

impl Default for Datapipes {
    fn default() -> Self {
        Self::new()
    }
}

impl Datapipes {
    /// Create all pipes with their boot-time values.
    pub fn new() -> Self {
        use ReadPolicy::{ReadOnly, ReadWrite};

        Self {
            system_state: pipe("system_state", ReadWrite, SystemState::Undef),
            display_state: pipe("display_state", ReadWrite, DisplayState::Undef),
            device_inactive: pipe("device_inactive", ReadWrite, false),
            call_state: pipe("call_state", ReadWrite, CallState::None),
            call_type: pipe("call_type", ReadWrite, CallType::Normal),
            alarm_ui_state: pipe("alarm_ui_state", ReadWrite, AlarmUiState::Off),
            audio_route: pipe("audio_route", ReadWrite, AudioRoute::Undef),
            proximity: pipe("proximity", ReadWrite, CoverState::Undef),
            keyboard_slide: pipe("keyboard_slide", ReadWrite, CoverState::Undef),
            lens_cover: pipe("lens_cover", ReadWrite, CoverState::Undef),
            lid_cover: pipe("lid_cover", ReadWrite, CoverState::Undef),
            power_key: pipe("power_key", ReadWrite, PowerKeyEvent::Idle),
            input_event: pipe("input_event", ReadWrite, InputEvent::Idle),
            connectivity_active: pipe("connectivity_active", ReadWrite, false),
            device_mode: pipe(
                "device_mode",
                ReadOnly(Subsystem::ModeTransition),
                DeviceMode::Normal,
            ),
            submode: pipe("submode", ReadWrite, Submode::empty()),
            tk_lock: pipe("tk_lock", ReadWrite, LockState::Off),
            device_lock: pipe("device_lock", ReadWrite, LockState::Off),
            led_pattern_activate: pipe("led_pattern_activate", ReadWrite, String::new()),
            vibrator_pattern_activate: pipe(
                "vibrator_pattern_activate",
                ReadWrite,
                String::new(),
            ),
            touchscreen_enabled: pipe("touchscreen_enabled", ReadOnly(Subsystem::Tklock), true),
            keypad_enabled: pipe("keypad_enabled", ReadOnly(Subsystem::Tklock), true),
        }
    }

    /// Whether every flag in `flags` is set.
    pub fn has_submode(&self, flags: Submode) -> bool {
        self.submode.get().contains(flags)
    }

    /// Apply a validated change to the submode register.
    ///
    /// Returns the new mask. On error the register is left untouched.
    pub fn change_submode(
        &self,
        origin: Subsystem,
        change: SubmodeChange,
    ) -> Result<Submode, SubmodeError> {
        let current = self.submode.get();
        let next = change.apply(current)?;
        if next != current {
            tracing::debug!(?origin, old = ?current, new = ?next, "submode change");
            self.submode.set(origin, next);
        }
        Ok(next)
    }
}

fn pipe<T>(name: &'static str, policy: ReadPolicy, initial: T) -> Rc<Datapipe<T>>
where
    T: Clone + std::fmt::Debug + 'static,
{
    Rc::new(Datapipe::new(name, policy, initial))
}
