//! Observable state snapshots for invariant checking.
//!
//! Invariants operate on snapshots rather than on the live context so that a
//! check sees one consistent moment.

use devstate_core::{
    AutorelockTriggers, DeviceMode, DevlockUiState, DisplayState, MceContext, Moment,
    StatusStore, Submode, TklockUiState, UiTransport,
};

/// State of one context at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Submode register.
    pub submode: Submode,
    /// Cached device mode.
    pub device_mode: DeviceMode,
    /// A mode change dialog result is awaited.
    pub mode_pending: bool,
    /// Lock UI state as tklock sees it.
    pub tklock_ui: TklockUiState,
    /// Recorded autorelock triggers.
    pub triggers: AutorelockTriggers,
    /// PIN UI state as devlock sees it.
    pub devlock_ui: DevlockUiState,
    /// Display state.
    pub display: DisplayState,
    /// Touchscreen input enabled.
    pub touchscreen_enabled: bool,
    /// Keypad input enabled.
    pub keypad_enabled: bool,
}

impl SystemSnapshot {
    /// State of a freshly built context.
    pub fn initial() -> Self {
        Self {
            submode: Submode::empty(),
            device_mode: DeviceMode::Normal,
            mode_pending: false,
            tklock_ui: TklockUiState::None,
            triggers: AutorelockTriggers::empty(),
            devlock_ui: DevlockUiState::Closed,
            display: DisplayState::Undef,
            touchscreen_enabled: true,
            keypad_enabled: true,
        }
    }

    /// Capture `context`.
    pub fn from_context<U, S, M>(context: &MceContext<U, S, M>) -> Self
    where
        U: UiTransport,
        S: StatusStore,
        M: Moment,
    {
        let pipes = context.pipes();
        Self {
            submode: context.submode(),
            device_mode: pipes.device_mode.get(),
            mode_pending: context.modes().is_pending(),
            tklock_ui: context.tklock().ui_state(),
            triggers: context.tklock().triggers(),
            devlock_ui: context.devlock().ui_state(),
            display: pipes.display_state.get(),
            touchscreen_enabled: pipes.touchscreen_enabled.get(),
            keypad_enabled: pipes.keypad_enabled.get(),
        }
    }

    /// Whether `flags` are all set.
    pub fn has(&self, flags: Submode) -> bool {
        self.submode.contains(flags)
    }
}
