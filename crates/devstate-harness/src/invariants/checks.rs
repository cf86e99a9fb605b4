//! Standard invariant checks.
//!
//! Each check states a property that must hold after every handled event and
//! every fired timer, whatever the input sequence was.

use devstate_core::{AutorelockTriggers, DevlockUiState, Submode, TklockUiState};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// `VERIFY` is only ever set on top of `DEVLOCK`.
pub struct VerifyRequiresDevlock;

impl Invariant for VerifyRequiresDevlock {
    fn name(&self) -> &'static str {
        "verify_requires_devlock"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.has(Submode::VERIFY) && !state.has(Submode::DEVLOCK) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("VERIFY without DEVLOCK in {:?}", state.submode),
            });
        }
        Ok(())
    }
}

/// `VERIFY` is set exactly while the PIN query is shown, and the PIN UI is
/// only shown on a locked device.
pub struct PinUiMatchesSubmode;

impl Invariant for PinUiMatchesSubmode {
    fn name(&self) -> &'static str {
        "pin_ui_matches_submode"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let querying = state.devlock_ui == DevlockUiState::Query;
        if querying != state.has(Submode::VERIFY) {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "pin ui {:?} disagrees with submode {:?}",
                    state.devlock_ui, state.submode
                ),
            });
        }
        if state.devlock_ui != DevlockUiState::Closed && !state.has(Submode::DEVLOCK) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("pin ui {:?} shown on an unlocked device", state.devlock_ui),
            });
        }
        Ok(())
    }
}

/// The lock UI state and the `TKLOCK`/`VISUAL_TKLOCK`/`EVEATER` flags agree.
pub struct TklockUiMatchesSubmode;

impl Invariant for TklockUiMatchesSubmode {
    fn name(&self) -> &'static str {
        "tklock_ui_matches_submode"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let flags = state.submode & (Submode::TKLOCK | Submode::VISUAL_TKLOCK | Submode::EVEATER);
        let expected = match state.tklock_ui {
            TklockUiState::None => Submode::empty(),
            TklockUiState::Normal => Submode::TKLOCK,
            TklockUiState::Slider => Submode::TKLOCK | Submode::VISUAL_TKLOCK,
            TklockUiState::EventEater => Submode::EVEATER,
        };
        if flags != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "lock ui {:?} expects {expected:?}, submode has {flags:?}",
                    state.tklock_ui
                ),
            });
        }
        Ok(())
    }
}

/// `MODECHG` is set exactly while a mode change reply is parked.
pub struct ModeChangeFlagMatchesPending;

impl Invariant for ModeChangeFlagMatchesPending {
    fn name(&self) -> &'static str {
        "modechg_matches_pending"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.has(Submode::MODECHG) != state.mode_pending {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "MODECHG {} but pending {}",
                    state.has(Submode::MODECHG),
                    state.mode_pending
                ),
            });
        }
        Ok(())
    }
}

/// `AUTORELOCK` is set exactly while the trigger set is non-empty.
pub struct AutorelockMatchesTriggers;

impl Invariant for AutorelockMatchesTriggers {
    fn name(&self) -> &'static str {
        "autorelock_matches_triggers"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let any = state.triggers != AutorelockTriggers::empty();
        if state.has(Submode::AUTORELOCK) != any {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "AUTORELOCK {} with triggers {:?}",
                    state.has(Submode::AUTORELOCK),
                    state.triggers
                ),
            });
        }
        Ok(())
    }
}

/// The keypad is disabled exactly while the lock is held.
pub struct KeypadFollowsLock;

impl Invariant for KeypadFollowsLock {
    fn name(&self) -> &'static str {
        "keypad_follows_lock"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        if state.keypad_enabled == state.has(Submode::TKLOCK) {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "keypad enabled {} with submode {:?}",
                    state.keypad_enabled, state.submode
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SystemSnapshot {
        SystemSnapshot::initial()
    }

    #[test]
    fn verify_without_devlock_is_caught() {
        let mut state = snapshot();
        state.submode = Submode::VERIFY;

        let err = VerifyRequiresDevlock.check(&state).unwrap_err();
        assert_eq!(err.invariant, "verify_requires_devlock");
    }

    #[test]
    fn slider_needs_both_flags() {
        let mut state = snapshot();
        state.tklock_ui = TklockUiState::Slider;
        state.submode = Submode::TKLOCK;
        state.keypad_enabled = false;

        assert!(TklockUiMatchesSubmode.check(&state).is_err());

        state.submode |= Submode::VISUAL_TKLOCK;
        assert!(TklockUiMatchesSubmode.check(&state).is_ok());
        assert!(KeypadFollowsLock.check(&state).is_ok());
    }

    #[test]
    fn stale_autorelock_flag_is_caught() {
        let mut state = snapshot();
        state.submode = Submode::AUTORELOCK;

        assert!(AutorelockMatchesTriggers.check(&state).is_err());
    }

    #[test]
    fn orphaned_modechg_is_caught() {
        let mut state = snapshot();
        state.submode = Submode::MODECHG;

        assert!(ModeChangeFlagMatchesPending.check(&state).is_err());
    }
}
