//! Submode register.
//!
//! The submode is a `u32` bitmask of orthogonal device sub-states, carried on
//! the `submode` pipe. The mask itself allows any combination; which
//! combinations are valid is mode policy, enforced by [`SubmodeChange`] when a
//! state machine applies a change.

use bitflags::bitflags;

use crate::error::SubmodeError;

bitflags! {
    /// Device sub-state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Submode: u32 {
        /// Touchscreen/keypad lock engaged.
        const TKLOCK = 1 << 0;
        /// Single-event eater UI active.
        const EVEATER = 1 << 1;
        /// Soft power-off.
        const SOFTOFF = 1 << 2;
        /// Boot in progress.
        const BOOTUP = 1 << 3;
        /// System state transition in progress.
        const TRANSITION = 1 << 4;
        /// Tklock re-engages on a recorded trigger.
        const AUTORELOCK = 1 << 5;
        /// Unlock slider visible while locked.
        const VISUAL_TKLOCK = 1 << 6;
        /// Device (PIN) lock engaged.
        const DEVLOCK = 1 << 8;
        /// Mode change confirmation pending.
        const MODECHG = 1 << 9;
        /// Device menu open.
        const DEVMENU = 1 << 10;
        /// PIN entry dialog open.
        const VERIFY = 1 << 11;
    }
}

/// Flags that may be held by only one owner at a time.
const EXCLUSIVE: Submode = Submode::MODECHG;

/// Flags that only make sense on top of another flag.
const DEPENDENCIES: [(Submode, Submode); 2] =
    [(Submode::VERIFY, Submode::DEVLOCK), (Submode::VISUAL_TKLOCK, Submode::TKLOCK)];

/// Flag pairs that cannot be set together.
const MUTUALLY_EXCLUSIVE: [Submode; 1] = [Submode::TKLOCK.union(Submode::EVEATER)];

/// A validated set/clear request against the submode register.
///
/// # Invariants
///
/// - A flag is never both set and cleared by the same change.
/// - Setting `MODECHG` while it is held fails: one mode change at a time.
/// - `VERIFY` requires `DEVLOCK`; `VISUAL_TKLOCK` requires `TKLOCK`.
/// - `TKLOCK` and `EVEATER` are never set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmodeChange {
    set: Submode,
    clear: Submode,
}

impl SubmodeChange {
    /// Change that sets `flags`.
    pub fn set(flags: Submode) -> Self {
        Self { set: flags, clear: Submode::empty() }
    }

    /// Change that clears `flags`.
    pub fn clear(flags: Submode) -> Self {
        Self { set: Submode::empty(), clear: flags }
    }

    /// Additionally set `flags`.
    #[must_use]
    pub fn and_set(mut self, flags: Submode) -> Self {
        self.set |= flags;
        self
    }

    /// Additionally clear `flags`.
    #[must_use]
    pub fn and_clear(mut self, flags: Submode) -> Self {
        self.clear |= flags;
        self
    }

    /// Mask that results from applying this change to `current`.
    pub fn apply(self, current: Submode) -> Result<Submode, SubmodeError> {
        let conflicting = self.set & self.clear;
        if !conflicting.is_empty() {
            return Err(SubmodeError::Conflicting(conflicting));
        }

        let held = self.set & current & EXCLUSIVE;
        if !held.is_empty() {
            return Err(SubmodeError::AlreadyHeld(held));
        }

        let next = (current | self.set) - self.clear;

        for (flag, requires) in DEPENDENCIES {
            if next.contains(flag) && !next.contains(requires) {
                return Err(SubmodeError::MissingDependency { flag, requires });
            }
        }

        for pair in MUTUALLY_EXCLUSIVE {
            if next.contains(pair) {
                return Err(SubmodeError::Exclusive(pair));
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_compose() {
        let change = SubmodeChange::set(Submode::DEVLOCK).and_clear(Submode::VERIFY);
        let current = Submode::DEVLOCK | Submode::VERIFY | Submode::TKLOCK;
        assert_eq!(change.apply(current), Ok(Submode::DEVLOCK | Submode::TKLOCK));
    }

    #[test]
    fn second_mode_change_is_rejected() {
        let change = SubmodeChange::set(Submode::MODECHG);
        assert_eq!(change.apply(Submode::MODECHG), Err(SubmodeError::AlreadyHeld(Submode::MODECHG)));
        assert_eq!(change.apply(Submode::empty()), Ok(Submode::MODECHG));
    }

    #[test]
    fn non_exclusive_flags_may_be_set_twice() {
        let change = SubmodeChange::set(Submode::TKLOCK);
        assert_eq!(change.apply(Submode::TKLOCK), Ok(Submode::TKLOCK));
    }

    #[test]
    fn verify_needs_devlock() {
        let change = SubmodeChange::set(Submode::VERIFY);
        assert!(matches!(
            change.apply(Submode::empty()),
            Err(SubmodeError::MissingDependency { flag: Submode::VERIFY, .. })
        ));
    }

    #[test]
    fn clearing_devlock_alone_leaves_dangling_verify() {
        let change = SubmodeChange::clear(Submode::DEVLOCK);
        assert!(change.apply(Submode::DEVLOCK | Submode::VERIFY).is_err());
        let change = change.and_clear(Submode::VERIFY);
        assert_eq!(change.apply(Submode::DEVLOCK | Submode::VERIFY), Ok(Submode::empty()));
    }

    #[test]
    fn lock_and_event_eater_are_exclusive() {
        let change = SubmodeChange::set(Submode::EVEATER);
        assert!(matches!(change.apply(Submode::TKLOCK), Err(SubmodeError::Exclusive(_))));
    }

    #[test]
    fn set_and_clear_of_same_flag_conflicts() {
        let change = SubmodeChange::set(Submode::TKLOCK).and_clear(Submode::TKLOCK);
        assert_eq!(change.apply(Submode::empty()), Err(SubmodeError::Conflicting(Submode::TKLOCK)));
    }
}
