//! One-shot timers keyed by purpose.
//!
//! The core never sleeps. Machines arm deadlines here; the runtime asks for
//! [`Timers::next_deadline`], waits, and hands expired kinds back to the
//! context. Time is generic so simulation can run on a virtual clock.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Longest delay a timer is armed with. Longer delays are clamped.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// A point in time, real or virtual.
pub trait Moment:
    Copy + Ord + Debug + Add<Duration, Output = Self> + Sub<Output = Duration>
{
}

impl<T> Moment for T where
    T: Copy + Ord + Debug + Add<Duration, Output = T> + Sub<Output = Duration>
{
}

/// What a timer is for. At most one timer of each kind is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Locked display goes from on to dim.
    TklockDim,
    /// Dimmed display blanks.
    TklockBlank,
    /// Slider idle timeout.
    VisualBlank,
    /// Slider hard timeout, not extended by touches.
    ForcedVisualBlank,
    /// Deferred unlock for `OffDelayed`.
    DelayedUnlock,
    /// Inactivity devlock.
    Autolock,
    /// Wait before the next PIN query is allowed.
    DevlockDelay,
    /// Shutdown confirmation dialog timeout.
    ShutdownConfirm,
}

/// Armed deadlines.
#[derive(Debug, Clone)]
pub struct Timers<M> {
    deadlines: BTreeMap<TimerKind, M>,
}

impl<M: Moment> Default for Timers<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Moment> Timers<M> {
    /// No timers armed.
    pub fn new() -> Self {
        Self { deadlines: BTreeMap::new() }
    }

    /// Arm `kind` to expire at `deadline`, replacing any earlier arming.
    pub fn arm(&mut self, kind: TimerKind, deadline: M) {
        tracing::trace!(?kind, ?deadline, "timer armed");
        self.deadlines.insert(kind, deadline);
    }

    /// Disarm `kind`. Disarming an idle timer is a no-op.
    pub fn cancel(&mut self, kind: TimerKind) {
        if self.deadlines.remove(&kind).is_some() {
            tracing::trace!(?kind, "timer cancelled");
        }
    }

    /// Whether `kind` is armed.
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Time left on `kind`, zero if already due.
    pub fn remaining(&self, kind: TimerKind, now: M) -> Option<Duration> {
        self.deadlines
            .get(&kind)
            .map(|deadline| if *deadline > now { *deadline - now } else { Duration::ZERO })
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<M> {
        self.deadlines.values().min().copied()
    }

    /// Disarm and return every timer due at `now`, earliest first.
    ///
    /// Ties are broken by [`TimerKind`] order.
    pub fn take_expired(&mut self, now: M) -> Vec<TimerKind> {
        let mut expired: Vec<(M, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(kind, deadline)| (*deadline, *kind))
            .collect();
        expired.sort();

        for (_, kind) in &expired {
            self.deadlines.remove(kind);
        }
        expired.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// No timers armed.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
