//! Virtual time.
//!
//! [`SimInstant`] is an offset from the start of the simulation. It satisfies
//! [`devstate_core::Moment`], so the context and timers run on it unchanged.

use std::{
    fmt,
    ops::{Add, Sub},
    time::Duration,
};

/// Point on the virtual clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Start of the simulation.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Instant `offset` after the start.
    pub fn from_start(offset: Duration) -> Self {
        Self(offset)
    }

    /// Time elapsed since the start.
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for SimInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}ms", self.0.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_saturates_at_start() {
        let early = SimInstant::from_start(Duration::from_secs(1));
        let late = early + Duration::from_secs(4);

        assert_eq!(late - early, Duration::from_secs(4));
        assert_eq!(early - late, Duration::ZERO);
        assert_eq!(late.to_string(), "t+5000ms");
    }
}
