//! Simulation driver implementing the [`Driver`] trait.
//!
//! `SimDriver` replays a script of timed events on a virtual clock, so the
//! same [`devstate_core::Runtime`] loop that runs in the daemon runs in tests.
//! Waiting never blocks: the clock jumps straight to the next scripted event
//! or armed deadline, whichever comes first.

use std::{collections::VecDeque, convert::Infallible, time::Duration};

use devstate_core::{Driver, Event, Wake};

use crate::sim_clock::SimInstant;

/// Scripted driver on a virtual clock.
#[derive(Debug)]
pub struct SimDriver {
    clock: SimInstant,
    script: VecDeque<(SimInstant, Event)>,
    horizon: SimInstant,
    wakes: u64,
}

impl SimDriver {
    /// Driver that stops once the script is exhausted and no deadline falls
    /// before `horizon`.
    pub fn new(horizon: Duration) -> Self {
        Self {
            clock: SimInstant::ZERO,
            script: VecDeque::new(),
            horizon: SimInstant::from_start(horizon),
            wakes: 0,
        }
    }

    /// Deliver `event` at `offset` from the start. Events scheduled before an
    /// earlier one are delivered right after it.
    #[must_use]
    pub fn at(mut self, offset: Duration, event: impl Into<Event>) -> Self {
        self.script.push_back((SimInstant::from_start(offset), event.into()));
        self
    }

    /// Scripted events not delivered yet.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    /// Times the loop was woken.
    pub fn wakes(&self) -> u64 {
        self.wakes
    }

    fn jump_to(&mut self, instant: SimInstant) {
        self.clock = self.clock.max(instant);
    }
}

impl Driver for SimDriver {
    type Error = Infallible;
    type Instant = SimInstant;

    async fn next(&mut self, deadline: Option<SimInstant>) -> Result<Wake, Infallible> {
        self.wakes += 1;
        let scripted = self.script.front().map(|(at, _)| *at);

        match (scripted, deadline) {
            (Some(at), Some(deadline)) if deadline < at => {
                self.jump_to(deadline);
                Ok(Wake::Deadline)
            },
            (Some(_), _) => match self.script.pop_front() {
                Some((at, event)) => {
                    self.jump_to(at);
                    Ok(Wake::Event(event))
                },
                None => Ok(Wake::Shutdown),
            },
            (None, Some(deadline)) if deadline <= self.horizon => {
                self.jump_to(deadline);
                Ok(Wake::Deadline)
            },
            (None, _) => {
                self.jump_to(self.horizon);
                Ok(Wake::Shutdown)
            },
        }
    }

    fn now(&self) -> SimInstant {
        self.clock
    }
}
