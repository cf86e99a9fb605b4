//! Context on a virtual clock.
//!
//! [`SimWorld`] owns an `MceContext` wired to a [`SimUi`] and a
//! [`MemoryStore`], delivers inputs and method calls at the current virtual
//! time, and advances the clock deadline by deadline. The standard invariants
//! are checked after every step unless turned off.

use std::time::Duration;

use devstate_core::{
    Event, MceConfig, MceContext, MemoryStore, MethodCall, MethodReply, PipeInput, Submode,
    SystemState,
};
use tokio::sync::oneshot;

use crate::{
    invariants::{InvariantRegistry, SystemSnapshot},
    sim_clock::SimInstant,
    sim_ui::SimUi,
};

/// Context type driven by the simulation.
pub type SimContext = MceContext<SimUi, MemoryStore, SimInstant>;

/// Simulated device.
#[derive(Debug)]
pub struct SimWorld {
    context: SimContext,
    now: SimInstant,
    invariants: Option<InvariantRegistry>,
    steps: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(MceConfig::default(), MemoryStore::new())
    }
}

impl SimWorld {
    /// Started context with standard invariant checking.
    pub fn new(config: MceConfig, store: MemoryStore) -> Self {
        let mut context = MceContext::new(config, SimUi::new(), store);
        context.start(SimInstant::ZERO);

        let world = Self {
            context,
            now: SimInstant::ZERO,
            invariants: Some(InvariantRegistry::standard()),
            steps: 0,
        };
        world.check("after start");
        world
    }

    /// Default device in the user session with the display on.
    pub fn booted() -> Self {
        Self::booted_with(MceConfig::default())
    }

    /// Device in the user session with the display on.
    pub fn booted_with(config: MceConfig) -> Self {
        let mut world = Self::new(config, MemoryStore::new());
        world.send(PipeInput::SystemState(SystemState::User));
        world.send(PipeInput::DisplayState(devstate_core::DisplayState::On));
        world
    }

    /// Replace the invariants checked after each step.
    #[must_use]
    pub fn with_invariants(mut self, registry: Option<InvariantRegistry>) -> Self {
        self.invariants = registry;
        self
    }

    /// Deliver a pipe input now.
    pub fn send(&mut self, input: PipeInput) {
        self.step(Event::Input(input));
    }

    /// Deliver several pipe inputs now, in order.
    pub fn send_all(&mut self, inputs: impl IntoIterator<Item = PipeInput>) {
        for input in inputs {
            self.send(input);
        }
    }

    /// Make a method call and return its reply if one was sent right away.
    pub fn call(&mut self, call: MethodCall) -> Option<MethodReply> {
        let mut rx = self.call_deferred(call);
        rx.try_recv().ok()
    }

    /// Make a method call whose reply may arrive later.
    pub fn call_deferred(&mut self, call: MethodCall) -> oneshot::Receiver<MethodReply> {
        let (tx, rx) = oneshot::channel();
        self.step(Event::Method { call, reply: Some(tx) });
        rx
    }

    /// Move the clock forward by `by`, firing every deadline on the way at
    /// its own instant.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        while let Some(deadline) = self.context.next_deadline() {
            if deadline > target {
                break;
            }
            self.now = self.now.max(deadline);
            self.context.tick(self.now);
            self.check("after timer");
        }
        self.now = target;
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// The context under test.
    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// The simulated UI.
    pub fn ui(&self) -> &SimUi {
        self.context.ui()
    }

    /// The simulated UI, for failure injection.
    pub fn ui_mut(&mut self) -> &mut SimUi {
        self.context.ui_mut()
    }

    /// The status store.
    pub fn store(&self) -> &MemoryStore {
        self.context.store()
    }

    /// Submode register.
    pub fn submode(&self) -> Submode {
        self.context.submode()
    }

    /// Whether all of `flags` are set.
    pub fn has(&self, flags: Submode) -> bool {
        self.submode().contains(flags)
    }

    /// Observable state right now.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_context(&self.context)
    }

    /// Steps handled so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn step(&mut self, event: Event) {
        self.steps += 1;
        tracing::trace!(step = self.steps, now = %self.now, ?event, "sim step");
        self.context.handle(event, self.now);
        self.context.tick(self.now);
        self.check("after event");
    }

    fn check(&self, context: &str) {
        if let Some(registry) = &self.invariants {
            let context = format!("{context} (step {}, {})", self.steps, self.now);
            registry.assert_all(&self.snapshot(), &context);
        }
    }
}

#[cfg(test)]
mod tests {
    use devstate_core::{DisplayState, LockState};

    use super::*;

    #[test]
    fn advance_fires_deadlines_in_order() {
        let mut world = SimWorld::booted();
        world.send(PipeInput::TkLock(LockState::On));
        assert!(world.has(Submode::TKLOCK));

        world.advance(Duration::from_secs(3));
        assert_eq!(world.context().pipes().display_state.get(), DisplayState::Dim);

        world.advance(Duration::from_secs(3));
        assert_eq!(world.context().pipes().display_state.get(), DisplayState::Off);
        assert_eq!(world.now().elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn immediate_replies_are_returned() {
        let mut world = SimWorld::booted();
        assert_eq!(
            world.call(MethodCall::GetDeviceMode),
            Some(MethodReply::Mode("normal".to_string()))
        );
    }
}
