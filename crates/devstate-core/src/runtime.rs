//! Driver abstraction and the generic event loop.
//!
//! The [`Driver`] trait decouples the loop from where events and time come
//! from. The daemon drives it from tokio channels and wall-clock sleeps; the
//! simulation harness drives it from a script and a virtual clock. Both run
//! the same [`Runtime::run`].

use std::future::Future;

use crate::{
    context::MceContext, event::Event, ipc::UiTransport, store::StatusStore, timer::Moment,
};

/// Why the driver woke the loop.
#[derive(Debug)]
pub enum Wake {
    /// An input arrived.
    Event(Event),
    /// The requested deadline passed.
    Deadline,
    /// Stop the loop.
    Shutdown,
}

/// Source of events and time for the [`Runtime`].
pub trait Driver {
    /// Platform-specific error type.
    type Error: std::error::Error + 'static;

    /// Time representation (real or virtual).
    type Instant: Moment;

    /// Wait for the next event, or until `deadline` if one is given.
    fn next(
        &mut self,
        deadline: Option<Self::Instant>,
    ) -> impl Future<Output = Result<Wake, Self::Error>>;

    /// Current time.
    fn now(&self) -> Self::Instant;
}

/// Event loop over a driver and a context.
pub struct Runtime<D, U, S>
where
    D: Driver,
{
    driver: D,
    context: MceContext<U, S, D::Instant>,
}

impl<D, U, S> Runtime<D, U, S>
where
    D: Driver,
    U: UiTransport,
    S: StatusStore,
{
    /// Loop over `driver` feeding `context`.
    pub fn new(driver: D, context: MceContext<U, S, D::Instant>) -> Self {
        Self { driver, context }
    }

    /// Run until the driver asks to stop, then hand the context back.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if waiting for input fails.
    pub async fn run(mut self) -> Result<MceContext<U, S, D::Instant>, D::Error> {
        self.context.start(self.driver.now());

        loop {
            let deadline = self.context.next_deadline();
            match self.driver.next(deadline).await? {
                Wake::Event(event) => {
                    let now = self.driver.now();
                    self.context.handle(event, now);
                },
                Wake::Deadline => {},
                Wake::Shutdown => break,
            }
            self.context.tick(self.driver.now());
        }

        tracing::info!("runtime stopped");
        Ok(self.context)
    }
}
