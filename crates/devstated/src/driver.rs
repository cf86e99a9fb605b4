//! Production driver.
//!
//! Inputs arrive over an unbounded tokio channel from whatever transports
//! feed the daemon; time is `tokio::time`. The loop stops on Ctrl-C or when
//! every sender is gone.

use devstate_core::{Driver, Event, MethodCall, MethodReply, Wake};
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};

use crate::error::RuntimeError;

/// Handle for feeding events into a running [`SystemDriver`].
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    /// Queue `event`. Returns `false` once the daemon has stopped.
    pub fn send(&self, event: impl Into<Event>) -> bool {
        self.tx.send(event.into()).is_ok()
    }

    /// Queue a method call and hand back where its reply will arrive.
    pub fn call(&self, call: MethodCall) -> Option<oneshot::Receiver<MethodReply>> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::Method { call, reply: Some(reply) }).then_some(rx)
    }
}

/// Driver on tokio channels and timers.
#[derive(Debug)]
pub struct SystemDriver {
    events: mpsc::UnboundedReceiver<Event>,
    handle_interrupt: bool,
}

impl SystemDriver {
    /// Driver and the sender that feeds it. Ctrl-C stops the loop.
    pub fn channel() -> (Self, EventSender) {
        let (tx, events) = mpsc::unbounded_channel();
        (Self { events, handle_interrupt: true }, EventSender { tx })
    }

    /// Leave Ctrl-C to the default handler. The loop then only stops when
    /// every sender is dropped.
    #[must_use]
    pub fn without_interrupt(mut self) -> Self {
        self.handle_interrupt = false;
        self
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn interrupt(enabled: bool) -> std::io::Result<()> {
    if enabled { tokio::signal::ctrl_c().await } else { std::future::pending().await }
}

impl Driver for SystemDriver {
    type Error = RuntimeError;
    type Instant = Instant;

    async fn next(&mut self, deadline: Option<Instant>) -> Result<Wake, RuntimeError> {
        tokio::select! {
            event = self.events.recv() => match event {
                Some(event) => Ok(Wake::Event(event)),
                None => {
                    tracing::info!("all event sources closed");
                    Ok(Wake::Shutdown)
                },
            },
            () = sleep_until(deadline) => Ok(Wake::Deadline),
            signal = interrupt(self.handle_interrupt) => {
                signal.map_err(RuntimeError::Signal)?;
                tracing::info!("interrupted");
                Ok(Wake::Shutdown)
            },
        }
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
