//! The context that owns the bus, the three state machines and their services.
//!
//! # Event flow
//!
//! ```text
//! Event ──> pipe execute ──> output triggers ──> notice queue
//!                                                     │
//!            tklock.on_notice, devlock.on_notice <────┘
//!                      │
//!                      └──> more pipe executes, UI calls, timers
//! ```
//!
//! Pipe triggers only queue notices. The machines run after the triggering
//! `execute` has returned, one notice at a time, tklock before devlock. This
//! keeps every machine call outside of any pipe's re-entrancy guard.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt::Debug,
    rc::Rc,
    time::Duration,
};

use crate::{
    config::MceConfig,
    datapipe::{Datapipe, Subsystem},
    devlock::Devlock,
    event::{Event, Notice, PipeInput},
    ipc::{
        DevlockUiResult, MethodCall, MethodReply, Responder, TklockUiResult, UiTransport, respond,
    },
    mode::ModeTransition,
    pipes::Datapipes,
    store::StatusStore,
    submode::{Submode, SubmodeChange},
    timer::{MAX_DELAY, Moment, TimerKind, Timers},
    tklock::Tklock,
    types::{DeviceMode, LockState},
};

/// Notices processed per event before the queue is considered runaway.
pub const MAX_NOTICES_PER_EVENT: usize = 256;

/// Rounds of zero-delay timers fired per tick.
const MAX_TIMER_ROUNDS: usize = 16;

type NoticeQueue = Rc<RefCell<VecDeque<Notice>>>;

/// Everything a state machine may touch while handling one input.
pub struct Services<'a, M> {
    /// The bus.
    pub pipes: &'a Datapipes,
    /// One-shot timers.
    pub timers: &'a mut Timers<M>,
    /// UI process.
    pub ui: &'a mut dyn UiTransport,
    /// Status files.
    pub store: &'a mut dyn StatusStore,
    /// Time of the input being handled.
    pub now: M,
}

impl<M: Moment> Services<'_, M> {
    /// Arm `kind` to fire `delay` from now.
    /// Delays above [`MAX_DELAY`] are clamped.
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.timers.arm(kind, self.now + delay.min(MAX_DELAY));
    }

    /// Disarm `kind`.
    pub fn cancel(&mut self, kind: TimerKind) {
        self.timers.cancel(kind);
    }

    /// Apply a submode change, logging a rejected one. Returns whether the
    /// change was applied.
    pub fn update_submode(&self, origin: Subsystem, change: SubmodeChange) -> bool {
        match self.pipes.change_submode(origin, change) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(?origin, %err, "submode change rejected");
                false
            },
        }
    }
}

/// Bus, timers and transports, split from the machines so both can be
/// borrowed at once.
struct Shared<U, S, M> {
    pipes: Datapipes,
    queue: NoticeQueue,
    timers: Timers<M>,
    ui: U,
    store: S,
}

impl<U: UiTransport, S: StatusStore, M: Moment> Shared<U, S, M> {
    fn services(&mut self, now: M) -> Services<'_, M> {
        Services {
            pipes: &self.pipes,
            timers: &mut self.timers,
            ui: &mut self.ui,
            store: &mut self.store,
            now,
        }
    }

    fn next_notice(&self) -> Option<Notice> {
        self.queue.borrow_mut().pop_front()
    }
}

/// Device state context.
///
/// Single-threaded: all inputs, timer expiries and replies are handled on the
/// thread that owns the context.
pub struct MceContext<U, S, M> {
    shared: Shared<U, S, M>,
    modes: ModeTransition,
    devlock: Devlock,
    tklock: Tklock,
}

impl<U, S, M> MceContext<U, S, M>
where
    U: UiTransport,
    S: StatusStore,
    M: Moment,
{
    /// Build the bus and machines and wire their callbacks.
    pub fn new(config: MceConfig, ui: U, store: S) -> Self {
        let pipes = Datapipes::new();
        let queue: NoticeQueue = Rc::new(RefCell::new(VecDeque::new()));

        Tklock::install_filter(&pipes);
        register_notices(&pipes, &queue);

        Self {
            shared: Shared { pipes, queue, timers: Timers::new(), ui, store },
            modes: ModeTransition::new(config.modes),
            devlock: Devlock::new(config.devlock),
            tklock: Tklock::new(config.tklock),
        }
    }

    /// Restore persisted state: saved device mode and devlock boot flag.
    pub fn start(&mut self, now: M) {
        let mut svc = self.shared.services(now);
        self.modes.restore(&mut svc);
        self.devlock.restore(&mut svc);
        self.drain(now);
        let mode = self.shared.pipes.device_mode.get();
        tracing::info!(%mode, submode = ?self.submode(), "device state context started");
    }

    /// Process one input and everything it sets off.
    pub fn handle(&mut self, event: Event, now: M) {
        match event {
            Event::Input(input) => self.apply_input(input),
            Event::Method { call, reply } => self.handle_method(call, reply, now),
        }
        self.drain(now);
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: M) {
        for _ in 0..MAX_TIMER_ROUNDS {
            let expired = self.shared.timers.take_expired(now);
            if expired.is_empty() {
                return;
            }
            for kind in expired {
                self.fire(kind, now);
                self.drain(now);
            }
        }
        tracing::warn!("timers still due after {MAX_TIMER_ROUNDS} rounds");
    }

    /// Earliest armed timer deadline.
    pub fn next_deadline(&self) -> Option<M> {
        self.shared.timers.next_deadline()
    }

    /// The bus.
    pub fn pipes(&self) -> &Datapipes {
        &self.shared.pipes
    }

    /// Current submode.
    pub fn submode(&self) -> Submode {
        self.shared.pipes.submode.get()
    }

    /// Armed timers.
    pub fn timers(&self) -> &Timers<M> {
        &self.shared.timers
    }

    /// UI transport.
    pub fn ui(&self) -> &U {
        &self.shared.ui
    }

    /// UI transport, mutably.
    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.shared.ui
    }

    /// Status store.
    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Status store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.shared.store
    }

    /// Mode transition machine.
    pub fn modes(&self) -> &ModeTransition {
        &self.modes
    }

    /// Device lock machine.
    pub fn devlock(&self) -> &Devlock {
        &self.devlock
    }

    /// Tklock machine.
    pub fn tklock(&self) -> &Tklock {
        &self.tklock
    }

    fn apply_input(&mut self, input: PipeInput) {
        const EXT: Subsystem = Subsystem::External;
        let p = &self.shared.pipes;

        tracing::trace!(?input, "pipe input");
        match input {
            PipeInput::SystemState(v) => {
                p.system_state.set(EXT, v);
            },
            PipeInput::DisplayState(v) => {
                p.display_state.set(EXT, v);
            },
            PipeInput::DeviceInactive(v) => {
                p.device_inactive.set(EXT, v);
            },
            PipeInput::CallState(v) => {
                p.call_state.set(EXT, v);
            },
            PipeInput::CallType(v) => {
                p.call_type.set(EXT, v);
            },
            PipeInput::AlarmUiState(v) => {
                p.alarm_ui_state.set(EXT, v);
            },
            PipeInput::AudioRoute(v) => {
                p.audio_route.set(EXT, v);
            },
            PipeInput::Proximity(v) => {
                p.proximity.set(EXT, v);
            },
            PipeInput::KeyboardSlide(v) => {
                p.keyboard_slide.set(EXT, v);
            },
            PipeInput::LensCover(v) => {
                p.lens_cover.set(EXT, v);
            },
            PipeInput::LidCover(v) => {
                p.lid_cover.set(EXT, v);
            },
            PipeInput::PowerKey(v) => {
                p.power_key.signal(EXT, v);
            },
            PipeInput::Input(v) => {
                p.input_event.signal(EXT, v);
            },
            PipeInput::ConnectivityActive(v) => {
                p.connectivity_active.set(EXT, v);
            },
            PipeInput::TkLock(v) => {
                p.tk_lock.set(EXT, v);
            },
            PipeInput::DeviceLock(v) => {
                p.device_lock.set(EXT, v);
            },
        }
    }

    fn handle_method(&mut self, call: MethodCall, reply: Option<Responder>, now: M) {
        tracing::debug!(?call, "method call");
        let mut svc = self.shared.services(now);

        match call {
            MethodCall::GetDeviceMode => {
                let mode = svc.pipes.device_mode.get();
                respond(reply, MethodReply::Mode(mode.as_str().to_string()));
            },
            MethodCall::ChangeDeviceMode(name) => {
                let mode = DeviceMode::parse(&name);
                self.modes.set_device_mode(&mut svc, mode, reply);
            },
            MethodCall::GetTklockMode => {
                let name = lock_name(svc.pipes.has_submode(Submode::TKLOCK));
                respond(reply, MethodReply::TklockMode(name.to_string()));
            },
            MethodCall::ChangeTklockMode(name) => match LockState::parse(&name) {
                Ok(request) => {
                    svc.pipes.tk_lock.set(Subsystem::External, request);
                    respond(reply, MethodReply::Ack(true));
                },
                Err(err) => {
                    tracing::error!(%err, "bad tklock mode request");
                    respond(reply, MethodReply::Ack(false));
                },
            },
            MethodCall::GetDevlockMode => {
                let name = lock_name(svc.pipes.has_submode(Submode::DEVLOCK));
                respond(reply, MethodReply::DevlockMode(name.to_string()));
            },
            MethodCall::ModeChangeCallback(code) => {
                let handled = self.modes.is_pending();
                self.modes.dialog_result(&mut svc, code);
                respond(reply, MethodReply::Ack(handled));
            },
            MethodCall::TklockCallback(code) => match TklockUiResult::try_from(code) {
                Ok(result) => {
                    self.tklock.ui_result(&mut svc, result);
                    respond(reply, MethodReply::Ack(true));
                },
                Err(err) => {
                    tracing::error!(%err, "bad tklock callback");
                    respond(reply, MethodReply::Ack(false));
                },
            },
            MethodCall::DevlockCallback(code) => match DevlockUiResult::try_from(code) {
                Ok(result) => {
                    self.devlock.ui_result(&mut svc, result);
                    respond(reply, MethodReply::Ack(true));
                },
                Err(err) => {
                    tracing::error!(%err, "bad devlock callback");
                    respond(reply, MethodReply::Ack(false));
                },
            },
            MethodCall::SetAutolockInhibit(inhibit) => {
                self.devlock.set_autolock_inhibit(&mut svc, inhibit);
                respond(reply, MethodReply::Ack(true));
            },
        }
    }

    fn fire(&mut self, kind: TimerKind, now: M) {
        tracing::debug!(?kind, "timer expired");
        let mut svc = self.shared.services(now);

        match kind {
            TimerKind::TklockDim
            | TimerKind::TklockBlank
            | TimerKind::VisualBlank
            | TimerKind::ForcedVisualBlank
            | TimerKind::DelayedUnlock => self.tklock.on_timer(&mut svc, kind),
            TimerKind::Autolock | TimerKind::DevlockDelay => self.devlock.on_timer(&mut svc, kind),
            TimerKind::ShutdownConfirm => {
                self.devlock.shutdown_confirm_expired();
                self.modes.request_shutdown(&mut svc);
            },
        }
    }

    fn drain(&mut self, now: M) {
        let mut processed = 0;
        while let Some(notice) = self.shared.next_notice() {
            processed += 1;
            if processed > MAX_NOTICES_PER_EVENT {
                tracing::error!(limit = MAX_NOTICES_PER_EVENT, "notice storm, dropping queue");
                self.shared.queue.borrow_mut().clear();
                return;
            }

            tracing::trace!(?notice, "notice");
            let mut svc = self.shared.services(now);
            self.tklock.on_notice(&mut svc, &notice);
            self.devlock.on_notice(&mut svc, &notice);
        }
    }
}

impl<U, S, M: Debug> Debug for MceContext<U, S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MceContext")
            .field("submode", &self.shared.pipes.submode.get())
            .field("device_mode", &self.shared.pipes.device_mode.get())
            .field("timers", &self.shared.timers)
            .field("modes", &self.modes)
            .field("devlock", &self.devlock)
            .field("tklock", &self.tklock)
            .finish_non_exhaustive()
    }
}

fn lock_name(locked: bool) -> &'static str {
    if locked { "locked" } else { "unlocked" }
}

fn forward<T>(pipe: &Datapipe<T>, queue: &NoticeQueue, wrap: fn(T) -> Notice)
where
    T: Clone + Debug + 'static,
{
    let queue = Rc::clone(queue);
    pipe.append_output_trigger(move |value| queue.borrow_mut().push_back(wrap(value.clone())));
}

fn register_notices(pipes: &Datapipes, queue: &NoticeQueue) {
    forward(&pipes.system_state, queue, Notice::SystemState);
    forward(&pipes.display_state, queue, Notice::DisplayState);
    forward(&pipes.device_inactive, queue, Notice::DeviceInactive);
    forward(&pipes.call_state, queue, Notice::CallState);
    forward(&pipes.alarm_ui_state, queue, Notice::AlarmUiState);
    forward(&pipes.audio_route, queue, Notice::AudioRoute);
    forward(&pipes.proximity, queue, Notice::Proximity);
    forward(&pipes.keyboard_slide, queue, Notice::KeyboardSlide);
    forward(&pipes.lens_cover, queue, Notice::LensCover);
    forward(&pipes.lid_cover, queue, Notice::LidCover);
    forward(&pipes.power_key, queue, Notice::PowerKey);
    forward(&pipes.input_event, queue, Notice::Input);
    forward(&pipes.tk_lock, queue, Notice::TkLockRequest);
    forward(&pipes.device_lock, queue, Notice::DevLockRequest);

    let last = Cell::new(pipes.submode.get());
    let queue = Rc::clone(queue);
    pipes.submode.append_output_trigger(move |new| {
        let old = last.replace(*new);
        if old != *new {
            queue.borrow_mut().push_back(Notice::SubmodeChanged { old, new: *new });
        }
    });
}
