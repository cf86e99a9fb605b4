//! Device (PIN) lock.
//!
//! `DEVLOCK` marks the device as PIN-locked and `VERIFY` marks the PIN entry
//! dialog as open. Wrong PINs advance a failure counter which indexes a delay
//! table; while a delay runs no new query is allowed. The lock survives
//! reboots through a `yes`/`no` boot flag file.

use crate::{
    config::DevlockConfig,
    context::Services,
    datapipe::Subsystem,
    event::Notice,
    ipc::{DevlockUiMode, DevlockUiResult, Signal, UiRequest},
    retry::RetryPolicy,
    submode::{Submode, SubmodeChange},
    timer::{Moment, TimerKind},
    types::{CallState, LockState, PowerKeyEvent, SystemState},
};

const ORIGIN: Subsystem = Subsystem::Devlock;

const BOOT_FLAG_LOCKED: &str = "yes";
const BOOT_FLAG_UNLOCKED: &str = "no";

/// Vibrator pattern played on a wrong PIN.
pub const PATTERN_PIN_INCORRECT: &str = "devlock-incorrect";

/// Which PIN UI view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevlockUiState {
    /// Nothing shown.
    Closed,
    /// PIN entry.
    Query,
    /// Waiting out a failure delay.
    Delayed,
    /// Offering shutdown after a cancelled query.
    ShutdownConfirm,
}

/// Device lock state machine.
#[derive(Debug)]
pub struct Devlock {
    config: DevlockConfig,
    retry: RetryPolicy,
    ui_state: DevlockUiState,
    failed_count: u32,
    total_failed: u32,
    query_enabled: bool,
    reopen_after_call: bool,
    autolock_inhibited: bool,
}

impl Devlock {
    /// Unlocked machine with clean counters.
    pub fn new(config: DevlockConfig) -> Self {
        let retry = RetryPolicy::new(config.ui_retry, config.ui_retry_backoff);
        Self {
            config,
            retry,
            ui_state: DevlockUiState::Closed,
            failed_count: 0,
            total_failed: 0,
            query_enabled: true,
            reopen_after_call: false,
            autolock_inhibited: false,
        }
    }

    /// PIN UI view.
    pub fn ui_state(&self) -> DevlockUiState {
        self.ui_state
    }

    /// Consecutive wrong PINs since the last unlock.
    pub fn failed_count(&self) -> u32 {
        self.failed_count
    }

    /// Wrong PINs since start.
    pub fn total_failed(&self) -> u32 {
        self.total_failed
    }

    /// Whether a new PIN query may be opened now.
    pub fn query_enabled(&self) -> bool {
        self.query_enabled
    }

    /// Whether the query reopens when the current call ends.
    pub fn reopen_after_call(&self) -> bool {
        self.reopen_after_call
    }

    /// Whether inactivity locking is suspended.
    pub fn autolock_inhibited(&self) -> bool {
        self.autolock_inhibited
    }

    /// Re-engage the lock if it was held when the device went down.
    pub fn restore<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        match svc.store.read_string(&self.config.boot_flag_file) {
            Ok(Some(flag)) if flag.trim() == BOOT_FLAG_LOCKED => {
                tracing::info!("devlock held at boot");
                self.enable(svc);
            },
            Ok(_) => {},
            Err(err) => tracing::warn!(%err, "cannot read devlock boot flag"),
        }
    }

    /// Engage the lock.
    ///
    /// The failure counter is kept, so the next wrong PIN continues the delay
    /// cycle where it left off.
    pub fn enable<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        svc.cancel(TimerKind::Autolock);
        svc.cancel(TimerKind::ShutdownConfirm);

        let change = SubmodeChange::set(Submode::DEVLOCK).and_clear(Submode::VERIFY);
        if !svc.update_submode(ORIGIN, change) {
            return;
        }

        self.persist(svc, true);
        tracing::info!(failed = self.failed_count, "device locked");
        svc.ui.emit(Signal::DevlockMode { locked: true });
    }

    /// Release the lock. The PIN UI must close first; if it will not, the
    /// device stays locked and `false` is returned.
    pub fn disable<M: Moment>(&mut self, svc: &mut Services<'_, M>) -> bool {
        let closed = self.retry.run("close devlock ui", |_| svc.ui.call(&UiRequest::CloseDevlock));
        self.ui_state = DevlockUiState::Closed;

        if let Err(err) = closed {
            tracing::error!(%err, "pin ui did not close, device stays locked");
            svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VERIFY));
            return false;
        }

        self.failed_count = 0;
        self.query_enabled = true;
        self.reopen_after_call = false;
        svc.cancel(TimerKind::DevlockDelay);
        svc.cancel(TimerKind::ShutdownConfirm);
        svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::DEVLOCK | Submode::VERIFY));

        self.persist(svc, false);
        tracing::info!("device unlocked");
        svc.ui.emit(Signal::DevlockMode { locked: false });
        true
    }

    /// Show the PIN query if the device is locked, nothing else is shown and
    /// no failure delay is running.
    pub fn open_query<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        if !svc.pipes.has_submode(Submode::DEVLOCK) || self.ui_state != DevlockUiState::Closed {
            return;
        }
        if !self.query_enabled {
            tracing::debug!("pin query held back by failure delay");
            return;
        }

        if self.open_ui(svc, DevlockUiMode::Query) {
            self.ui_state = DevlockUiState::Query;
            svc.update_submode(ORIGIN, SubmodeChange::set(Submode::VERIFY));
        }
    }

    /// Result reported by the PIN UI.
    pub fn ui_result<M: Moment>(&mut self, svc: &mut Services<'_, M>, result: DevlockUiResult) {
        if self.ui_state == DevlockUiState::Closed {
            tracing::error!(?result, "devlock callback with no pin ui shown");
            return;
        }
        tracing::debug!(?result, ui = ?self.ui_state, "devlock ui result");

        match result {
            DevlockUiResult::Locked => {
                self.ui_state = DevlockUiState::Closed;
                self.enable(svc);
            },
            DevlockUiResult::Correct => {
                self.disable(svc);
            },
            DevlockUiResult::Incorrect => self.pin_incorrect(svc),
            DevlockUiResult::Cancel => self.cancelled(svc),
        }
    }

    /// Handle a request written to the `device_lock` pipe.
    pub fn handle_request<M: Moment>(&mut self, svc: &mut Services<'_, M>, request: LockState) {
        let locked = svc.pipes.has_submode(Submode::DEVLOCK);
        match request {
            LockState::On | LockState::OnDimmed | LockState::OnSilent | LockState::OnSilentDimmed
                if locked =>
            {
                tracing::debug!(?request, "device already locked");
            },
            LockState::Toggle if !locked => self.enable(svc),
            request if request.is_lock() => self.enable(svc),
            request => tracing::warn!(?request, "devlock can only be released with the pin"),
        }
    }

    /// Suspend or resume the inactivity lock.
    pub fn set_autolock_inhibit<M: Moment>(&mut self, svc: &mut Services<'_, M>, inhibit: bool) {
        self.autolock_inhibited = inhibit;
        if inhibit {
            svc.cancel(TimerKind::Autolock);
        }
        tracing::debug!(inhibit, "autolock inhibit");
    }

    /// The shutdown confirmation timed out; the context requests shutdown.
    pub fn shutdown_confirm_expired(&mut self) {
        tracing::info!("shutdown confirmation timed out");
        self.ui_state = DevlockUiState::Closed;
    }

    pub(crate) fn on_timer<M: Moment>(&mut self, svc: &mut Services<'_, M>, kind: TimerKind) {
        match kind {
            TimerKind::Autolock => {
                if self.autolock_allowed(svc) {
                    tracing::info!("inactivity lock");
                    svc.pipes.device_lock.set(ORIGIN, LockState::On);
                }
            },
            TimerKind::DevlockDelay => {
                self.query_enabled = true;
                if self.ui_state == DevlockUiState::Delayed {
                    self.ui_state = DevlockUiState::Closed;
                    self.open_query(svc);
                }
            },
            _ => {},
        }
    }

    pub(crate) fn on_notice<M: Moment>(&mut self, svc: &mut Services<'_, M>, notice: &Notice) {
        match *notice {
            Notice::DevLockRequest(request) => self.handle_request(svc, request),
            Notice::DeviceInactive(true) => {
                if self.autolock_allowed(svc) {
                    svc.arm(TimerKind::Autolock, self.config.autolock_delay);
                }
            },
            Notice::DeviceInactive(false) => svc.cancel(TimerKind::Autolock),
            Notice::SystemState(state) if state != SystemState::User => {
                svc.cancel(TimerKind::Autolock);
            },
            Notice::CallState(call) => self.call_changed(svc, call),
            Notice::SubmodeChanged { old, new } => {
                let tklock_released =
                    old.contains(Submode::TKLOCK) && !new.contains(Submode::TKLOCK);
                if tklock_released {
                    self.open_query(svc);
                }
            },
            Notice::Input(event) if event.is_press() => self.user_activity(svc),
            Notice::PowerKey(PowerKeyEvent::Short) => self.user_activity(svc),
            _ => {},
        }
    }

    fn user_activity<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        svc.cancel(TimerKind::Autolock);
        if !svc.pipes.has_submode(Submode::TKLOCK) {
            self.open_query(svc);
        }
    }

    fn call_changed<M: Moment>(&mut self, svc: &mut Services<'_, M>, call: CallState) {
        if call.is_ongoing() {
            svc.cancel(TimerKind::Autolock);
        }

        match call {
            CallState::Active if self.ui_state != DevlockUiState::Closed => {
                tracing::info!("closing pin ui for the call");
                let closed =
                    self.retry.run("close devlock ui", |_| svc.ui.call(&UiRequest::CloseDevlock));
                if let Err(err) = closed {
                    tracing::error!(%err, "pin ui did not close for the call");
                }
                svc.cancel(TimerKind::ShutdownConfirm);
                self.ui_state = DevlockUiState::Closed;
                self.reopen_after_call = true;
                svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VERIFY));
            },
            CallState::None if self.reopen_after_call => {
                self.reopen_after_call = false;
                self.open_query(svc);
            },
            _ => {},
        }
    }

    fn pin_incorrect<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        self.failed_count = self.failed_count.saturating_add(1);
        self.total_failed = self.total_failed.saturating_add(1);
        svc.pipes.vibrator_pattern_activate.signal(ORIGIN, PATTERN_PIN_INCORRECT.to_string());

        let delay = self.config.delay_for(self.failed_count);
        tracing::info!(failed = self.failed_count, ?delay, "incorrect pin");

        if delay.is_zero() {
            if self.open_ui(svc, DevlockUiMode::Query) {
                self.ui_state = DevlockUiState::Query;
                svc.update_submode(ORIGIN, SubmodeChange::set(Submode::VERIFY));
            } else {
                self.ui_state = DevlockUiState::Closed;
                svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VERIFY));
            }
            return;
        }

        self.query_enabled = false;
        svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VERIFY));
        self.ui_state = if self.open_ui(svc, DevlockUiMode::Delayed) {
            DevlockUiState::Delayed
        } else {
            DevlockUiState::Closed
        };
        svc.arm(TimerKind::DevlockDelay, delay);
    }

    fn cancelled<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        let previous = self.ui_state;
        self.ui_state = DevlockUiState::Closed;
        svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VERIFY));

        if previous == DevlockUiState::ShutdownConfirm {
            svc.cancel(TimerKind::ShutdownConfirm);
            self.open_query(svc);
            return;
        }

        if svc.pipes.call_state.get().is_ongoing() {
            let locked = svc.pipes.has_submode(Submode::DEVLOCK);
            svc.ui.emit(Signal::DevlockMode { locked });
            return;
        }

        if self.query_enabled && self.open_ui(svc, DevlockUiMode::ShutdownConfirm) {
            self.ui_state = DevlockUiState::ShutdownConfirm;
            svc.arm(TimerKind::ShutdownConfirm, self.config.shutdown_timeout);
        }
    }

    fn autolock_allowed<M: Moment>(&self, svc: &Services<'_, M>) -> bool {
        self.config.autolock_enabled
            && !self.autolock_inhibited
            && svc.pipes.system_state.get() == SystemState::User
            && !svc.pipes.call_state.get().is_ongoing()
            && !svc.pipes.has_submode(Submode::DEVLOCK)
    }

    fn open_ui<M: Moment>(&self, svc: &mut Services<'_, M>, mode: DevlockUiMode) -> bool {
        let request = UiRequest::OpenDevlock { mode };
        match self.retry.run("open devlock ui", |_| svc.ui.call(&request)) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, ?mode, "cannot open pin ui");
                false
            },
        }
    }

    fn persist<M: Moment>(&self, svc: &mut Services<'_, M>, locked: bool) {
        let flag = if locked { BOOT_FLAG_LOCKED } else { BOOT_FLAG_UNLOCKED };
        if let Err(err) = svc.store.write_string(&self.config.boot_flag_file, flag) {
            tracing::warn!(%err, "cannot persist devlock boot flag");
        }
    }
}
