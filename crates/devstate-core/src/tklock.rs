//! Touchscreen/keypad lock.
//!
//! The lock UI is in exactly one of four states, mirrored by the submode:
//!
//! | UI state     | submode                    |
//! |--------------|----------------------------|
//! | `None`       | none of the below          |
//! | `Normal`     | `TKLOCK`                   |
//! | `Slider`     | `TKLOCK \| VISUAL_TKLOCK`  |
//! | `EventEater` | `EVEATER`                  |
//!
//! A lock can be taken by the user, by policy (display blanking, lid, power
//! key) or by the proximity sensor during a call. Sensors that unlocked the
//! device are remembered as autorelock triggers so that closing them locks
//! again; `AUTORELOCK` is set exactly while the trigger set is non-empty.

use std::rc::Rc;

use bitflags::bitflags;

use crate::{
    config::TklockConfig,
    context::Services,
    datapipe::{CallbackId, Subsystem},
    event::Notice,
    ipc::{Signal, TklockUiMode, TklockUiResult, UiRequest},
    pipes::Datapipes,
    retry::RetryPolicy,
    submode::{Submode, SubmodeChange},
    timer::{Moment, TimerKind},
    types::{
        AlarmUiState, AudioRoute, CallState, CoverState, DisplayState, InputEvent, LockState,
        PowerKeyEvent, SystemState,
    },
};

const ORIGIN: Subsystem = Subsystem::Tklock;

/// LED pattern played when the lock engages.
pub const PATTERN_TKLOCK_ENGAGED: &str = "tklock-engaged";

/// Timers that only make sense while the lock UI is up.
const LOCK_TIMERS: [TimerKind; 5] = [
    TimerKind::TklockDim,
    TimerKind::TklockBlank,
    TimerKind::VisualBlank,
    TimerKind::ForcedVisualBlank,
    TimerKind::DelayedUnlock,
];

bitflags! {
    /// Sensors whose closing re-engages the lock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AutorelockTriggers: u8 {
        /// Keyboard slide was opened while locked.
        const KBD_SLIDE = 1 << 0;
        /// Lens cover was opened while locked.
        const LENS_COVER = 1 << 1;
        /// Proximity sensor locked or unlocked during a call.
        const ON_PROXIMITY = 1 << 2;
    }
}

/// Lock UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TklockUiState {
    /// No lock UI.
    None,
    /// Lock screen.
    Normal,
    /// Event eater.
    EventEater,
    /// Unlock slider over the lock screen.
    Slider,
}

/// Touch/key event filter installed on the `input_event` pipe.
///
/// Presses are vetoed while locked unless the slider is visible. With the
/// event eater up the press is turned into [`InputEvent::Swallowed`], which
/// tells tklock to drop the eater and nobody else to act on it.
pub fn filter_input(submode: Submode, event: InputEvent) -> Option<InputEvent> {
    if !event.is_press() || submode.contains(Submode::VISUAL_TKLOCK) {
        Some(event)
    } else if submode.contains(Submode::TKLOCK) {
        None
    } else if submode.contains(Submode::EVEATER) {
        Some(InputEvent::Swallowed)
    } else {
        Some(event)
    }
}

/// Tklock state machine.
#[derive(Debug)]
pub struct Tklock {
    config: TklockConfig,
    retry: RetryPolicy,
    ui_state: TklockUiState,
    triggers: AutorelockTriggers,
    relock_inhibited: bool,
    saved_for_alarm: bool,
}

impl Tklock {
    /// Unlocked machine.
    pub fn new(config: TklockConfig) -> Self {
        let retry = RetryPolicy::new(config.ui_retry, config.ui_retry_backoff);
        Self {
            config,
            retry,
            ui_state: TklockUiState::None,
            triggers: AutorelockTriggers::empty(),
            relock_inhibited: false,
            saved_for_alarm: false,
        }
    }

    /// Install the input filter.
    pub fn install_filter(pipes: &Datapipes) -> CallbackId {
        let submode = Rc::clone(&pipes.submode);
        pipes.input_event.append_filter(move |event| filter_input(submode.get(), event))
    }

    /// Lock UI state.
    pub fn ui_state(&self) -> TklockUiState {
        self.ui_state
    }

    /// Recorded autorelock triggers.
    pub fn triggers(&self) -> AutorelockTriggers {
        self.triggers
    }

    /// The user unlocked a proximity lock during the current call.
    pub fn relock_inhibited(&self) -> bool {
        self.relock_inhibited
    }

    /// The lock was lifted for an alarm and comes back when it ends.
    pub fn saved_for_alarm(&self) -> bool {
        self.saved_for_alarm
    }

    /// Engage the lock. Returns whether the lock is held afterwards.
    pub fn enable_tklock<M: Moment>(&mut self, svc: &mut Services<'_, M>, silent: bool) -> bool {
        if svc.pipes.has_submode(Submode::TKLOCK) {
            return true;
        }
        if svc.pipes.has_submode(Submode::EVEATER) {
            self.disable_eveater(svc);
        }

        let request = UiRequest::OpenTklock { mode: TklockUiMode::Normal, silent };
        if let Err(err) = svc.ui.call(&request) {
            tracing::warn!(%err, "cannot open lock ui");
            self.force_closed(svc, silent);
            return false;
        }
        if !svc.update_submode(ORIGIN, SubmodeChange::set(Submode::TKLOCK)) {
            self.force_closed(svc, silent);
            return false;
        }

        self.ui_state = TklockUiState::Normal;
        svc.pipes.keypad_enabled.set(ORIGIN, false);
        svc.pipes.led_pattern_activate.signal(ORIGIN, PATTERN_TKLOCK_ENGAGED.to_string());
        tracing::info!(silent, "tklock engaged");
        svc.ui.emit(Signal::TklockMode { locked: true });
        true
    }

    /// Release the lock. Releasing an unlocked device does nothing.
    ///
    /// A UI that refuses to close does not keep the device locked: after the
    /// retries run out the local state is forced to unlocked.
    pub fn disable_tklock<M: Moment>(&mut self, svc: &mut Services<'_, M>, silent: bool) {
        if !svc.pipes.has_submode(Submode::TKLOCK) {
            return;
        }
        self.close_ui(svc, silent);
        self.release(svc);
        tracing::info!(silent, "tklock released");
        svc.ui.emit(Signal::TklockMode { locked: false });
    }

    /// Put up the event eater, replacing the lock if it is held.
    pub fn enable_eveater<M: Moment>(&mut self, svc: &mut Services<'_, M>) -> bool {
        if svc.pipes.has_submode(Submode::EVEATER) {
            return true;
        }
        if svc.pipes.has_submode(Submode::TKLOCK) {
            self.disable_tklock(svc, true);
        }

        let request = UiRequest::OpenTklock { mode: TklockUiMode::EventEater, silent: true };
        if let Err(err) = svc.ui.call(&request) {
            tracing::warn!(%err, "cannot open event eater");
            self.force_closed(svc, true);
            return false;
        }
        if !svc.update_submode(ORIGIN, SubmodeChange::set(Submode::EVEATER)) {
            self.force_closed(svc, true);
            return false;
        }

        self.ui_state = TklockUiState::EventEater;
        tracing::debug!("event eater up");
        true
    }

    /// Take the event eater down.
    pub fn disable_eveater<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        if !svc.pipes.has_submode(Submode::EVEATER) {
            return;
        }
        self.close_ui(svc, true);
        self.release(svc);
        tracing::debug!("event eater down");
    }

    /// Lock and start the dim/blank cascade. Outside the user state this
    /// does nothing and reports success.
    pub fn enable_tklock_policy<M: Moment>(
        &mut self,
        svc: &mut Services<'_, M>,
        force_blank: bool,
    ) -> bool {
        if svc.pipes.system_state.get() != SystemState::User {
            tracing::debug!("tklock policy skipped outside user state");
            return true;
        }
        if !self.enable_tklock(svc, false) {
            return false;
        }
        svc.pipes.touchscreen_enabled.set(ORIGIN, false);

        if force_blank || self.config.blank_immediately {
            self.blank(svc);
        } else if self.config.dim_immediately {
            self.dim(svc);
        } else {
            svc.arm(TimerKind::TklockDim, self.config.dim_delay);
        }
        true
    }

    /// Forget sensor triggers after user interaction, unless the lock is held
    /// or proximity is the only trigger.
    pub fn disable_autorelock_policy<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        if self.triggers == AutorelockTriggers::ON_PROXIMITY
            || svc.pipes.has_submode(Submode::TKLOCK)
        {
            return;
        }
        self.set_triggers(svc, AutorelockTriggers::empty());
    }

    /// Lock or unlock according to proximity, call, alarm and audio routing.
    pub fn process_proximity_state<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        let proximity = svc.pipes.proximity.get();
        let call = svc.pipes.call_state.get();
        let alarm = svc.pipes.alarm_ui_state.get();
        let route = svc.pipes.audio_route.get();
        let slide = svc.pipes.keyboard_slide.get();
        let locked = svc.pipes.has_submode(Submode::TKLOCK);
        let proximity_locked = locked && self.triggers.contains(AutorelockTriggers::ON_PROXIMITY);

        let alerting = call == CallState::Ringing || alarm.is_alerting();
        if (proximity_locked && self.relock_inhibited)
            || (alerting && proximity == CoverState::Open)
        {
            tracing::debug!(?call, ?alarm, "proximity force unlock");
            self.force_unlock(svc);
            self.set_triggers(svc, AutorelockTriggers::ON_PROXIMITY);
            return;
        }

        let at_ear = matches!(route, AudioRoute::Handset | AudioRoute::Headset)
            || (route == AudioRoute::Speaker && call == CallState::Ringing);
        if !call.is_ongoing() || !at_ear || slide == CoverState::Open {
            return;
        }

        let only_proximity = self.triggers == AutorelockTriggers::ON_PROXIMITY;
        match proximity {
            CoverState::Open if only_proximity => {
                tracing::debug!("proximity uncovered during call");
                self.disable_tklock(svc, false);
                self.display_on(svc);
                self.set_triggers(svc, AutorelockTriggers::empty());
            },
            CoverState::Closed if !self.relock_inhibited && (!locked || only_proximity) => {
                tracing::debug!("proximity covered during call");
                self.enable_tklock_policy(svc, true);
                if svc.pipes.has_submode(Submode::TKLOCK) {
                    self.set_triggers(svc, AutorelockTriggers::ON_PROXIMITY);
                }
            },
            _ => {},
        }
    }

    /// Handle a request written to the `tk_lock` pipe.
    pub fn handle_request<M: Moment>(&mut self, svc: &mut Services<'_, M>, request: LockState) {
        tracing::debug!(?request, "tklock request");
        match request {
            LockState::Off | LockState::OffSilent => {
                let silent = request == LockState::OffSilent;
                self.disable_eveater(svc);
                self.disable_tklock(svc, silent);
            },
            LockState::OffDelayed => {
                if svc.pipes.has_submode(Submode::TKLOCK) {
                    svc.arm(TimerKind::DelayedUnlock, self.config.unlock_delay);
                }
            },
            LockState::On => {
                self.enable_tklock_policy(svc, false);
            },
            LockState::OnDimmed | LockState::OnSilentDimmed => {
                if self.enable_tklock(svc, request == LockState::OnSilentDimmed) {
                    self.dim(svc);
                }
            },
            LockState::OnSilent => {
                self.enable_tklock(svc, true);
            },
            LockState::Toggle => {
                if svc.pipes.has_submode(Submode::TKLOCK) {
                    self.disable_tklock(svc, false);
                } else {
                    self.enable_tklock_policy(svc, false);
                }
            },
        }
    }

    /// Result reported by the lock UI.
    pub fn ui_result<M: Moment>(&mut self, svc: &mut Services<'_, M>, result: TklockUiResult) {
        if self.ui_state == TklockUiState::None {
            tracing::error!(?result, "tklock callback with no lock ui shown");
            return;
        }
        tracing::debug!(?result, ui = ?self.ui_state, "tklock ui result");

        match result {
            TklockUiResult::Unlock => {
                if svc.pipes.call_state.get().is_ongoing()
                    && self.triggers.contains(AutorelockTriggers::ON_PROXIMITY)
                {
                    self.relock_inhibited = true;
                }
                self.disable_eveater(svc);
                self.disable_tklock(svc, false);
                self.display_on(svc);
            },
            TklockUiResult::Retry => {
                let mode = match self.ui_state {
                    TklockUiState::EventEater => TklockUiMode::EventEater,
                    TklockUiState::Slider => TklockUiMode::Slider,
                    TklockUiState::Normal | TklockUiState::None => TklockUiMode::Normal,
                };
                if let Err(err) = svc.ui.call(&UiRequest::OpenTklock { mode, silent: true }) {
                    tracing::warn!(%err, ?mode, "cannot reopen lock ui");
                    let was_locked = svc.pipes.has_submode(Submode::TKLOCK);
                    self.force_closed(svc, true);
                    if was_locked {
                        svc.ui.emit(Signal::TklockMode { locked: false });
                    }
                }
            },
            TklockUiResult::Timeout => {
                if self.ui_state == TklockUiState::Slider {
                    self.hide_visual(svc);
                }
            },
            TklockUiResult::Closed => {
                let was_locked = svc.pipes.has_submode(Submode::TKLOCK);
                self.release(svc);
                if was_locked {
                    tracing::info!("lock ui closed by peer");
                    svc.ui.emit(Signal::TklockMode { locked: false });
                }
            },
        }
    }

    pub(crate) fn on_timer<M: Moment>(&mut self, svc: &mut Services<'_, M>, kind: TimerKind) {
        match kind {
            TimerKind::TklockDim if svc.pipes.has_submode(Submode::TKLOCK) => self.dim(svc),
            TimerKind::TklockBlank if svc.pipes.has_submode(Submode::TKLOCK) => self.blank(svc),
            TimerKind::VisualBlank | TimerKind::ForcedVisualBlank => self.hide_visual(svc),
            TimerKind::DelayedUnlock => self.disable_tklock(svc, true),
            _ => {},
        }
    }

    pub(crate) fn on_notice<M: Moment>(&mut self, svc: &mut Services<'_, M>, notice: &Notice) {
        match *notice {
            Notice::TkLockRequest(request) => self.handle_request(svc, request),
            Notice::DisplayState(DisplayState::Off) => self.display_off(svc),
            Notice::CallState(call) => {
                if call == CallState::None {
                    self.call_ended(svc);
                }
                self.process_proximity_state(svc);
            },
            Notice::AlarmUiState(alarm) => {
                self.alarm_changed(svc, alarm);
                self.process_proximity_state(svc);
            },
            Notice::AudioRoute(_) | Notice::Proximity(_) => self.process_proximity_state(svc),
            Notice::KeyboardSlide(state) => {
                self.cover_changed(svc, state, AutorelockTriggers::KBD_SLIDE);
                self.process_proximity_state(svc);
            },
            Notice::LensCover(state) => {
                self.cover_changed(svc, state, AutorelockTriggers::LENS_COVER);
            },
            Notice::LidCover(CoverState::Closed) => {
                self.enable_tklock_policy(svc, true);
            },
            Notice::LidCover(CoverState::Open) => {
                self.disable_tklock(svc, false);
                self.display_on(svc);
            },
            Notice::PowerKey(event) => self.power_key(svc, event),
            Notice::Input(InputEvent::Swallowed) => {
                self.disable_eveater(svc);
                self.display_on(svc);
            },
            Notice::Input(event) if event.is_press() => {
                if self.ui_state == TklockUiState::Slider {
                    svc.arm(TimerKind::VisualBlank, self.config.visual_blank_delay);
                }
            },
            _ => {},
        }
    }

    fn display_off<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        match svc.pipes.system_state.get() {
            SystemState::ActDead => {
                self.enable_eveater(svc);
            },
            SystemState::User => {
                let busy = svc.pipes.call_state.get().is_ongoing()
                    || svc.pipes.alarm_ui_state.get().is_alerting();
                if self.config.lock_on_blank
                    && !busy
                    && !svc.pipes.has_submode(Submode::TKLOCK)
                    && self.enable_tklock(svc, true)
                {
                    svc.pipes.touchscreen_enabled.set(ORIGIN, false);
                }
            },
            _ => {},
        }
    }

    fn call_ended<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        self.relock_inhibited = false;
        if self.triggers == AutorelockTriggers::ON_PROXIMITY {
            self.set_triggers(svc, AutorelockTriggers::empty());
            if svc.pipes.has_submode(Submode::TKLOCK) {
                tracing::debug!("call ended, lifting proximity lock");
                self.disable_tklock(svc, false);
                self.display_on(svc);
            }
        }
    }

    fn alarm_changed<M: Moment>(&mut self, svc: &mut Services<'_, M>, alarm: AlarmUiState) {
        if alarm.is_alerting() {
            if svc.pipes.has_submode(Submode::TKLOCK) {
                tracing::debug!("alarm, lifting lock");
                self.saved_for_alarm = true;
                self.disable_tklock(svc, true);
                self.display_on(svc);
            }
            return;
        }

        let in_call = svc.pipes.call_state.get().is_ongoing();
        if !in_call && self.triggers == AutorelockTriggers::ON_PROXIMITY {
            self.set_triggers(svc, AutorelockTriggers::empty());
        }
        if std::mem::take(&mut self.saved_for_alarm) && !in_call {
            tracing::debug!("alarm over, restoring lock");
            self.enable_tklock_policy(svc, false);
        }
    }

    fn cover_changed<M: Moment>(
        &mut self,
        svc: &mut Services<'_, M>,
        state: CoverState,
        trigger: AutorelockTriggers,
    ) {
        match state {
            CoverState::Open if svc.pipes.has_submode(Submode::TKLOCK) => {
                self.disable_tklock(svc, false);
                self.display_on(svc);
                if self.config.autorelock_enabled {
                    self.set_triggers(svc, self.triggers | trigger);
                }
            },
            CoverState::Open => self.disable_autorelock_policy(svc),
            CoverState::Closed if self.triggers.contains(trigger) => {
                self.set_triggers(svc, self.triggers - trigger);
                self.enable_tklock_policy(svc, false);
            },
            _ => {},
        }
    }

    fn power_key<M: Moment>(&mut self, svc: &mut Services<'_, M>, event: PowerKeyEvent) {
        if event == PowerKeyEvent::Idle {
            return;
        }
        self.disable_autorelock_policy(svc);

        let locked = svc.pipes.has_submode(Submode::TKLOCK);
        let eater = svc.pipes.has_submode(Submode::EVEATER);
        match event {
            PowerKeyEvent::Short if locked => {
                if self.ui_state == TklockUiState::Slider {
                    self.hide_visual(svc);
                } else if svc.pipes.display_state.get() != DisplayState::On {
                    self.show_visual(svc);
                } else {
                    self.blank(svc);
                }
            },
            PowerKeyEvent::Short if eater => {
                self.disable_eveater(svc);
                self.display_on(svc);
            },
            PowerKeyEvent::Short => {
                self.enable_tklock_policy(svc, true);
            },
            PowerKeyEvent::Double if locked || eater => {
                self.disable_eveater(svc);
                self.disable_tklock(svc, false);
                self.display_on(svc);
            },
            _ => tracing::trace!(?event, "power key ignored by tklock"),
        }
    }

    fn show_visual<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        if self.ui_state != TklockUiState::Normal {
            return;
        }
        let request = UiRequest::OpenTklock { mode: TklockUiMode::Slider, silent: true };
        if let Err(err) = svc.ui.call(&request) {
            tracing::warn!(%err, "cannot show unlock slider");
            return;
        }
        if !svc.update_submode(ORIGIN, SubmodeChange::set(Submode::VISUAL_TKLOCK)) {
            return;
        }

        self.ui_state = TklockUiState::Slider;
        svc.cancel(TimerKind::TklockDim);
        svc.cancel(TimerKind::TklockBlank);
        self.display_on(svc);
        svc.pipes.touchscreen_enabled.set(ORIGIN, true);
        svc.arm(TimerKind::VisualBlank, self.config.visual_blank_delay);
        svc.arm(TimerKind::ForcedVisualBlank, self.config.forced_visual_blank_delay);
    }

    fn hide_visual<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        if self.ui_state != TklockUiState::Slider {
            return;
        }
        svc.cancel(TimerKind::VisualBlank);
        svc.cancel(TimerKind::ForcedVisualBlank);

        let request = UiRequest::OpenTklock { mode: TklockUiMode::Normal, silent: true };
        if let Err(err) = svc.ui.call(&request) {
            tracing::warn!(%err, "cannot switch lock ui back from slider");
        }
        svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::VISUAL_TKLOCK));
        self.ui_state = TklockUiState::Normal;
        self.blank(svc);
    }

    fn dim<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        svc.cancel(TimerKind::TklockDim);
        svc.pipes.display_state.set(ORIGIN, DisplayState::Dim);
        svc.arm(TimerKind::TklockBlank, self.config.blank_delay);
    }

    fn blank<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        svc.cancel(TimerKind::TklockDim);
        svc.cancel(TimerKind::TklockBlank);
        svc.pipes.display_state.set(ORIGIN, DisplayState::Off);
        svc.pipes.touchscreen_enabled.set(ORIGIN, false);
    }

    fn display_on<M: Moment>(&self, svc: &mut Services<'_, M>) {
        if svc.pipes.display_state.get() != DisplayState::On {
            svc.pipes.display_state.set(ORIGIN, DisplayState::On);
        }
    }

    fn force_unlock<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        let was_locked = svc.pipes.has_submode(Submode::TKLOCK);
        if was_locked || svc.pipes.has_submode(Submode::EVEATER) {
            self.close_ui(svc, true);
            self.release(svc);
        }
        if was_locked {
            svc.ui.emit(Signal::TklockMode { locked: false });
        }
        self.display_on(svc);
    }

    /// Close after a failed open and make sure nothing is left held.
    fn force_closed<M: Moment>(&mut self, svc: &mut Services<'_, M>, silent: bool) {
        self.close_ui(svc, silent);
        self.release(svc);
    }

    fn close_ui<M: Moment>(&self, svc: &mut Services<'_, M>, silent: bool) -> bool {
        let request = UiRequest::CloseTklock { silent };
        match self.retry.run("close tklock ui", |_| svc.ui.call(&request)) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, "lock ui did not close, forcing unlocked");
                false
            },
        }
    }

    /// Local unlocked state: no UI, no lock flags, input enabled.
    fn release<M: Moment>(&mut self, svc: &mut Services<'_, M>) {
        self.ui_state = TklockUiState::None;
        for kind in LOCK_TIMERS {
            svc.cancel(kind);
        }

        let held = svc.pipes.submode.get()
            & (Submode::TKLOCK | Submode::VISUAL_TKLOCK | Submode::EVEATER);
        if !held.is_empty() {
            svc.update_submode(ORIGIN, SubmodeChange::clear(held));
        }
        svc.pipes.touchscreen_enabled.set(ORIGIN, true);
        svc.pipes.keypad_enabled.set(ORIGIN, true);
    }

    fn set_triggers<M: Moment>(&mut self, svc: &mut Services<'_, M>, triggers: AutorelockTriggers) {
        self.triggers = triggers;
        let flagged = svc.pipes.has_submode(Submode::AUTORELOCK);
        if triggers.is_empty() && flagged {
            svc.update_submode(ORIGIN, SubmodeChange::clear(Submode::AUTORELOCK));
        } else if !triggers.is_empty() && !flagged {
            svc.update_submode(ORIGIN, SubmodeChange::set(Submode::AUTORELOCK));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_passes_presses_when_unlocked() {
        assert_eq!(filter_input(Submode::empty(), InputEvent::Touch), Some(InputEvent::Touch));
    }

    #[test]
    fn filter_vetoes_presses_while_locked() {
        assert_eq!(filter_input(Submode::TKLOCK, InputEvent::Key(116)), None);
        assert_eq!(filter_input(Submode::TKLOCK, InputEvent::Idle), Some(InputEvent::Idle));
    }

    #[test]
    fn filter_lets_slider_through() {
        let submode = Submode::TKLOCK | Submode::VISUAL_TKLOCK;
        assert_eq!(filter_input(submode, InputEvent::Touch), Some(InputEvent::Touch));
    }

    #[test]
    fn event_eater_swallows() {
        assert_eq!(filter_input(Submode::EVEATER, InputEvent::Touch), Some(InputEvent::Swallowed));
    }
}
