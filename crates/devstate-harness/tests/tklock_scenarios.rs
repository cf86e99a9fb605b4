//! Touchscreen/keypad lock scenarios on the simulated device.

use std::{cell::Cell, rc::Rc, time::Duration};

use devstate_core::{
    AlarmUiState, AudioRoute, AutorelockTriggers, CallState, CoverState, DisplayState,
    InputEvent, LockState, MethodCall, MethodReply, PipeInput, PowerKeyEvent, Signal, Submode,
    SystemState, TklockUiMode, TklockUiState,
};
use devstate_harness::{RequestKind, SimWorld};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn display(world: &SimWorld) -> DisplayState {
    world.context().pipes().display_state.get()
}

#[test]
fn policy_lock_dims_then_blanks() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::TkLock(LockState::On));
    assert!(world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::On);
    assert!(!world.context().pipes().keypad_enabled.get());
    assert!(!world.context().pipes().touchscreen_enabled.get());

    world.advance(Duration::from_millis(2_999));
    assert_eq!(display(&world), DisplayState::On);

    world.advance(Duration::from_millis(1));
    assert_eq!(display(&world), DisplayState::Dim);

    world.advance(Duration::from_millis(2_999));
    assert_eq!(display(&world), DisplayState::Dim);

    world.advance(Duration::from_millis(1));
    assert_eq!(display(&world), DisplayState::Off);
    assert!(!world.context().pipes().touchscreen_enabled.get());
    assert!(world.context().timers().is_empty());
}

#[test]
fn unlocking_twice_sends_one_close() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));
    world.ui_mut().clear_log();

    world.send(PipeInput::TkLock(LockState::Off));
    world.send(PipeInput::TkLock(LockState::Off));

    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(world.ui().count(RequestKind::CloseTklock), 1);
    assert_eq!(world.ui().signals(), &[Signal::TklockMode { locked: false }]);
}

#[test]
fn lock_ui_that_will_not_open_leaves_device_unlocked() {
    let mut world = SimWorld::booted();
    world.ui_mut().fail_next(RequestKind::OpenTklock, 1);

    world.send(PipeInput::TkLock(LockState::On));

    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(world.context().tklock().ui_state(), TklockUiState::None);
    assert!(world.context().timers().is_empty());
}

#[test]
fn presses_are_vetoed_while_locked() {
    let mut world = SimWorld::booted();
    let delivered = Rc::new(Cell::new(0));
    let seen = Rc::clone(&delivered);
    world.context().pipes().input_event.append_output_trigger(move |event: &InputEvent| {
        if event.is_press() {
            seen.set(seen.get() + 1);
        }
    });

    world.send(PipeInput::Input(InputEvent::Touch));
    assert_eq!(delivered.get(), 1);

    world.send(PipeInput::TkLock(LockState::OnSilent));
    world.send(PipeInput::Input(InputEvent::Touch));
    world.send(PipeInput::Input(InputEvent::Key(28)));
    assert_eq!(delivered.get(), 1);
}

#[test]
fn event_eater_swallows_first_touch_in_act_dead() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::SystemState(SystemState::ActDead));
    world.send(PipeInput::DisplayState(DisplayState::Off));

    assert!(world.has(Submode::EVEATER));
    assert_eq!(world.ui().tklock_ui(), Some(TklockUiMode::EventEater));

    world.send(PipeInput::Input(InputEvent::Touch));

    assert!(!world.has(Submode::EVEATER));
    assert_eq!(display(&world), DisplayState::On);
    assert_eq!(world.ui().tklock_ui(), None);
}

#[test]
fn blanking_locks_silently_unless_in_call() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DisplayState(DisplayState::Off));
    assert!(world.has(Submode::TKLOCK));
    assert!(!world.context().pipes().touchscreen_enabled.get());

    let mut world = SimWorld::booted();
    world.send(PipeInput::CallState(CallState::Active));
    world.send(PipeInput::DisplayState(DisplayState::Off));
    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn power_key_shows_slider_until_visual_blank() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::PowerKey(PowerKeyEvent::Short));
    assert!(world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::Off);

    world.send(PipeInput::PowerKey(PowerKeyEvent::Short));
    assert!(world.has(Submode::TKLOCK | Submode::VISUAL_TKLOCK));
    assert_eq!(world.ui().tklock_ui(), Some(TklockUiMode::Slider));
    assert_eq!(display(&world), DisplayState::On);
    assert!(world.context().pipes().touchscreen_enabled.get());

    world.advance(secs(5));
    assert!(world.has(Submode::TKLOCK));
    assert!(!world.has(Submode::VISUAL_TKLOCK));
    assert_eq!(world.ui().tklock_ui(), Some(TklockUiMode::Normal));
    assert_eq!(display(&world), DisplayState::Off);
}

#[test]
fn touches_extend_slider_but_not_past_forced_blank() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::PowerKey(PowerKeyEvent::Short));
    world.send(PipeInput::PowerKey(PowerKeyEvent::Short));

    for _ in 0..7 {
        world.advance(secs(4));
        assert!(world.has(Submode::VISUAL_TKLOCK));
        world.send(PipeInput::Input(InputEvent::Touch));
    }

    world.advance(secs(2));
    assert!(!world.has(Submode::VISUAL_TKLOCK));
    assert!(world.has(Submode::TKLOCK));
}

#[test]
fn double_press_unlocks() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::PowerKey(PowerKeyEvent::Short));
    assert!(world.has(Submode::TKLOCK));

    world.send(PipeInput::PowerKey(PowerKeyEvent::Double));

    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::On);
}

#[test]
fn lid_locks_and_unlocks() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::LidCover(CoverState::Closed));
    assert!(world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::Off);

    world.send(PipeInput::LidCover(CoverState::Open));
    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::On);
}

#[test]
fn keyboard_slide_relocks_when_closed() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));

    world.send(PipeInput::KeyboardSlide(CoverState::Open));
    assert!(!world.has(Submode::TKLOCK));
    assert!(world.has(Submode::AUTORELOCK));
    assert_eq!(world.context().tklock().triggers(), AutorelockTriggers::KBD_SLIDE);

    world.send(PipeInput::KeyboardSlide(CoverState::Closed));
    assert!(world.has(Submode::TKLOCK));
    assert!(!world.has(Submode::AUTORELOCK));
}

#[test]
fn user_activity_forgets_slide_trigger() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));
    world.send(PipeInput::KeyboardSlide(CoverState::Open));
    assert!(world.has(Submode::AUTORELOCK));

    world.send(PipeInput::PowerKey(PowerKeyEvent::Long));
    assert!(!world.has(Submode::AUTORELOCK));

    world.send(PipeInput::KeyboardSlide(CoverState::Closed));
    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn alarm_lifts_lock_and_restores_it() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));

    world.send(PipeInput::AlarmUiState(AlarmUiState::Ringing));
    assert!(!world.has(Submode::TKLOCK));
    assert!(world.context().tklock().saved_for_alarm());
    assert_eq!(display(&world), DisplayState::On);

    world.send(PipeInput::AlarmUiState(AlarmUiState::Off));
    assert!(world.has(Submode::TKLOCK));
    assert!(!world.context().tklock().saved_for_alarm());
}

#[test]
fn delayed_unlock_waits_for_unlock_delay() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));

    world.send(PipeInput::TkLock(LockState::OffDelayed));
    world.advance(Duration::from_millis(999));
    assert!(world.has(Submode::TKLOCK));

    world.advance(Duration::from_millis(1));
    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn dimmed_request_dims_right_away() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::TkLock(LockState::OnSilentDimmed));

    assert!(world.has(Submode::TKLOCK));
    assert_eq!(display(&world), DisplayState::Dim);
    world.advance(secs(3));
    assert_eq!(display(&world), DisplayState::Off);
}

#[test]
fn toggle_flips_the_lock() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::TkLock(LockState::Toggle));
    assert!(world.has(Submode::TKLOCK));

    world.send(PipeInput::TkLock(LockState::Toggle));
    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn ui_callbacks_drive_the_lock() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));

    assert_eq!(world.call(MethodCall::TklockCallback(2)), Some(MethodReply::Ack(true)));
    assert!(world.has(Submode::TKLOCK));
    assert_eq!(world.ui().tklock_ui(), Some(TklockUiMode::Normal));

    assert_eq!(world.call(MethodCall::TklockCallback(1)), Some(MethodReply::Ack(true)));
    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn peer_closing_the_lock_ui_unlocks() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));
    world.ui_mut().clear_log();

    world.call(MethodCall::TklockCallback(4));

    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(world.ui().count(RequestKind::CloseTklock), 0);
    assert_eq!(world.ui().signals(), &[Signal::TklockMode { locked: false }]);
}

#[test]
fn callback_without_lock_ui_is_ignored() {
    let mut world = SimWorld::booted();
    world.ui_mut().clear_log();

    world.call(MethodCall::TklockCallback(1));

    assert!(world.ui().requests().is_empty());
    assert_eq!(world.submode(), Submode::empty());
}

#[test]
fn proximity_locks_during_handset_call() {
    let mut world = SimWorld::booted();
    world.send_all([
        PipeInput::CallState(CallState::Active),
        PipeInput::AudioRoute(AudioRoute::Handset),
        PipeInput::Proximity(CoverState::Closed),
    ]);

    assert!(world.has(Submode::TKLOCK | Submode::AUTORELOCK));
    assert_eq!(world.context().tklock().triggers(), AutorelockTriggers::ON_PROXIMITY);
    assert_eq!(display(&world), DisplayState::Off);

    world.send(PipeInput::Proximity(CoverState::Open));

    assert!(!world.has(Submode::TKLOCK));
    assert!(!world.has(Submode::AUTORELOCK));
    assert_eq!(display(&world), DisplayState::On);
}

#[test]
fn proximity_ignored_on_speaker() {
    let mut world = SimWorld::booted();
    world.send_all([
        PipeInput::CallState(CallState::Active),
        PipeInput::AudioRoute(AudioRoute::Speaker),
        PipeInput::Proximity(CoverState::Closed),
    ]);

    assert!(!world.has(Submode::TKLOCK));
}

#[test]
fn manual_unlock_inhibits_proximity_relock_until_call_ends() {
    let mut world = SimWorld::booted();
    world.send_all([
        PipeInput::CallState(CallState::Active),
        PipeInput::AudioRoute(AudioRoute::Handset),
        PipeInput::Proximity(CoverState::Closed),
    ]);
    assert!(world.has(Submode::TKLOCK));

    world.call(MethodCall::TklockCallback(1));
    assert!(!world.has(Submode::TKLOCK));
    assert!(world.context().tklock().relock_inhibited());

    world.send(PipeInput::Proximity(CoverState::Open));
    world.send(PipeInput::Proximity(CoverState::Closed));
    assert!(!world.has(Submode::TKLOCK));

    world.send(PipeInput::CallState(CallState::None));
    assert!(!world.context().tklock().relock_inhibited());
}

#[test]
fn incoming_call_with_uncovered_sensor_unlocks() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::Proximity(CoverState::Open));
    world.send(PipeInput::TkLock(LockState::OnSilent));

    world.send(PipeInput::CallState(CallState::Ringing));

    assert!(!world.has(Submode::TKLOCK));
    assert_eq!(world.context().tklock().triggers(), AutorelockTriggers::ON_PROXIMITY);
    assert_eq!(display(&world), DisplayState::On);
}

#[test]
fn call_end_lifts_proximity_lock() {
    let mut world = SimWorld::booted();
    world.send_all([
        PipeInput::CallState(CallState::Active),
        PipeInput::AudioRoute(AudioRoute::Handset),
        PipeInput::Proximity(CoverState::Closed),
    ]);
    assert!(world.has(Submode::TKLOCK));

    world.send(PipeInput::CallState(CallState::None));

    assert!(!world.has(Submode::TKLOCK));
    assert!(world.context().tklock().triggers().is_empty());
}

#[test]
fn stuck_lock_ui_is_forced_closed() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::TkLock(LockState::OnSilent));
    world.ui_mut().fail_next(RequestKind::CloseTklock, 100);
    world.ui_mut().clear_log();

    world.send(PipeInput::TkLock(LockState::Off));

    assert_eq!(world.ui().count(RequestKind::CloseTklock), 5);
    assert!(!world.has(Submode::TKLOCK));
    assert!(world.context().pipes().keypad_enabled.get());
}

#[test]
fn locking_flashes_led_without_caching_pattern() {
    let mut world = SimWorld::booted();
    let flashes = Rc::new(Cell::new(0));
    let seen = Rc::clone(&flashes);
    world
        .context()
        .pipes()
        .led_pattern_activate
        .append_output_trigger(move |pattern| {
            if pattern == devstate_core::tklock::PATTERN_TKLOCK_ENGAGED {
                seen.set(seen.get() + 1);
            }
        });

    world.send(PipeInput::TkLock(LockState::On));

    assert_eq!(flashes.get(), 1);
    assert_eq!(world.context().pipes().led_pattern_activate.get(), "");
}
