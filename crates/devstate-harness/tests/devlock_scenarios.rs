//! Device (PIN) lock scenarios on the simulated device.

use std::time::Duration;

use devstate_core::{
    CallState, DevlockConfig, DevlockUiMode, DevlockUiState, InputEvent, LockState, MceConfig,
    MemoryStore, MethodCall, MethodReply, PipeInput, PowerKeyEvent, Signal, Submode, TimerKind,
};
use devstate_harness::{RequestKind, SimWorld};

const LOCKED: i32 = 0;
const CORRECT: i32 = 1;
const INCORRECT: i32 = 2;
const CANCEL: i32 = 3;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Locked device with the PIN query open.
fn querying() -> SimWorld {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceLock(LockState::On));
    world.send(PipeInput::Input(InputEvent::Touch));
    assert!(world.has(Submode::DEVLOCK | Submode::VERIFY));
    world
}

fn pin(world: &mut SimWorld, code: i32) {
    assert_eq!(world.call(MethodCall::DevlockCallback(code)), Some(MethodReply::Ack(true)));
}

#[test]
fn lock_request_engages_and_persists() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::DeviceLock(LockState::On));

    assert!(world.has(Submode::DEVLOCK));
    assert!(!world.has(Submode::VERIFY));
    assert_eq!(world.store().get("devlock-boot"), Some("yes"));
    assert!(world.ui().signals().contains(&Signal::DevlockMode { locked: true }));
    assert_eq!(
        world.call(MethodCall::GetDevlockMode),
        Some(MethodReply::DevlockMode("locked".to_string()))
    );
}

#[test]
fn unlock_request_without_pin_is_refused() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceLock(LockState::On));

    world.send(PipeInput::DeviceLock(LockState::Off));
    world.send(PipeInput::DeviceLock(LockState::Toggle));

    assert!(world.has(Submode::DEVLOCK));
}

#[test]
fn correct_pin_unlocks() {
    let mut world = querying();
    assert_eq!(world.ui().devlock_ui(), Some(DevlockUiMode::Query));

    pin(&mut world, CORRECT);

    assert!(!world.has(Submode::DEVLOCK | Submode::VERIFY));
    assert_eq!(world.ui().devlock_ui(), None);
    assert_eq!(world.store().get("devlock-boot"), Some("no"));
    assert_eq!(world.context().devlock().failed_count(), 0);
}

#[test]
fn failed_delays_follow_the_table() {
    let mut world = querying();

    for delay in [1, 1, 5] {
        pin(&mut world, INCORRECT);
        assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Delayed);
        assert_eq!(world.ui().devlock_ui(), Some(DevlockUiMode::Delayed));
        assert!(!world.has(Submode::VERIFY));

        world.advance(secs(delay) - Duration::from_millis(1));
        assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Delayed);

        world.advance(Duration::from_millis(1));
        assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Query);
        assert!(world.has(Submode::VERIFY));
    }

    pin(&mut world, INCORRECT);
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Query);
    assert!(world.context().timers().is_empty());

    pin(&mut world, INCORRECT);
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Delayed);
    assert_eq!(world.context().devlock().failed_count(), 5);
    assert_eq!(world.context().devlock().total_failed(), 5);
}

#[test]
fn custom_delay_table_is_used() {
    let config = MceConfig {
        devlock: DevlockConfig { delay_table: vec![secs(0), secs(30)], ..DevlockConfig::default() },
        ..MceConfig::default()
    };
    let mut world = SimWorld::booted_with(config);
    world.send(PipeInput::DeviceLock(LockState::On));
    world.send(PipeInput::Input(InputEvent::Touch));

    pin(&mut world, INCORRECT);
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Delayed);
    world.advance(secs(29));
    assert!(!world.context().devlock().query_enabled());
    world.advance(secs(1));
    assert!(world.has(Submode::VERIFY));
}

#[test]
fn user_activity_cannot_skip_the_delay() {
    let mut world = querying();
    pin(&mut world, INCORRECT);
    world.send(PipeInput::Input(InputEvent::Touch));

    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Delayed);
    assert!(!world.has(Submode::VERIFY));
}

#[test]
fn cancel_offers_shutdown_then_returns_to_query() {
    let mut world = querying();

    pin(&mut world, CANCEL);
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::ShutdownConfirm);
    assert_eq!(world.ui().devlock_ui(), Some(DevlockUiMode::ShutdownConfirm));
    assert!(!world.has(Submode::VERIFY));

    pin(&mut world, CANCEL);
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Query);
    assert!(world.has(Submode::VERIFY));
    assert!(world.context().timers().is_empty());
}

#[test]
fn unanswered_shutdown_confirmation_requests_shutdown() {
    let mut world = querying();
    pin(&mut world, CANCEL);

    world.advance(secs(10));

    assert!(world.ui().shutdown_requested());
    assert!(world.has(Submode::TRANSITION));
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Closed);
    assert!(world.has(Submode::DEVLOCK));
}

#[test]
fn ui_reporting_locked_closes_query() {
    let mut world = querying();

    pin(&mut world, LOCKED);

    assert!(world.has(Submode::DEVLOCK));
    assert!(!world.has(Submode::VERIFY));
    assert_eq!(world.context().devlock().ui_state(), DevlockUiState::Closed);
}

#[test]
fn pin_ui_that_will_not_close_keeps_device_locked() {
    let mut world = querying();
    world.ui_mut().fail_next(RequestKind::CloseDevlock, 5);

    pin(&mut world, CORRECT);

    assert!(world.has(Submode::DEVLOCK));
    assert!(!world.has(Submode::VERIFY));
    assert_eq!(world.store().get("devlock-boot"), Some("yes"));
}

#[test]
fn pin_ui_that_will_not_open_leaves_no_verify() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceLock(LockState::On));
    world.ui_mut().fail_next(RequestKind::OpenDevlock, 5);

    world.send(PipeInput::Input(InputEvent::Touch));

    assert!(!world.has(Submode::VERIFY));
    assert_eq!(world.ui().count(RequestKind::OpenDevlock), 5);

    world.send(PipeInput::Input(InputEvent::Touch));
    assert!(world.has(Submode::VERIFY));
}

#[test]
fn call_closes_query_and_reopens_after() {
    let mut world = querying();

    world.send(PipeInput::CallState(CallState::Active));
    assert!(!world.has(Submode::VERIFY));
    assert_eq!(world.ui().devlock_ui(), None);
    assert!(world.context().devlock().reopen_after_call());

    world.send(PipeInput::CallState(CallState::None));
    assert!(world.has(Submode::VERIFY));
    assert_eq!(world.ui().devlock_ui(), Some(DevlockUiMode::Query));
}

#[test]
fn releasing_tklock_opens_query() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceLock(LockState::On));
    world.send(PipeInput::TkLock(LockState::OnSilent));

    world.send(PipeInput::TkLock(LockState::Off));

    assert!(world.has(Submode::VERIFY));
}

#[test]
fn inactivity_locks_after_autolock_delay() {
    let mut world = SimWorld::booted();

    world.send(PipeInput::DeviceInactive(true));
    world.advance(secs(599));
    assert!(!world.has(Submode::DEVLOCK));

    world.advance(secs(1));
    assert!(world.has(Submode::DEVLOCK));
}

#[test]
fn activity_and_inhibit_cancel_autolock() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceInactive(true));
    world.send(PipeInput::DeviceInactive(false));
    world.advance(secs(600));
    assert!(!world.has(Submode::DEVLOCK));

    assert_eq!(world.call(MethodCall::SetAutolockInhibit(true)), Some(MethodReply::Ack(true)));
    world.send(PipeInput::DeviceInactive(true));
    world.advance(secs(600));
    assert!(!world.has(Submode::DEVLOCK));
}

#[test]
fn presses_cancel_pending_autolock() {
    for press in [
        PipeInput::Input(InputEvent::Touch),
        PipeInput::Input(InputEvent::Key(30)),
        PipeInput::PowerKey(PowerKeyEvent::Short),
    ] {
        let mut world = SimWorld::booted();
        world.send(PipeInput::DeviceInactive(true));
        assert!(world.context().timers().is_armed(TimerKind::Autolock));

        world.send(press);

        assert!(!world.context().timers().is_armed(TimerKind::Autolock));
        world.advance(secs(601));
        assert!(!world.has(Submode::DEVLOCK));
    }
}

#[test]
fn boot_flag_restores_lock() {
    let store = MemoryStore::new().with_file("devlock-boot", "yes\n");

    let world = SimWorld::new(MceConfig::default(), store);

    assert!(world.has(Submode::DEVLOCK));
    assert_eq!(world.ui().signals(), &[Signal::DevlockMode { locked: true }]);
}

#[test]
fn stray_callbacks_change_nothing() {
    let mut world = SimWorld::booted();
    world.send(PipeInput::DeviceLock(LockState::On));
    let before = world.snapshot();

    pin(&mut world, CORRECT);
    assert_eq!(world.call(MethodCall::DevlockCallback(9)), Some(MethodReply::Ack(false)));

    assert_eq!(world.snapshot(), before);
}

#[test]
fn incorrect_pin_buzzes_vibrator() {
    let mut world = querying();
    let buzzes = std::rc::Rc::new(std::cell::Cell::new(0));
    let seen = std::rc::Rc::clone(&buzzes);
    world
        .context()
        .pipes()
        .vibrator_pattern_activate
        .append_output_trigger(move |pattern| {
            if pattern == devstate_core::devlock::PATTERN_PIN_INCORRECT {
                seen.set(seen.get() + 1);
            }
        });

    pin(&mut world, INCORRECT);
    world.advance(secs(1));
    pin(&mut world, INCORRECT);

    assert_eq!(buzzes.get(), 2);
    assert_eq!(world.context().pipes().vibrator_pattern_activate.get(), "");
}
