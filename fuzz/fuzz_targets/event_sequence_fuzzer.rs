//! Fuzz target for the combined state machines
//!
//! Drive a booted simulated device with arbitrary inputs, method calls, UI
//! failures and time jumps. `SimWorld` checks the standard invariants after
//! every step and panics on the first violation.
//!
//! # Strategy
//!
//! - Inputs: every pipe the daemon accepts writes on
//! - Calls: mode, tklock and devlock methods including unknown callback codes
//! - Failures: next UI request of a kind fails
//! - Time: jumps from 0 to 65535 ms, crossing dim, blank and autolock timers
//!
//! # Invariants
//!
//! - Submode flags agree with the shown UIs
//! - Keypad is enabled exactly when the tklock is off
//! - Devlock boot flag mirrors the DEVLOCK flag

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use devstate_core::{
    AlarmUiState, AudioRoute, CallState, CoverState, DisplayState, InputEvent, LockState,
    MethodCall, PipeInput, PowerKeyEvent, Submode, SystemState,
};
use devstate_harness::{RequestKind, SimWorld};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Input(InputChoice),
    Call(CallChoice),
    Fail(FailChoice),
    Advance(u16),
}

#[derive(Debug, Clone, Arbitrary)]
enum InputChoice {
    System(u8),
    Display(u8),
    Inactive(bool),
    Call(u8),
    Alarm(u8),
    Route(u8),
    Proximity(bool),
    Slide(bool),
    Lens(bool),
    Lid(bool),
    PowerKey(u8),
    Touch,
    Key(u16),
    Connectivity(bool),
    TkLock(u8),
    DeviceLock(u8),
}

#[derive(Debug, Clone, Arbitrary)]
enum CallChoice {
    GetDeviceMode,
    ChangeDeviceMode(u8),
    ChangeTklockMode(u8),
    ModeCallback(i8),
    TklockCallback(i8),
    DevlockCallback(i8),
    AutolockInhibit(bool),
}

#[derive(Debug, Clone, Arbitrary)]
enum FailChoice {
    OpenModeDialog,
    OpenTklock,
    CloseTklock,
    OpenDevlock,
    CloseDevlock,
}

const LOCK_STATES: [LockState; 8] = [
    LockState::Off,
    LockState::OffSilent,
    LockState::OffDelayed,
    LockState::On,
    LockState::OnDimmed,
    LockState::OnSilent,
    LockState::OnSilentDimmed,
    LockState::Toggle,
];

const MODE_NAMES: [&str; 5] = ["normal", "flight", "offline", "flight-confirm", "bogus"];
const TKLOCK_MODES: [&str; 4] = ["locked", "unlocked", "silent-locked", "sideways"];

fn pick<T: Copy, const N: usize>(choices: &[T; N], index: u8) -> T {
    choices[usize::from(index) % N]
}

fn cover(closed: bool) -> CoverState {
    if closed { CoverState::Closed } else { CoverState::Open }
}

fn input(choice: InputChoice) -> PipeInput {
    match choice {
        InputChoice::System(i) => PipeInput::SystemState(pick(
            &[SystemState::User, SystemState::ActDead, SystemState::Shutdown],
            i,
        )),
        InputChoice::Display(i) => PipeInput::DisplayState(pick(
            &[DisplayState::On, DisplayState::Dim, DisplayState::Off],
            i,
        )),
        InputChoice::Inactive(b) => PipeInput::DeviceInactive(b),
        InputChoice::Call(i) => PipeInput::CallState(pick(
            &[CallState::None, CallState::Ringing, CallState::Active, CallState::Service],
            i,
        )),
        InputChoice::Alarm(i) => PipeInput::AlarmUiState(pick(
            &[AlarmUiState::Off, AlarmUiState::Visible, AlarmUiState::Ringing],
            i,
        )),
        InputChoice::Route(i) => PipeInput::AudioRoute(pick(
            &[AudioRoute::Handset, AudioRoute::Speaker, AudioRoute::Headset],
            i,
        )),
        InputChoice::Proximity(b) => PipeInput::Proximity(cover(b)),
        InputChoice::Slide(b) => PipeInput::KeyboardSlide(cover(b)),
        InputChoice::Lens(b) => PipeInput::LensCover(cover(b)),
        InputChoice::Lid(b) => PipeInput::LidCover(cover(b)),
        InputChoice::PowerKey(i) => PipeInput::PowerKey(pick(
            &[PowerKeyEvent::Short, PowerKeyEvent::Double, PowerKeyEvent::Long],
            i,
        )),
        InputChoice::Touch => PipeInput::Input(InputEvent::Touch),
        InputChoice::Key(code) => PipeInput::Input(InputEvent::Key(code)),
        InputChoice::Connectivity(b) => PipeInput::ConnectivityActive(b),
        InputChoice::TkLock(i) => PipeInput::TkLock(pick(&LOCK_STATES, i)),
        InputChoice::DeviceLock(i) => PipeInput::DeviceLock(pick(&LOCK_STATES, i)),
    }
}

fn call(choice: CallChoice) -> MethodCall {
    match choice {
        CallChoice::GetDeviceMode => MethodCall::GetDeviceMode,
        CallChoice::ChangeDeviceMode(i) => {
            MethodCall::ChangeDeviceMode(pick(&MODE_NAMES, i).to_string())
        },
        CallChoice::ChangeTklockMode(i) => {
            MethodCall::ChangeTklockMode(pick(&TKLOCK_MODES, i).to_string())
        },
        CallChoice::ModeCallback(code) => MethodCall::ModeChangeCallback(i32::from(code)),
        CallChoice::TklockCallback(code) => MethodCall::TklockCallback(i32::from(code)),
        CallChoice::DevlockCallback(code) => MethodCall::DevlockCallback(i32::from(code)),
        CallChoice::AutolockInhibit(b) => MethodCall::SetAutolockInhibit(b),
    }
}

fn failing(choice: FailChoice) -> RequestKind {
    match choice {
        FailChoice::OpenModeDialog => RequestKind::OpenModeDialog,
        FailChoice::OpenTklock => RequestKind::OpenTklock,
        FailChoice::CloseTklock => RequestKind::CloseTklock,
        FailChoice::OpenDevlock => RequestKind::OpenDevlock,
        FailChoice::CloseDevlock => RequestKind::CloseDevlock,
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut world = SimWorld::booted();

    for op in ops.into_iter().take(256) {
        match op {
            Op::Input(choice) => world.send(input(choice)),
            Op::Call(choice) => {
                world.call(call(choice));
            },
            Op::Fail(choice) => world.ui_mut().fail_next(failing(choice), 1),
            Op::Advance(ms) => world.advance(Duration::from_millis(u64::from(ms))),
        }

        let flag = world.store().get("devlock-boot");
        if world.has(Submode::DEVLOCK) {
            assert_eq!(flag, Some("yes"), "DEVLOCK set but boot flag is {flag:?}");
        }
    }
});
