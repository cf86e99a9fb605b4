//! Arbitrary input sequences against the standard invariants.
//!
//! `SimWorld` asserts every invariant after each step, so these properties
//! only have to drive the device; any inconsistency fails the case.

use std::time::Duration;

use devstate_core::{
    AlarmUiState, AudioRoute, CallState, CoverState, DisplayState, InputEvent, LockState,
    MethodCall, PipeInput, PowerKeyEvent, Submode, SystemState,
};
use devstate_harness::{RequestKind, SimWorld};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Input(PipeInput),
    Call(MethodCall),
    Advance(Duration),
    FailNext(RequestKind),
}

fn cover() -> impl Strategy<Value = CoverState> {
    prop_oneof![Just(CoverState::Open), Just(CoverState::Closed)]
}

fn lock_state() -> impl Strategy<Value = LockState> {
    prop_oneof![
        Just(LockState::Off),
        Just(LockState::OffSilent),
        Just(LockState::OffDelayed),
        Just(LockState::On),
        Just(LockState::OnDimmed),
        Just(LockState::OnSilent),
        Just(LockState::OnSilentDimmed),
        Just(LockState::Toggle),
    ]
}

fn input() -> impl Strategy<Value = PipeInput> {
    prop_oneof![
        1 => prop_oneof![
            Just(SystemState::User),
            Just(SystemState::ActDead),
            Just(SystemState::Shutdown),
        ]
        .prop_map(PipeInput::SystemState),
        2 => prop_oneof![Just(DisplayState::On), Just(DisplayState::Dim), Just(DisplayState::Off)]
            .prop_map(PipeInput::DisplayState),
        1 => any::<bool>().prop_map(PipeInput::DeviceInactive),
        3 => prop_oneof![
            Just(CallState::None),
            Just(CallState::Ringing),
            Just(CallState::Active),
            Just(CallState::Service),
        ]
        .prop_map(PipeInput::CallState),
        1 => prop_oneof![
            Just(AlarmUiState::Off),
            Just(AlarmUiState::Visible),
            Just(AlarmUiState::Ringing),
        ]
        .prop_map(PipeInput::AlarmUiState),
        2 => prop_oneof![
            Just(AudioRoute::Handset),
            Just(AudioRoute::Speaker),
            Just(AudioRoute::Headset),
        ]
        .prop_map(PipeInput::AudioRoute),
        3 => cover().prop_map(PipeInput::Proximity),
        2 => cover().prop_map(PipeInput::KeyboardSlide),
        1 => cover().prop_map(PipeInput::LensCover),
        1 => cover().prop_map(PipeInput::LidCover),
        3 => prop_oneof![
            Just(PowerKeyEvent::Short),
            Just(PowerKeyEvent::Double),
            Just(PowerKeyEvent::Long),
        ]
        .prop_map(PipeInput::PowerKey),
        3 => prop_oneof![Just(InputEvent::Touch), (1u16..200).prop_map(InputEvent::Key)]
            .prop_map(PipeInput::Input),
        1 => any::<bool>().prop_map(PipeInput::ConnectivityActive),
        3 => lock_state().prop_map(PipeInput::TkLock),
        2 => lock_state().prop_map(PipeInput::DeviceLock),
    ]
}

fn method() -> impl Strategy<Value = MethodCall> {
    prop_oneof![
        2 => prop_oneof![
            Just("normal"),
            Just("flight"),
            Just("normal-confirm"),
            Just("flight-confirm"),
            Just("bogus"),
        ]
        .prop_map(|name| MethodCall::ChangeDeviceMode(name.to_string())),
        2 => (-1i32..3).prop_map(MethodCall::ModeChangeCallback),
        3 => (0i32..6).prop_map(MethodCall::TklockCallback),
        4 => (-1i32..5).prop_map(MethodCall::DevlockCallback),
        1 => any::<bool>().prop_map(MethodCall::SetAutolockInhibit),
        1 => Just(MethodCall::GetDeviceMode),
    ]
}

fn request_kind() -> impl Strategy<Value = RequestKind> {
    prop_oneof![
        Just(RequestKind::OpenModeDialog),
        Just(RequestKind::CloseModeDialog),
        Just(RequestKind::OpenTklock),
        Just(RequestKind::CloseTklock),
        Just(RequestKind::OpenDevlock),
        Just(RequestKind::CloseDevlock),
        Just(RequestKind::RequestShutdown),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        10 => input().prop_map(Step::Input),
        4 => method().prop_map(Step::Call),
        3 => (0u64..40_000).prop_map(|ms| Step::Advance(Duration::from_millis(ms))),
        1 => request_kind().prop_map(Step::FailNext),
    ]
}

fn run(world: &mut SimWorld, steps: Vec<Step>) {
    for step in steps {
        match step {
            Step::Input(input) => world.send(input),
            Step::Call(call) => {
                world.call(call);
            },
            Step::Advance(by) => world.advance(by),
            Step::FailNext(kind) => world.ui_mut().fail_next(kind, 1),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_for_any_sequence(steps in prop::collection::vec(step(), 1..80)) {
        let mut world = SimWorld::booted();
        run(&mut world, steps);
    }

    #[test]
    fn prop_invariants_hold_on_locked_boot(steps in prop::collection::vec(step(), 1..60)) {
        let store = devstate_core::MemoryStore::new().with_file("devlock-boot", "yes");
        let mut world = SimWorld::new(devstate_core::MceConfig::default(), store);
        world.send(PipeInput::SystemState(SystemState::User));
        run(&mut world, steps);
    }

    #[test]
    fn prop_timers_drain_when_left_alone(steps in prop::collection::vec(step(), 1..40)) {
        let mut world = SimWorld::booted();
        run(&mut world, steps);

        world.send(PipeInput::DeviceInactive(false));
        world.advance(Duration::from_secs(3_600));

        prop_assert!(world.context().timers().is_empty());
    }

    #[test]
    fn prop_boot_flag_tracks_devlock(steps in prop::collection::vec(step(), 1..60)) {
        let mut world = SimWorld::booted();
        world.send(PipeInput::DeviceLock(LockState::On));

        for step in steps {
            run(&mut world, vec![step]);
            let flag = world.store().get("devlock-boot");
            prop_assert_eq!(world.has(Submode::DEVLOCK), flag == Some("yes"));
        }
    }
}
