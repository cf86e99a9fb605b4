//! Proximity policy over the call × audio route × cover cross product.

use devstate_core::{
    AudioRoute, AutorelockTriggers, CallState, CoverState, PipeInput, Submode,
};
use devstate_harness::SimWorld;
use proptest::prelude::*;

fn call_strategy() -> impl Strategy<Value = CallState> {
    prop_oneof![
        Just(CallState::None),
        Just(CallState::Ringing),
        Just(CallState::Active),
        Just(CallState::Service),
    ]
}

fn route_strategy() -> impl Strategy<Value = AudioRoute> {
    prop_oneof![
        Just(AudioRoute::Handset),
        Just(AudioRoute::Speaker),
        Just(AudioRoute::Headset),
        Just(AudioRoute::Undef),
    ]
}

fn cover_strategy() -> impl Strategy<Value = CoverState> {
    prop_oneof![Just(CoverState::Open), Just(CoverState::Closed), Just(CoverState::Undef)]
}

fn at_ear(call: CallState, route: AudioRoute) -> bool {
    match route {
        AudioRoute::Handset | AudioRoute::Headset => true,
        AudioRoute::Speaker => call == CallState::Ringing,
        AudioRoute::Undef => false,
    }
}

fn world_in(call: CallState, route: AudioRoute, slide: CoverState, proximity: CoverState) -> SimWorld {
    let mut world = SimWorld::booted();
    world.send_all([
        PipeInput::CallState(call),
        PipeInput::AudioRoute(route),
        PipeInput::KeyboardSlide(slide),
        PipeInput::Proximity(proximity),
    ]);
    world
}

proptest! {
    #[test]
    fn prop_covered_sensor_locks_only_at_ear(
        call in call_strategy(),
        route in route_strategy(),
        slide in cover_strategy(),
        proximity in cover_strategy(),
    ) {
        let world = world_in(call, route, slide, proximity);

        let expect_lock = call.is_ongoing()
            && at_ear(call, route)
            && slide != CoverState::Open
            && proximity == CoverState::Closed;
        prop_assert_eq!(world.has(Submode::TKLOCK), expect_lock);

        let ringing_uncovered = call == CallState::Ringing && proximity == CoverState::Open;
        let expect_trigger = expect_lock || ringing_uncovered;
        prop_assert_eq!(
            world.context().tklock().triggers() == AutorelockTriggers::ON_PROXIMITY,
            expect_trigger
        );
    }

    #[test]
    fn prop_uncovering_always_unlocks(
        call in call_strategy(),
        route in route_strategy(),
        slide in cover_strategy(),
    ) {
        let mut world = world_in(call, route, slide, CoverState::Closed);

        world.send(PipeInput::Proximity(CoverState::Open));

        prop_assert!(!world.has(Submode::TKLOCK));
    }

    #[test]
    fn prop_ringing_with_uncovered_sensor_never_stays_locked(
        route in route_strategy(),
        slide in cover_strategy(),
        silent in any::<bool>(),
    ) {
        let mut world = SimWorld::booted();
        let request = if silent {
            devstate_core::LockState::OnSilent
        } else {
            devstate_core::LockState::On
        };
        world.send_all([
            PipeInput::Proximity(CoverState::Open),
            PipeInput::TkLock(request),
            PipeInput::AudioRoute(route),
            PipeInput::KeyboardSlide(slide),
        ]);
        world.send(PipeInput::CallState(CallState::Ringing));

        prop_assert!(!world.has(Submode::TKLOCK));
        prop_assert!(world.has(Submode::AUTORELOCK));
    }

    #[test]
    fn prop_call_end_clears_proximity_lock(
        route in route_strategy(),
        ringing in any::<bool>(),
    ) {
        let call = if ringing { CallState::Ringing } else { CallState::Active };
        let mut world = world_in(call, route, CoverState::Closed, CoverState::Closed);

        world.send(PipeInput::CallState(CallState::None));

        prop_assert!(!world.has(Submode::TKLOCK));
        prop_assert!(!world.has(Submode::AUTORELOCK));
    }
}
