//! Deterministic simulation harness for the device-state core.
//!
//! Everything the core needs from the outside world has an in-memory, fully
//! scripted stand-in here: a virtual clock, a UI transport that records and
//! fails calls on demand, and a driver that replays timed events through the
//! production runtime loop.
//!
//! # Invariant Testing
//!
//! The `invariants` module captures properties of the submode register and
//! the state machines that must hold after every step. [`SimWorld`] checks
//! [`InvariantRegistry::standard()`] automatically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_clock;
pub mod sim_driver;
pub mod sim_ui;
pub mod sim_world;

pub use invariants::{
    AutorelockMatchesTriggers, Invariant, InvariantRegistry, InvariantResult, KeypadFollowsLock,
    ModeChangeFlagMatchesPending, PinUiMatchesSubmode, SystemSnapshot, TklockUiMatchesSubmode,
    VerifyRequiresDevlock, Violation,
};
pub use sim_clock::SimInstant;
pub use sim_driver::SimDriver;
pub use sim_ui::{RequestKind, SimUi};
pub use sim_world::{SimContext, SimWorld};
