//! Device state core.
//!
//! Sans-IO implementation of the device mode, tklock and devlock logic of a
//! handset, built on a typed broadcast/filter bus. Transports, timers and
//! persistence are injected, so the same code runs in the daemon and in
//! deterministic simulation.
//!
//! # Components
//!
//! - [`Datapipe`]: cached value with filter and trigger chains
//! - [`Datapipes`]: every pipe on the bus
//! - [`Submode`] / [`SubmodeChange`]: the submode register and its policy
//! - [`ModeTransition`], [`Devlock`], [`Tklock`]: the state machines
//! - [`MceContext`]: owns bus, machines, timers and transports
//! - [`Driver`] / [`Runtime`]: generic event loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod datapipe;
pub mod devlock;
pub mod error;
pub mod event;
pub mod ipc;
pub mod mode;
pub mod pipes;
pub mod retry;
pub mod runtime;
pub mod store;
pub mod submode;
pub mod timer;
pub mod tklock;
pub mod types;

pub use config::{
    ConfigSource, DevlockConfig, MAX_RETRY_BACKOFF, MceConfig, MemoryConfig, ModeConfig,
    TklockConfig,
};
pub use context::{MAX_NOTICES_PER_EVENT, MceContext, Services};
pub use datapipe::{CallbackId, Commit, Datapipe, ReadPolicy, Source, Subsystem};
pub use devlock::{Devlock, DevlockUiState};
pub use error::{IpcError, ParseError, RetryError, StoreError, SubmodeError};
pub use event::{Event, PipeInput};
pub use ipc::{
    DevlockUiMode, DevlockUiResult, MethodCall, MethodReply, ModeChangeResult, ModeTransitionTag,
    Responder, Signal, TklockUiMode, TklockUiResult, UiRequest, UiTransport,
};
pub use mode::ModeTransition;
pub use pipes::Datapipes;
pub use retry::RetryPolicy;
pub use runtime::{Driver, Runtime, Wake};
pub use store::{MemoryStore, StatusStore};
pub use submode::{Submode, SubmodeChange};
pub use timer::{MAX_DELAY, Moment, TimerKind, Timers};
pub use tklock::{AutorelockTriggers, Tklock, TklockUiState};
pub use types::{
    AlarmUiState, AudioRoute, CallState, CallType, CoverState, DeviceMode, DisplayState,
    InputEvent, LockState, PowerKeyEvent, SystemState,
};
