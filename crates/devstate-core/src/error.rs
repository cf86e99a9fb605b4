//! Error types for the device-state core.
//!
//! Nothing here is fatal to the daemon. Each error is logged by the caller and
//! the affected state machine falls back to its nearest consistent state.

use std::time::Duration;

use thiserror::Error;

use crate::submode::Submode;

/// Failure of a blocking call to the UI process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IpcError {
    /// No reply within the bounded call timeout.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The peer is not on the bus or the message could not be delivered.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The peer replied with an explicit refusal.
    #[error("request rejected by peer: {0}")]
    Rejected(String),
}

impl IpcError {
    /// Returns true if retrying the same call may succeed.
    ///
    /// An explicit refusal from the UI is final; timeouts and delivery
    /// failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

/// A bounded retry loop gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed after {attempts} attempt(s): {last}")]
pub struct RetryError {
    /// What was being retried.
    pub operation: &'static str,
    /// Attempts made, including the first one.
    pub attempts: u32,
    /// Error from the last attempt.
    pub last: IpcError,
}

/// Status file read or write failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying I/O error.
    #[error("i/o error on {path}: {reason}")]
    Io {
        /// File the operation targeted.
        path: String,
        /// OS error text.
        reason: String,
    },
}

/// Submode change that violates a mode-policy rule.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmodeError {
    /// The same flag is both set and cleared by one change.
    #[error("flags {0:?} both set and cleared")]
    Conflicting(Submode),

    /// Setting an exclusive flag that is already held.
    #[error("exclusive flag {0:?} already held")]
    AlreadyHeld(Submode),

    /// Resulting mask breaks a dependency between flags.
    #[error("{flag:?} requires {requires:?}")]
    MissingDependency {
        /// Flag that would be set.
        flag: Submode,
        /// Flag it depends on.
        requires: Submode,
    },

    /// Resulting mask combines flags that cannot coexist.
    #[error("{0:?} are mutually exclusive")]
    Exclusive(Submode),
}

/// Malformed argument in an incoming request or callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown lock request name.
    #[error("unknown lock state {0:?}")]
    LockState(String),

    /// Unknown tklock UI result code.
    #[error("unknown tklock ui result code {0}")]
    TklockResult(i32),

    /// Unknown devlock UI result code.
    #[error("unknown devlock ui result code {0}")]
    DevlockResult(i32),

    /// Config assignment not of the form `group.key=value`.
    #[error("malformed config assignment {0:?}")]
    ConfigAssignment(String),
}
