//! Daemon error types.

use std::path::PathBuf;

use devstate_core::ParseError;
use thiserror::Error;

/// Fatal daemon failure. Any of these ends the process with a non-zero exit.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A `--set` assignment could not be parsed.
    #[error("configuration: {0}")]
    Config(#[from] ParseError),

    /// The state directory is missing and cannot be created.
    #[error("state directory {}: {source}", path.display())]
    StateDir {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Installing the interrupt handler failed.
    #[error("signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Malformed control line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// First word is not a known command.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// Pipe name is not one the daemon accepts input on.
    #[error("unknown pipe {0:?}")]
    UnknownPipe(String),

    /// Method name is not exposed.
    #[error("unknown method {0:?}")]
    UnknownMethod(String),

    /// Command needs more words.
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),

    /// Argument does not parse for its target.
    #[error("bad value {value:?} for {target}")]
    BadValue {
        /// Pipe or method the value was meant for.
        target: &'static str,
        /// Offending word.
        value: String,
    },
}
