//! Device-state daemon.
//!
//! Production glue around [`devstate_core`]: a tokio-backed [`SystemDriver`],
//! status files on disk through [`FileStore`], and a UI transport that logs
//! instead of talking to a UI process. Inputs are read as control lines (see
//! [`control`]) and fed through an [`EventSender`].
//!
//! # Components
//!
//! - [`SystemDriver`]: channel + timer driver for the core runtime
//! - [`FileStore`]: atomic status file persistence
//! - [`LogOnlyUi`]: UI transport stand-in
//! - [`feed_lines`]: control line reader

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod control;
mod driver;
mod error;
mod store;
mod ui;

use std::path::PathBuf;

use devstate_core::{MceConfig, MceContext, MemoryConfig, Runtime};
pub use driver::{EventSender, SystemDriver};
pub use error::{ControlError, RuntimeError};
pub use store::FileStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
pub use ui::LogOnlyUi;

use crate::control::Control;

/// Daemon context type.
pub type DaemonContext = MceContext<LogOnlyUi, FileStore, tokio::time::Instant>;

/// Startup settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory for the status files.
    pub state_dir: PathBuf,
    /// `group.key=value` overrides.
    pub assignments: Vec<String>,
}

impl DaemonConfig {
    /// Resolve the overrides into typed settings.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Config`] for a malformed assignment.
    pub fn mce_config(&self) -> Result<MceConfig, RuntimeError> {
        let mut source = MemoryConfig::new();
        for assignment in &self.assignments {
            source.apply_assignment(assignment)?;
        }
        Ok(MceConfig::from_source(&source))
    }
}

/// Build the context and run it on `driver` until it stops.
///
/// # Errors
///
/// Fails on bad overrides, an unusable state directory, or a driver error.
pub async fn run(config: &DaemonConfig, driver: SystemDriver) -> Result<DaemonContext, RuntimeError> {
    let mce = config.mce_config()?;
    let store = FileStore::open(config.state_dir.clone())?;
    tracing::info!(state_dir = %store.root().display(), "status files");

    let context = MceContext::new(mce, LogOnlyUi::new(), store);
    Runtime::new(driver, context).run().await
}

/// Feed control lines from `reader` into the daemon until end of input.
///
/// Malformed lines are logged and skipped. Method replies are logged when
/// they arrive. Returns the number of lines accepted.
///
/// # Errors
///
/// Returns the reader's I/O error.
pub async fn feed_lines<R>(reader: R, events: EventSender) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut accepted = 0;

    while let Some(line) = lines.next_line().await? {
        let control = match control::parse_line(&line) {
            Ok(Some(control)) => control,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(%err, line = %line, "ignoring control line");
                continue;
            },
        };

        let delivered = match control {
            Control::Input(input) => events.send(input),
            Control::Call(call) => match events.call(call.clone()) {
                Some(reply) => {
                    tokio::spawn(async move {
                        match reply.await {
                            Ok(reply) => tracing::info!(?call, ?reply, "method reply"),
                            Err(_) => tracing::warn!(?call, "method dropped without reply"),
                        }
                    });
                    true
                },
                None => false,
            },
        };
        if !delivered {
            tracing::debug!("daemon stopped, no more control lines");
            break;
        }
        accepted += 1;
    }

    Ok(accepted)
}
