//! Device-state daemon binary.
//!
//! # Usage
//!
//! ```bash
//! # Run with status files under /var/lib/devstate
//! devstated --state-dir /var/lib/devstate
//!
//! # Override settings
//! devstated --set TKLock.DimDelay=5 --set DevLock.AutolockEnabled=false
//!
//! # Drive it by hand
//! echo "pipe call_state active" | devstated --state-dir /tmp/devstate
//! ```

use std::path::PathBuf;

use clap::Parser;
use devstated::{DaemonConfig, SystemDriver, feed_lines};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Device-state daemon
#[derive(Parser, Debug)]
#[command(name = "devstated")]
#[command(about = "Device mode, touchscreen/keypad lock and device lock daemon")]
#[command(version)]
struct Args {
    /// Directory for persisted status files
    #[arg(long, default_value = "/var/lib/devstate")]
    state_dir: PathBuf,

    /// Setting override as group.key=value (repeatable)
    #[arg(long = "set", value_name = "GROUP.KEY=VALUE")]
    assignments: Vec<String>,

    /// Do not read control lines from standard input
    #[arg(long)]
    no_stdin: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    tracing::info!("devstated starting");

    let config = DaemonConfig { state_dir: args.state_dir, assignments: args.assignments };
    let (driver, events) = SystemDriver::channel();

    // Without stdin the sender is held here so the loop only stops on Ctrl-C.
    let _idle_sender = if args.no_stdin {
        Some(events)
    } else {
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            match feed_lines(stdin, events).await {
                Ok(lines) => tracing::info!(lines, "standard input closed"),
                Err(err) => tracing::error!(%err, "reading standard input failed"),
            }
        });
        None
    };

    let context = devstated::run(&config, driver).await?;
    tracing::info!(mode = %context.pipes().device_mode.get(), "devstated stopped");

    Ok(())
}
