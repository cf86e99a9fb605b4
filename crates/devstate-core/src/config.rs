//! Configuration lookup and typed per-subsystem settings.
//!
//! Settings are addressed as `group.key`. Lookups never fail: a missing or
//! malformed value falls back to the compiled-in default and is logged.

use std::{collections::HashMap, time::Duration};

use crate::{error::ParseError, timer::MAX_DELAY};

/// Source of configuration values.
pub trait ConfigSource {
    /// Integer value of `group.key`, or `default`.
    fn get_int(&self, group: &str, key: &str, default: i64) -> i64;

    /// Boolean value of `group.key`, or `default`.
    fn get_bool(&self, group: &str, key: &str, default: bool) -> bool;

    /// String value of `group.key`, or `default`.
    fn get_string(&self, group: &str, key: &str, default: &str) -> String;
}

/// In-memory configuration, populated from `group.key=value` assignments.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    values: HashMap<(String, String), String>,
}

impl MemoryConfig {
    /// Empty configuration: every lookup yields its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `group.key` to `value`.
    pub fn set(&mut self, group: &str, key: &str, value: impl Into<String>) {
        self.values.insert((group.to_string(), key.to_string()), value.into());
    }

    /// Parse and apply a `group.key=value` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), ParseError> {
        let malformed = || ParseError::ConfigAssignment(assignment.to_string());

        let (path, value) = assignment.split_once('=').ok_or_else(malformed)?;
        let (group, key) = path.trim().split_once('.').ok_or_else(malformed)?;
        if group.is_empty() || key.is_empty() {
            return Err(malformed());
        }

        self.set(group, key, value.trim());
        Ok(())
    }

    fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.values.get(&(group.to_string(), key.to_string())).map(String::as_str)
    }
}

impl ConfigSource for MemoryConfig {
    fn get_int(&self, group: &str, key: &str, default: i64) -> i64 {
        match self.raw(group, key).map(str::parse::<i64>) {
            None => default,
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                tracing::warn!(group, key, default, "config value is not an integer");
                default
            },
        }
    }

    fn get_bool(&self, group: &str, key: &str, default: bool) -> bool {
        match self.raw(group, key) {
            None => default,
            Some("true" | "1" | "yes") => true,
            Some("false" | "0" | "no") => false,
            Some(_) => {
                tracing::warn!(group, key, default, "config value is not a boolean");
                default
            },
        }
    }

    fn get_string(&self, group: &str, key: &str, default: &str) -> String {
        self.raw(group, key).unwrap_or(default).to_string()
    }
}

fn seconds(source: &dyn ConfigSource, group: &str, key: &str, default: Duration) -> Duration {
    let secs = source.get_int(group, key, default.as_secs() as i64);
    match u64::try_from(secs) {
        Ok(secs) if Duration::from_secs(secs) > MAX_DELAY => {
            tracing::warn!(group, key, secs, max = MAX_DELAY.as_secs(), "duration clamped");
            MAX_DELAY
        },
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            tracing::warn!(group, key, secs, "negative duration ignored");
            default
        },
    }
}

/// Longest pause between UI call attempts.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(1);

fn backoff(source: &dyn ConfigSource, group: &str, key: &str) -> Duration {
    let millis = source.get_int(group, key, 0);
    match u64::try_from(millis) {
        Ok(millis) => Duration::from_millis(millis).min(MAX_RETRY_BACKOFF),
        Err(_) => {
            tracing::warn!(group, key, millis, "negative backoff ignored");
            Duration::ZERO
        },
    }
}

fn attempts(source: &dyn ConfigSource, group: &str, key: &str, default: u32) -> u32 {
    let value = source.get_int(group, key, i64::from(default));
    u32::try_from(value).ok().filter(|n| *n > 0).unwrap_or(default)
}

/// Mode transition settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    /// Status file holding the last device mode.
    pub mode_file: String,
    /// Method the confirmation dialog reports back to.
    pub dialog_callback: String,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self { mode_file: "mode".to_string(), dialog_callback: "modechange_callback".to_string() }
    }
}

impl ModeConfig {
    const GROUP: &'static str = "Modes";

    /// Read from `source`, defaulting missing keys.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let d = Self::default();
        Self {
            mode_file: source.get_string(Self::GROUP, "ModeFile", &d.mode_file),
            dialog_callback: source.get_string(Self::GROUP, "DialogCallback", &d.dialog_callback),
        }
    }
}

/// Device lock settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevlockConfig {
    /// Delay before the next PIN query, indexed by `failed_count % len`.
    pub delay_table: Vec<Duration>,
    /// Lock automatically after inactivity.
    pub autolock_enabled: bool,
    /// Inactivity before autolock.
    pub autolock_delay: Duration,
    /// How long the shutdown confirmation waits before shutting down.
    pub shutdown_timeout: Duration,
    /// Status file holding the devlock boot flag.
    pub boot_flag_file: String,
    /// Attempts for a PIN UI close.
    pub ui_retry: u32,
    /// Pause between PIN UI attempts. Blocks the event loop while it runs.
    pub ui_retry_backoff: Duration,
}

impl Default for DevlockConfig {
    fn default() -> Self {
        Self {
            delay_table: [0, 1, 1, 5].into_iter().map(Duration::from_secs).collect(),
            autolock_enabled: true,
            autolock_delay: Duration::from_secs(10 * 60),
            shutdown_timeout: Duration::from_secs(10),
            boot_flag_file: "devlock-boot".to_string(),
            ui_retry: 5,
            ui_retry_backoff: Duration::ZERO,
        }
    }
}

impl DevlockConfig {
    const GROUP: &'static str = "DevLock";

    /// Read from `source`, defaulting missing keys.
    ///
    /// `DelayTable` is a comma-separated list of seconds. An unparseable or
    /// empty table keeps the default.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let d = Self::default();
        let table = source.get_string(Self::GROUP, "DelayTable", "");
        let delay_table = if table.trim().is_empty() {
            d.delay_table.clone()
        } else {
            parse_delay_table(&table).unwrap_or_else(|| {
                tracing::warn!(table = %table, "malformed devlock delay table ignored");
                d.delay_table.clone()
            })
        };

        Self {
            delay_table,
            autolock_enabled: source.get_bool(Self::GROUP, "AutolockEnabled", d.autolock_enabled),
            autolock_delay: seconds(source, Self::GROUP, "AutolockDelay", d.autolock_delay),
            shutdown_timeout: seconds(source, Self::GROUP, "ShutdownTimeout", d.shutdown_timeout),
            boot_flag_file: source.get_string(Self::GROUP, "BootFlagFile", &d.boot_flag_file),
            ui_retry: attempts(source, Self::GROUP, "UiRetry", d.ui_retry),
            ui_retry_backoff: backoff(source, Self::GROUP, "UiRetryBackoffMs"),
        }
    }

    /// Delay after `failed_count` consecutive wrong PINs.
    pub fn delay_for(&self, failed_count: u32) -> Duration {
        if self.delay_table.is_empty() {
            return Duration::ZERO;
        }
        self.delay_table[failed_count as usize % self.delay_table.len()]
    }
}

fn parse_delay_table(table: &str) -> Option<Vec<Duration>> {
    let delays: Option<Vec<_>> =
        table.split(',').map(|s| s.trim().parse::<u64>().ok().map(table_delay)).collect();
    delays.filter(|d| !d.is_empty())
}

fn table_delay(secs: u64) -> Duration {
    Duration::from_secs(secs).min(MAX_DELAY)
}

/// Touchscreen/keypad lock settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TklockConfig {
    /// Time from lock to dimming.
    pub dim_delay: Duration,
    /// Time from dimming to blanking.
    pub blank_delay: Duration,
    /// Slider idle time before the display blanks again.
    pub visual_blank_delay: Duration,
    /// Upper bound on slider visibility, regardless of touches.
    pub forced_visual_blank_delay: Duration,
    /// Dim right after locking.
    pub dim_immediately: bool,
    /// Blank right after locking.
    pub blank_immediately: bool,
    /// Record slide, lens and proximity triggers for relocking.
    pub autorelock_enabled: bool,
    /// Lock when the display blanks in the user state.
    pub lock_on_blank: bool,
    /// Delay for `OffDelayed` requests.
    pub unlock_delay: Duration,
    /// Attempts for a lock UI close.
    pub ui_retry: u32,
    /// Pause between lock UI close attempts. Blocks the event loop while it
    /// runs.
    pub ui_retry_backoff: Duration,
}

impl Default for TklockConfig {
    fn default() -> Self {
        Self {
            dim_delay: Duration::from_secs(3),
            blank_delay: Duration::from_secs(3),
            visual_blank_delay: Duration::from_secs(5),
            forced_visual_blank_delay: Duration::from_secs(30),
            dim_immediately: false,
            blank_immediately: false,
            autorelock_enabled: true,
            lock_on_blank: true,
            unlock_delay: Duration::from_secs(1),
            ui_retry: 5,
            ui_retry_backoff: Duration::ZERO,
        }
    }
}

impl TklockConfig {
    const GROUP: &'static str = "TKLock";

    /// Read from `source`, defaulting missing keys.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let d = Self::default();
        let g = Self::GROUP;
        Self {
            dim_delay: seconds(source, g, "DimDelay", d.dim_delay),
            blank_delay: seconds(source, g, "BlankDelay", d.blank_delay),
            visual_blank_delay: seconds(source, g, "VisualBlankDelay", d.visual_blank_delay),
            forced_visual_blank_delay: seconds(
                source,
                g,
                "ForcedVisualBlankDelay",
                d.forced_visual_blank_delay,
            ),
            dim_immediately: source.get_bool(g, "DimImmediately", d.dim_immediately),
            blank_immediately: source.get_bool(g, "BlankImmediately", d.blank_immediately),
            autorelock_enabled: source.get_bool(g, "AutorelockEnabled", d.autorelock_enabled),
            lock_on_blank: source.get_bool(g, "LockOnBlank", d.lock_on_blank),
            unlock_delay: seconds(source, g, "UnlockDelay", d.unlock_delay),
            ui_retry: attempts(source, g, "UiRetry", d.ui_retry),
            ui_retry_backoff: backoff(source, g, "UiRetryBackoffMs"),
        }
    }
}

/// All subsystem settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MceConfig {
    /// Mode transition.
    pub modes: ModeConfig,
    /// Device lock.
    pub devlock: DevlockConfig,
    /// Tklock.
    pub tklock: TklockConfig,
}

impl MceConfig {
    /// Read every group from `source`.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self {
            modes: ModeConfig::from_source(source),
            devlock: DevlockConfig::from_source(source),
            tklock: TklockConfig::from_source(source),
        }
    }
}
