//! An instrument that logs scheduler hooks through `tracing`.
//!
//! Which hooks are logged, and at what level, comes from a
//! [`LoggingInstrumentConfig`] that can be deserialized from any `serde`
//! format:
//!
//! ```
//! use std::rc::Rc;
//! use vigil_core_plugins::{LoggingInstrument, LoggingInstrumentConfig};
//! use vigil_instrument::prelude::*;
//!
//! let config: LoggingInstrumentConfig = serde_json::from_str(
//!     r#"{ "hooks": ["before_task_step", "task_exited"], "level": "info" }"#,
//! )?;
//! let logger: Rc<dyn Instrument> = Rc::new(LoggingInstrument::from_config("steps", config));
//!
//! let instruments = Instruments::new();
//! instruments.activate(&logger)?;
//! assert!(instruments.is_listening(Hook::TaskExited));
//! assert!(!instruments.is_listening(Hook::BeforeRun));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use vigil_instrument::hooks::events::HookEvent;
use vigil_instrument::hooks::schedule::{Hook, HookSet};
use vigil_instrument::{HookResult, Instrument, InstrumentError};

/// Log target used by [`LoggingInstrument`].
pub const HOOK_LOG_TARGET: &str = "vigil::hooks";

/// Log level as it appears in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// `TRACE`
    Trace,
    /// `DEBUG` (default)
    #[default]
    Debug,
    /// `INFO`
    Info,
    /// `WARN`
    Warn,
    /// `ERROR`
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Configuration of a [`LoggingInstrument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingInstrumentConfig {
    /// Hooks to log. Defaults to every hook.
    pub hooks: Vec<Hook>,
    /// Level of the emitted records.
    pub level: LogLevel,
}

impl Default for LoggingInstrumentConfig {
    fn default() -> Self {
        Self {
            hooks: Hook::ALL.to_vec(),
            level: LogLevel::default(),
        }
    }
}

/// Logs every selected hook as one `tracing` record on [`HOOK_LOG_TARGET`].
#[derive(Debug, Clone)]
pub struct LoggingInstrument {
    name: String,
    hooks: HookSet,
    level: LogLevel,
}

impl LoggingInstrument {
    /// Logs every hook at `DEBUG`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(name, LoggingInstrumentConfig::default())
    }

    /// Builds the instrument from a configuration.
    #[must_use]
    pub fn from_config(name: impl Into<String>, config: LoggingInstrumentConfig) -> Self {
        Self {
            name: name.into(),
            hooks: config.hooks.into_iter().collect(),
            level: config.level,
        }
    }
}

macro_rules! log_hook {
    ($level:expr, $($field:tt)*) => {
        match $level {
            LogLevel::Trace => tracing::trace!(target: HOOK_LOG_TARGET, $($field)*),
            LogLevel::Debug => tracing::debug!(target: HOOK_LOG_TARGET, $($field)*),
            LogLevel::Info => tracing::info!(target: HOOK_LOG_TARGET, $($field)*),
            LogLevel::Warn => tracing::warn!(target: HOOK_LOG_TARGET, $($field)*),
            LogLevel::Error => tracing::error!(target: HOOK_LOG_TARGET, $($field)*),
        }
    };
}

impl Instrument for LoggingInstrument {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(self.hooks)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        let hook = event.hook();
        match *event {
            HookEvent::BeforeRun | HookEvent::AfterRun => {
                log_hook!(self.level, instrument = %self.name, hook = %hook, "hook");
            }
            HookEvent::TaskSpawned { task }
            | HookEvent::TaskScheduled { task }
            | HookEvent::BeforeTaskStep { task }
            | HookEvent::AfterTaskStep { task }
            | HookEvent::TaskExited { task } => {
                log_hook!(
                    self.level,
                    instrument = %self.name,
                    hook = %hook,
                    task_id = %task.id,
                    task_name = task.name,
                    "hook"
                );
            }
            HookEvent::BeforeIoWait { timeout } | HookEvent::AfterIoWait { timeout } => {
                log_hook!(
                    self.level,
                    instrument = %self.name,
                    hook = %hook,
                    timeout = ?timeout,
                    "hook"
                );
            }
        }
        Ok(())
    }
}
