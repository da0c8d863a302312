//! Core infrastructure for Vigil.
//!
//! - [`TracingConfig`] - Installs the global `tracing` subscriber that receives
//!   instrument diagnostics
//! - [`LoggingInstrument`] - An [`Instrument`](vigil_instrument::Instrument)
//!   that logs the hooks selected by a [`LoggingInstrumentConfig`]
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vigil_core_plugins::{LoggingInstrument, TracingConfig};
//! use vigil_instrument::prelude::*;
//! use tracing::Level;
//!
//! TracingConfig::default().with_level(Level::DEBUG).init();
//!
//! let instruments = Instruments::new();
//! let logger: Rc<dyn Instrument> = Rc::new(LoggingInstrument::new("log"));
//! instruments.activate(&logger)?;
//! instruments.dispatch(&HookEvent::BeforeRun);
//! # Ok::<(), InstrumentsError>(())
//! ```

mod logging_instrument;
mod tracing_config;

pub use logging_instrument::{HOOK_LOG_TARGET, LogLevel, LoggingInstrument, LoggingInstrumentConfig};
pub use tracing_config::{TracingConfig, TracingError, TracingFormat};
