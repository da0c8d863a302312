//! Instrument contract and hook dispatch for Vigil.
//!
//! A cooperative scheduler owns one [`Instruments`] table per run. Third-party
//! [`Instrument`]s subscribe to a fixed set of lifecycle [`Hook`]s
//! ("a task is about to step", "the run loop is about to wait on I/O", ...)
//! without the scheduler paying for hooks nobody listens to, and without a
//! misbehaving instrument being able to take the scheduler down.
//!
//! # Core Concepts
//!
//! - [`Instrument`] - The capability contract: one no-op method per hook
//! - [`HookSet`] - The hooks an instrument declares it overrides
//! - [`classify()`] - Reads that declaration once, at activation
//! - [`Instruments`] - The hook table: activate, deactivate, query, dispatch
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vigil_instrument::prelude::*;
//!
//! struct Announcer;
//!
//! impl Instrument for Announcer {
//!     fn hooks(&self) -> Result<HookSet, InstrumentError> {
//!         Ok(HookSet::of::<TaskSpawned>())
//!     }
//!
//!     fn task_spawned(&self, task: TaskRef<'_>) -> HookResult {
//!         tracing::info!(task = %task, "spawned");
//!         Ok(())
//!     }
//! }
//!
//! let instruments = Instruments::new();
//! let announcer: Rc<dyn Instrument> = Rc::new(Announcer);
//! instruments.activate(&announcer)?;
//!
//! if instruments.is_listening(Hook::TaskSpawned) {
//!     let task = TaskRef::new(TaskId::new(0), "main");
//!     instruments.dispatch(&HookEvent::TaskSpawned { task });
//! }
//!
//! instruments.deactivate(&announcer)?;
//! assert!(!instruments.is_listening(Hook::TaskSpawned));
//! # Ok::<(), InstrumentsError>(())
//! ```
//!
//! Fault isolation relies on unwinding: building with `panic = "abort"`
//! still contains errors returned from hooks, but not panics.

/// Override classification.
pub mod classify;

/// Error types.
pub mod error;

/// Hook names, events and the instrument table.
pub mod hooks;

/// The instrument contract.
pub mod instrument;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::{InstrumentError, InstrumentsError};
    pub use crate::hooks::api::{InstrumentId, Instruments};
    pub use crate::hooks::events::{HookEvent, TaskId, TaskRef};
    pub use crate::hooks::schedule::{
        AfterIoWait, AfterRun, AfterTaskStep, BeforeIoWait, BeforeRun, BeforeTaskStep, Hook,
        HookMarker, HookSet, IntoHookSet, TaskExited, TaskScheduled, TaskSpawned,
    };
    pub use crate::instrument::{HookResult, Instrument, InstrumentFn};
}

// Re-export key types at crate root for convenience
pub use classify::classify;
pub use error::{InstrumentError, InstrumentsError, UnknownHook};
pub use hooks::{Hook, HookEvent, HookSet, InstrumentId, Instruments};
pub use instrument::{HookResult, Instrument, InstrumentFn};
