//! The contract every instrument implements.
//!
//! An instrument overrides any subset of the hook methods below and declares
//! that subset through [`Instrument::hooks`]. The declaration is read once,
//! when the instrument is activated; only the declared hooks are ever called.
//!
//! # Example
//!
//! ```
//! use vigil_instrument::hooks::events::TaskRef;
//! use vigil_instrument::hooks::schedule::{BeforeTaskStep, HookSet};
//! use vigil_instrument::{HookResult, Instrument, InstrumentError};
//! use std::cell::Cell;
//!
//! #[derive(Default)]
//! struct StepCounter {
//!     steps: Cell<usize>,
//! }
//!
//! impl Instrument for StepCounter {
//!     fn hooks(&self) -> Result<HookSet, InstrumentError> {
//!         Ok(HookSet::of::<BeforeTaskStep>())
//!     }
//!
//!     fn before_task_step(&self, _task: TaskRef<'_>) -> HookResult {
//!         self.steps.set(self.steps.get() + 1);
//!         Ok(())
//!     }
//! }
//! ```

use core::fmt;
use core::time::Duration;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::InstrumentError;
use crate::hooks::events::{HookEvent, TaskRef};
use crate::hooks::schedule::{Hook, HookSet, IntoHookSet};

/// Return type of every hook method.
pub type HookResult = Result<(), InstrumentError>;

/// An observer of scheduler lifecycle events.
///
/// All hook methods default to doing nothing. Overriding a method has no
/// effect unless the hook is also part of [`hooks`](Self::hooks).
///
/// Returning an error (or panicking) from a hook disables the instrument for
/// the rest of the run.
pub trait Instrument {
    /// Declares which hooks this instrument overrides.
    ///
    /// Called once per activation. An error here aborts the activation.
    fn hooks(&self) -> Result<HookSet, InstrumentError>;

    /// Name used in diagnostics. Defaults to the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Called once at the start of a run.
    fn before_run(&self) -> HookResult {
        Ok(())
    }

    /// Called once at the end of a run.
    fn after_run(&self) -> HookResult {
        Ok(())
    }

    /// Called when `task` is spawned.
    fn task_spawned(&self, _task: TaskRef<'_>) -> HookResult {
        Ok(())
    }

    /// Called when `task` becomes runnable.
    fn task_scheduled(&self, _task: TaskRef<'_>) -> HookResult {
        Ok(())
    }

    /// Called right before `task` is resumed.
    fn before_task_step(&self, _task: TaskRef<'_>) -> HookResult {
        Ok(())
    }

    /// Called right after `task` yields.
    fn after_task_step(&self, _task: TaskRef<'_>) -> HookResult {
        Ok(())
    }

    /// Called when `task` exits.
    fn task_exited(&self, _task: TaskRef<'_>) -> HookResult {
        Ok(())
    }

    /// Called before the scheduler blocks on I/O for at most `timeout`.
    fn before_io_wait(&self, _timeout: Duration) -> HookResult {
        Ok(())
    }

    /// Called after the scheduler returns from an I/O wait started with `timeout`.
    fn after_io_wait(&self, _timeout: Duration) -> HookResult {
        Ok(())
    }

    /// Routes `event` to the matching hook method.
    ///
    /// This is the single entry point used by dispatch. Instruments that
    /// prefer to handle every event in one place may override it instead of
    /// the individual hook methods.
    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        match *event {
            HookEvent::BeforeRun => self.before_run(),
            HookEvent::AfterRun => self.after_run(),
            HookEvent::TaskSpawned { task } => self.task_spawned(task),
            HookEvent::TaskScheduled { task } => self.task_scheduled(task),
            HookEvent::BeforeTaskStep { task } => self.before_task_step(task),
            HookEvent::AfterTaskStep { task } => self.after_task_step(task),
            HookEvent::TaskExited { task } => self.task_exited(task),
            HookEvent::BeforeIoWait { timeout } => self.before_io_wait(timeout),
            HookEvent::AfterIoWait { timeout } => self.after_io_wait(timeout),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstrumentFn
// ─────────────────────────────────────────────────────────────────────────────

type SharedCallback = Rc<dyn Fn(&HookEvent<'_>) -> HookResult>;

/// An instrument assembled from closures, one per hook.
///
/// The hooks it overrides are exactly the hooks a callback was registered
/// for. Registering a callback for several hooks at once shares it between
/// them.
///
/// ```
/// use vigil_instrument::hooks::events::HookEvent;
/// use vigil_instrument::hooks::schedule::{AfterRun, BeforeRun, Hook};
/// use vigil_instrument::{Instrument, InstrumentFn};
///
/// let instrument = InstrumentFn::new("run-timer")
///     .on::<(BeforeRun, AfterRun)>(|event: &HookEvent<'_>| {
///         let _ = event.hook();
///         Ok(())
///     });
///
/// let hooks = instrument.hooks().unwrap();
/// assert!(hooks.contains(Hook::BeforeRun));
/// assert!(hooks.contains(Hook::AfterRun));
/// assert_eq!(hooks.len(), 2);
/// ```
pub struct InstrumentFn {
    name: String,
    callbacks: HashMap<Hook, SharedCallback>,
}

impl InstrumentFn {
    /// Creates an instrument with no callbacks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            callbacks: HashMap::new(),
        }
    }

    /// Registers `callback` for every hook in `S` (a marker or a tuple of
    /// markers), replacing any previous callback for those hooks.
    #[must_use]
    pub fn on<S: IntoHookSet>(
        mut self,
        callback: impl Fn(&HookEvent<'_>) -> HookResult + 'static,
    ) -> Self {
        let callback: SharedCallback = Rc::new(callback);
        for hook in HookSet::of::<S>().iter() {
            self.callbacks.insert(hook, Rc::clone(&callback));
        }
        self
    }
}

impl fmt::Debug for InstrumentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: HookSet = self.callbacks.keys().copied().collect();
        f.debug_struct("InstrumentFn")
            .field("name", &self.name)
            .field("hooks", &hooks)
            .finish()
    }
}

impl Instrument for InstrumentFn {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(self.callbacks.keys().copied().collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        match self.callbacks.get(&event.hook()) {
            Some(callback) => callback(event),
            None => Ok(()),
        }
    }
}
