//! The instrument table owned by a scheduler run.
//!
//! [`Instruments`] caches, for every hook, the active instruments that
//! override it. The scheduler asks [`is_listening`](Instruments::is_listening)
//! before building the arguments of a hot-path hook and only then calls
//! [`dispatch`](Instruments::dispatch):
//!
//! ```
//! use std::rc::Rc;
//! use vigil_instrument::hooks::events::{HookEvent, TaskId, TaskRef};
//! use vigil_instrument::hooks::schedule::{BeforeTaskStep, Hook};
//! use vigil_instrument::{Instrument, InstrumentFn, Instruments};
//!
//! let instruments = Instruments::new();
//! let tracer: Rc<dyn Instrument> = Rc::new(
//!     InstrumentFn::new("tracer").on::<BeforeTaskStep>(|_: &HookEvent<'_>| Ok(())),
//! );
//! instruments.activate(&tracer)?;
//!
//! if instruments.is_listening(Hook::BeforeTaskStep) {
//!     let task = TaskRef::new(TaskId::new(1), "main");
//!     instruments.dispatch(&HookEvent::BeforeTaskStep { task });
//! }
//! assert!(!instruments.is_listening(Hook::AfterTaskStep));
//! # Ok::<(), vigil_instrument::InstrumentsError>(())
//! ```
//!
//! # Faulty instruments
//!
//! An instrument whose hook returns an error or panics is deactivated on the
//! spot and a diagnostic is logged on the `vigil::instrument` target. The
//! remaining instruments still receive the event, and nothing propagates to
//! the scheduler.
//!
//! # Reentrancy
//!
//! Every operation takes `&self`, so an instrument holding an
//! `Rc<Instruments>` may activate or deactivate instruments (itself included)
//! from inside a hook. Dispatch iterates a snapshot of the bucket taken when
//! the call started; changes made during dispatch apply from the next call.

use core::cell::RefCell;
use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use hashbrown::HashMap;
use indexmap::IndexMap;

use super::events::HookEvent;
use super::schedule::{Hook, HookSet};
use crate::classify::classify;
use crate::error::{InstrumentError, InstrumentsError};
use crate::instrument::Instrument;

/// Log target for instrument lifecycle and fault records.
pub const LOG_TARGET: &str = "vigil::instrument";

// ─────────────────────────────────────────────────────────────────────────────
// InstrumentId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of an instrument: the address of its `Rc` allocation.
///
/// Clones of one `Rc` share an identity; two instances never do while both
/// are alive. The table holds a strong reference to every active instrument,
/// so an address cannot be reused while its instrument is active.
///
/// Displayed as a hex address, which is how diagnostics and errors tell
/// apart instances that share a [`name`](Instrument::name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrumentId(usize);

impl InstrumentId {
    /// Returns the identity of `instrument`.
    #[must_use]
    pub fn of(instrument: &Rc<dyn Instrument>) -> Self {
        Self(Rc::as_ptr(instrument).cast::<()>().addr())
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Name of `instrument`, or a placeholder if its `name` panics.
fn display_name(instrument: &dyn Instrument) -> String {
    catch_unwind(AssertUnwindSafe(|| instrument.name().to_owned()))
        .unwrap_or_else(|_| String::from("<unnamed>"))
}

type Bucket = IndexMap<InstrumentId, Rc<dyn Instrument>>;

#[derive(Default)]
struct Table {
    /// Every active instrument.
    all: Bucket,
    /// Active instruments per hook, in activation order. Never holds an
    /// empty bucket.
    by_hook: HashMap<Hook, Bucket>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Instruments
// ─────────────────────────────────────────────────────────────────────────────

/// Hook table for one scheduler run.
///
/// Single-threaded: the table is neither `Send` nor `Sync` and uses no locks.
#[derive(Default)]
pub struct Instruments {
    table: RefCell<Table>,
}

impl Instruments {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table and activates each of `incoming` in order.
    ///
    /// Stops at the first instrument whose activation fails.
    pub fn with_instruments(
        incoming: impl IntoIterator<Item = Rc<dyn Instrument>>,
    ) -> Result<Self, InstrumentsError> {
        let instruments = Self::new();
        for instrument in incoming {
            instruments.activate(&instrument)?;
        }
        Ok(instruments)
    }

    /// Starts delivering events to `instrument`.
    ///
    /// Does nothing if `instrument` is already active. If its hook
    /// declaration fails, the instrument is left inactive and the error is
    /// returned.
    pub fn activate(&self, instrument: &Rc<dyn Instrument>) -> Result<(), InstrumentsError> {
        let id = InstrumentId::of(instrument);
        {
            let mut table = self.table.borrow_mut();
            if table.all.contains_key(&id) {
                return Ok(());
            }
            table.all.insert(id, Rc::clone(instrument));
        }

        let hooks = match classify(instrument.as_ref()) {
            Ok(hooks) => hooks,
            Err(source) => {
                self.remove(id);
                return Err(InstrumentsError::Classification {
                    instrument: display_name(instrument.as_ref()),
                    id,
                    source,
                });
            }
        };

        {
            let mut table = self.table.borrow_mut();
            // The declaration may have deactivated the instrument reentrantly.
            if !table.all.contains_key(&id) {
                return Ok(());
            }
            for hook in hooks.iter() {
                table
                    .by_hook
                    .entry(hook)
                    .or_default()
                    .insert(id, Rc::clone(instrument));
            }
        }

        tracing::debug!(
            target: LOG_TARGET,
            instrument = display_name(instrument.as_ref()).as_str(),
            instrument_id = %id,
            hooks = ?hooks,
            "instrument activated"
        );
        Ok(())
    }

    /// Stops delivering events to `instrument`.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentsError::NotActive`] if `instrument` was never
    /// activated, was already deactivated, or was disabled after a fault.
    pub fn deactivate(&self, instrument: &Rc<dyn Instrument>) -> Result<(), InstrumentsError> {
        let id = InstrumentId::of(instrument);
        if !self.remove(id) {
            return Err(InstrumentsError::NotActive {
                instrument: display_name(instrument.as_ref()),
                id,
            });
        }
        tracing::debug!(
            target: LOG_TARGET,
            instrument = display_name(instrument.as_ref()).as_str(),
            instrument_id = %id,
            "instrument deactivated"
        );
        Ok(())
    }

    /// Returns `true` if at least one active instrument overrides `hook`.
    #[must_use]
    pub fn is_listening(&self, hook: Hook) -> bool {
        self.table.borrow().by_hook.contains_key(&hook)
    }

    /// Delivers `event` to every active instrument overriding its hook, in
    /// activation order.
    ///
    /// A no-op when nobody listens. Instruments that fail are disabled and
    /// logged; see the [module docs](self).
    pub fn dispatch(&self, event: &HookEvent<'_>) {
        let hook = event.hook();
        let snapshot: Vec<(InstrumentId, Rc<dyn Instrument>)> =
            match self.table.borrow().by_hook.get(&hook) {
                Some(bucket) => bucket
                    .iter()
                    .map(|(id, instrument)| (*id, Rc::clone(instrument)))
                    .collect(),
                None => return,
            };

        for (id, instrument) in snapshot {
            let outcome = match catch_unwind(AssertUnwindSafe(|| instrument.on_event(event))) {
                Ok(result) => result,
                Err(payload) => Err(InstrumentError::from_panic(&*payload)),
            };

            if let Err(error) = outcome {
                // Someone else may have removed it already; that is fine here.
                self.remove(id);
                tracing::error!(
                    target: LOG_TARGET,
                    hook = %hook,
                    instrument = display_name(instrument.as_ref()).as_str(),
                    instrument_id = %id,
                    error = %error,
                    "error raised when calling hook on instrument; instrument has been disabled"
                );
            }
        }
    }

    /// Returns `true` if `instrument` is currently active.
    #[must_use]
    pub fn is_active(&self, instrument: &Rc<dyn Instrument>) -> bool {
        self.table
            .borrow()
            .all
            .contains_key(&InstrumentId::of(instrument))
    }

    /// Returns the number of active instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.borrow().all.len()
    }

    /// Returns `true` if no instrument is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.borrow().all.is_empty()
    }

    /// Returns the number of active instruments overriding `hook`.
    #[must_use]
    pub fn listener_count(&self, hook: Hook) -> usize {
        self.table
            .borrow()
            .by_hook
            .get(&hook)
            .map_or(0, Bucket::len)
    }

    /// Returns the hooks that currently have at least one listener.
    #[must_use]
    pub fn listening(&self) -> HookSet {
        self.table.borrow().by_hook.keys().copied().collect()
    }

    /// Removes `id` from every set. Returns `false` if it was not active.
    fn remove(&self, id: InstrumentId) -> bool {
        let mut table = self.table.borrow_mut();
        if table.all.shift_remove(&id).is_none() {
            return false;
        }
        table.by_hook.retain(|_, bucket| {
            bucket.shift_remove(&id);
            !bucket.is_empty()
        });
        true
    }
}

impl fmt::Debug for Instruments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names(bucket: &Bucket) -> Vec<&str> {
            bucket.values().map(|i| i.name()).collect()
        }

        let table = self.table.borrow();
        let mut buckets: Vec<(Hook, Vec<&str>)> = table
            .by_hook
            .iter()
            .map(|(hook, bucket)| (*hook, names(bucket)))
            .collect();
        buckets.sort_by_key(|(hook, _)| *hook);

        f.debug_struct("Instruments")
            .field("active", &names(&table.all))
            .field("by_hook", &buckets)
            .finish()
    }
}
