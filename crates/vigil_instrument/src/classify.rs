//! Works out which hooks an instrument overrides.
//!
//! Runs once per activation and never during dispatch. The result is cached in
//! the hook table by [`Instruments::activate`](crate::Instruments::activate).

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::InstrumentError;
use crate::hooks::schedule::HookSet;
use crate::instrument::Instrument;

/// Returns the hooks `instrument` overrides.
///
/// A declaration that returns an error or panics is a classification failure.
pub fn classify(instrument: &dyn Instrument) -> Result<HookSet, InstrumentError> {
    match catch_unwind(AssertUnwindSafe(|| instrument.hooks())) {
        Ok(result) => result,
        Err(payload) => Err(InstrumentError::from_panic(&*payload)),
    }
}
