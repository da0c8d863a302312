//! Error types for instruments and the instrument table.
//!
//! There are two error domains:
//!
//! - [`InstrumentError`] is what an instrument returns from a hook. It never
//!   escapes [`Instruments::dispatch`](crate::Instruments::dispatch): the
//!   instrument is disabled and the error is logged.
//! - [`InstrumentsError`] is a misuse of the table itself (deactivating
//!   something that is not active, or an instrument whose override
//!   declaration fails). These are returned to the caller.

use thiserror::Error;

use crate::hooks::api::InstrumentId;

/// Errors raised by an instrument while running a hook or declaring its hooks.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// The instrument reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The instrument surfaced an underlying error.
    #[error(transparent)]
    Source(#[from] Box<dyn core::error::Error + Send + Sync>),

    /// The instrument panicked; the payload is rendered as text.
    #[error("instrument panicked: {0}")]
    Panicked(String),
}

impl InstrumentError {
    /// Creates a [`Failed`](Self::Failed) error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Builds a [`Panicked`](Self::Panicked) error from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn core::any::Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        Self::Panicked(msg)
    }
}

/// Errors returned by [`Instruments`](crate::Instruments) operations.
#[derive(Debug, Error)]
pub enum InstrumentsError {
    /// The instrument is not currently active: it was never activated, was
    /// already deactivated, or was disabled after failing during dispatch.
    #[error("instrument '{instrument}' ({id}) is not active")]
    NotActive {
        /// Name of the instrument.
        instrument: String,
        /// Identity of the instance.
        id: InstrumentId,
    },

    /// The instrument's override declaration failed; activation was rolled back.
    #[error("failed to classify hooks of instrument '{instrument}' ({id})")]
    Classification {
        /// Name of the instrument.
        instrument: String,
        /// Identity of the instance.
        id: InstrumentId,
        /// What went wrong inside the instrument.
        #[source]
        source: InstrumentError,
    },
}

/// A string that does not name any [`Hook`](crate::hooks::schedule::Hook).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hook '{0}'")]
pub struct UnknownHook(pub String);
