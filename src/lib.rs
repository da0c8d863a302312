//! Instrument hooks for cooperative schedulers.
//!
//! See [`vigil_instrument`] for the instrument contract and the hook table.

pub use vigil_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vigil_internal::prelude::*;
}
