//! # Vigil Internal Library
//!
//! Re-exports the core Vigil crates for convenience.

/// Instrument contract and hook dispatch table.
pub use vigil_instrument;

/// Tracing setup and the logging instrument.
pub use vigil_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use vigil_core_plugins::{
        LogLevel, LoggingInstrument, LoggingInstrumentConfig, TracingConfig, TracingFormat,
    };
    pub use vigil_instrument::prelude::*;
}
