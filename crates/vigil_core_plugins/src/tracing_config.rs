//! Tracing subscriber setup.
//!
//! [`TracingConfig`] installs the process-wide `tracing` subscriber that
//! receives instrument diagnostics (target `vigil::instrument`) along with
//! everything else the scheduler logs.
//!
//! # Example
//!
//! ```
//! use vigil_core_plugins::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! // Development: pretty output with debug level
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty)
//!     .init();
//!
//! // Production: JSON output, instrument records only at warn and above
//! let prod = TracingConfig::default()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("info,vigil::instrument=warn");
//! # let _ = prod;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from [`TracingConfig::try_init`].
#[derive(Debug, Error)]
pub enum TracingError {
    /// The environment filter string could not be parsed.
    #[error("invalid env filter '{filter}': {source}")]
    InvalidFilter {
        /// The rejected filter string.
        filter: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of the global `tracing` subscriber.
///
/// # Environment Filter
///
/// Use [`with_env_filter`](Self::with_env_filter) to set target-specific log
/// levels, e.g. `"info,vigil::instrument=debug"` to see activations.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "vigil=debug,my_scheduler=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a new `TracingConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured maximum level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured output format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Installs the global subscriber.
    ///
    /// An invalid env filter falls back to the configured level, and an
    /// already-installed subscriber is left in place.
    pub fn init(&self) {
        let env_filter = self
            .env_filter()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        // Ignore errors if already initialized
        self.install(env_filter).ok();
    }

    /// Installs the global subscriber, reporting every problem.
    pub fn try_init(&self) -> Result<(), TracingError> {
        let env_filter = self.env_filter()?;
        self.install(env_filter)?;
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        let Some(filter) = &self.env_filter else {
            return Ok(EnvFilter::new(self.level.as_str()));
        };
        EnvFilter::try_new(filter).map_err(|source| TracingError::InvalidFilter {
            filter: filter.clone(),
            source,
        })
    }

    fn install(&self, env_filter: EnvFilter) -> Result<(), tracing_subscriber::util::TryInitError> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()?,
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()?,
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()?,
        }

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            "tracing initialized"
        );
        Ok(())
    }
}
