//! Lifecycle hooks exposed by a cooperative scheduler.
//!
//! The hook system is split in three parts:
//!
//! - **Schedule** ([`schedule`]): the fixed set of [`Hook`]s, their marker
//!   types, and [`HookSet`] for declaring overrides
//! - **Events** ([`events`]): [`HookEvent`], the typed arguments of one hook
//!   occurrence
//! - **API** ([`api`]): [`Instruments`], the per-run table that activates,
//!   deactivates and dispatches to instruments
//!
//! # Design Principles
//!
//! - Instruments run in activation order
//! - A hook nobody overrides costs one map lookup
//! - A failing instrument is disabled and logged, never propagated

pub mod api;
pub mod events;
pub mod schedule;

pub use api::{InstrumentId, Instruments};
pub use events::{HookEvent, TaskId, TaskRef};
pub use schedule::{Hook, HookSet, IntoHookSet};
