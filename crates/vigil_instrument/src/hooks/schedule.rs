//! Hook names and override declarations.
//!
//! The set of hooks is fixed by the scheduler: an instrument cannot invent new
//! ones, it can only pick which of these it wants to hear about. Each hook has
//! a [`Hook`] variant (used at runtime) and a zero-sized marker type (used to
//! declare overrides at compile time).
//!
//! # Declaring overrides
//!
//! ```
//! use vigil_instrument::hooks::schedule::{AfterTaskStep, BeforeTaskStep, Hook, HookSet};
//!
//! let hooks = HookSet::of::<(BeforeTaskStep, AfterTaskStep)>();
//! assert!(hooks.contains(Hook::BeforeTaskStep));
//! assert!(!hooks.contains(Hook::BeforeRun));
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use variadics_please::all_tuples;

use crate::error::UnknownHook;

// ─────────────────────────────────────────────────────────────────────────────
// Hook
// ─────────────────────────────────────────────────────────────────────────────

/// A lifecycle event point exposed by the scheduler.
///
/// Adding a variant is a breaking change for every instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    /// Called once at the start of a run.
    BeforeRun,
    /// Called once at the end of a run, after the last task exited.
    AfterRun,
    /// Called when a new task is spawned.
    TaskSpawned,
    /// Called when a task becomes runnable.
    TaskScheduled,
    /// Called right before a task is resumed.
    BeforeTaskStep,
    /// Called right after a task yields back to the scheduler.
    AfterTaskStep,
    /// Called when a task exits.
    TaskExited,
    /// Called before the scheduler blocks waiting for I/O.
    BeforeIoWait,
    /// Called after the scheduler returns from waiting for I/O.
    AfterIoWait,
}

impl Hook {
    /// Every hook, in declaration order.
    pub const ALL: [Hook; 9] = [
        Hook::BeforeRun,
        Hook::AfterRun,
        Hook::TaskSpawned,
        Hook::TaskScheduled,
        Hook::BeforeTaskStep,
        Hook::AfterTaskStep,
        Hook::TaskExited,
        Hook::BeforeIoWait,
        Hook::AfterIoWait,
    ];

    /// Returns the snake_case name of the hook, e.g. `"before_task_step"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Hook::BeforeRun => "before_run",
            Hook::AfterRun => "after_run",
            Hook::TaskSpawned => "task_spawned",
            Hook::TaskScheduled => "task_scheduled",
            Hook::BeforeTaskStep => "before_task_step",
            Hook::AfterTaskStep => "after_task_step",
            Hook::TaskExited => "task_exited",
            Hook::BeforeIoWait => "before_io_wait",
            Hook::AfterIoWait => "after_io_wait",
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| UnknownHook(s.to_owned()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookSet
// ─────────────────────────────────────────────────────────────────────────────

/// A set of [`Hook`]s, stored as a bitset.
///
/// This is what an instrument hands to the classifier to say which hooks it
/// overrides.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HookSet(u16);

impl HookSet {
    /// The empty set: an instrument that overrides nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every hook.
    #[must_use]
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Hook::ALL.len() {
            bits |= Hook::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Builds a set from one marker type or a tuple of marker types.
    #[must_use]
    pub fn of<S: IntoHookSet>() -> Self {
        S::hook_set()
    }

    /// Returns a copy of this set with `hook` added.
    #[must_use]
    pub const fn with(self, hook: Hook) -> Self {
        Self(self.0 | hook.bit())
    }

    /// Adds `hook` to the set. Returns `true` if it was not already present.
    pub fn insert(&mut self, hook: Hook) -> bool {
        let absent = !self.contains(hook);
        self.0 |= hook.bit();
        absent
    }

    /// Removes `hook` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, hook: Hook) -> bool {
        let present = self.contains(hook);
        self.0 &= !hook.bit();
        present
    }

    /// Returns `true` if `hook` is in the set.
    #[must_use]
    pub const fn contains(self, hook: Hook) -> bool {
        self.0 & hook.bit() != 0
    }

    /// Returns the number of hooks in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set contains no hooks.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the hooks in the set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Hook> {
        Hook::ALL.into_iter().filter(move |hook| self.contains(*hook))
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Hook::as_str)).finish()
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        iter.into_iter().fold(HookSet::empty(), HookSet::with)
    }
}

impl From<Hook> for HookSet {
    fn from(hook: Hook) -> Self {
        HookSet::empty().with(hook)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook markers
// ─────────────────────────────────────────────────────────────────────────────

/// Marker trait tying a zero-sized type to a [`Hook`].
pub trait HookMarker: 'static {
    /// The hook this marker stands for.
    const HOOK: Hook;
}

macro_rules! hook_markers {
    ($($(#[$meta:meta])* $marker:ident => $hook:ident;)*) => {
        $(
            $(#[$meta])*
            pub struct $marker;
            impl HookMarker for $marker {
                const HOOK: Hook = Hook::$hook;
            }
        )*
    };
}

hook_markers! {
    /// Marker for [`Hook::BeforeRun`].
    BeforeRun => BeforeRun;
    /// Marker for [`Hook::AfterRun`].
    AfterRun => AfterRun;
    /// Marker for [`Hook::TaskSpawned`].
    TaskSpawned => TaskSpawned;
    /// Marker for [`Hook::TaskScheduled`].
    TaskScheduled => TaskScheduled;
    /// Marker for [`Hook::BeforeTaskStep`].
    BeforeTaskStep => BeforeTaskStep;
    /// Marker for [`Hook::AfterTaskStep`].
    AfterTaskStep => AfterTaskStep;
    /// Marker for [`Hook::TaskExited`].
    TaskExited => TaskExited;
    /// Marker for [`Hook::BeforeIoWait`].
    BeforeIoWait => BeforeIoWait;
    /// Marker for [`Hook::AfterIoWait`].
    AfterIoWait => AfterIoWait;
}

// ─────────────────────────────────────────────────────────────────────────────
// IntoHookSet Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be turned into a [`HookSet`]: a single marker or a tuple of
/// markers.
pub trait IntoHookSet {
    /// Returns the hooks named by this type.
    fn hook_set() -> HookSet;
}

impl<S: HookMarker> IntoHookSet for S {
    fn hook_set() -> HookSet {
        HookSet::from(S::HOOK)
    }
}

macro_rules! impl_into_hook_set_for_tuple {
    ($($S:ident),*) => {
        impl<$($S: HookMarker),*> IntoHookSet for ($($S,)*) {
            fn hook_set() -> HookSet {
                HookSet::empty()$(.with($S::HOOK))*
            }
        }
    };
}

all_tuples!(impl_into_hook_set_for_tuple, 2, 9, S);
