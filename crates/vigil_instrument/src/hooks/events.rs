//! Typed arguments for each hook.
//!
//! Every dispatch carries exactly one [`HookEvent`]; its variant decides which
//! hook fires, so a hook and its arguments can never disagree.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use vigil_instrument::hooks::events::{HookEvent, TaskId, TaskRef};
//! use vigil_instrument::hooks::schedule::Hook;
//!
//! let task = TaskRef::new(TaskId::new(7), "fetch");
//! let event = HookEvent::BeforeTaskStep { task };
//! assert_eq!(event.hook(), Hook::BeforeTaskStep);
//!
//! let wait = HookEvent::BeforeIoWait { timeout: Duration::from_millis(5) };
//! assert_eq!(wait.hook(), Hook::BeforeIoWait);
//! ```

use core::fmt;
use core::time::Duration;

use super::schedule::Hook;

/// Scheduler-assigned identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

impl TaskId {
    /// Creates a task ID.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0)
    }
}

/// The scheduler's borrowed view of a task, as seen by instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef<'a> {
    /// The task's identifier.
    pub id: TaskId,
    /// Human-readable task name.
    pub name: &'a str,
}

impl<'a> TaskRef<'a> {
    /// Creates a task reference.
    #[must_use]
    pub const fn new(id: TaskId, name: &'a str) -> Self {
        Self { id, name }
    }
}

impl fmt::Display for TaskRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One occurrence of a hook, with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent<'a> {
    // ─────────────────────────────────────────────────────────────────────────
    // Run-Level Events
    // ─────────────────────────────────────────────────────────────────────────
    /// The run is about to start.
    BeforeRun,

    /// The run has finished.
    AfterRun,

    // ─────────────────────────────────────────────────────────────────────────
    // Task Events
    // ─────────────────────────────────────────────────────────────────────────
    /// A task was spawned.
    TaskSpawned {
        /// The new task.
        task: TaskRef<'a>,
    },

    /// A task became runnable.
    TaskScheduled {
        /// The runnable task.
        task: TaskRef<'a>,
    },

    /// A task is about to be resumed.
    BeforeTaskStep {
        /// The task being resumed.
        task: TaskRef<'a>,
    },

    /// A task yielded back to the scheduler.
    AfterTaskStep {
        /// The task that just ran.
        task: TaskRef<'a>,
    },

    /// A task exited.
    TaskExited {
        /// The finished task.
        task: TaskRef<'a>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // I/O Events
    // ─────────────────────────────────────────────────────────────────────────
    /// The scheduler is about to wait for I/O.
    BeforeIoWait {
        /// How long the scheduler is willing to block.
        timeout: Duration,
    },

    /// The scheduler returned from waiting for I/O.
    AfterIoWait {
        /// The timeout the wait was started with.
        timeout: Duration,
    },
}

impl<'a> HookEvent<'a> {
    /// Returns the hook this event fires.
    #[must_use]
    pub const fn hook(&self) -> Hook {
        match self {
            HookEvent::BeforeRun => Hook::BeforeRun,
            HookEvent::AfterRun => Hook::AfterRun,
            HookEvent::TaskSpawned { .. } => Hook::TaskSpawned,
            HookEvent::TaskScheduled { .. } => Hook::TaskScheduled,
            HookEvent::BeforeTaskStep { .. } => Hook::BeforeTaskStep,
            HookEvent::AfterTaskStep { .. } => Hook::AfterTaskStep,
            HookEvent::TaskExited { .. } => Hook::TaskExited,
            HookEvent::BeforeIoWait { .. } => Hook::BeforeIoWait,
            HookEvent::AfterIoWait { .. } => Hook::AfterIoWait,
        }
    }

    /// Returns the task this event is about, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskRef<'a>> {
        match self {
            HookEvent::TaskSpawned { task }
            | HookEvent::TaskScheduled { task }
            | HookEvent::BeforeTaskStep { task }
            | HookEvent::AfterTaskStep { task }
            | HookEvent::TaskExited { task } => Some(*task),
            HookEvent::BeforeRun
            | HookEvent::AfterRun
            | HookEvent::BeforeIoWait { .. }
            | HookEvent::AfterIoWait { .. } => None,
        }
    }
}
