//! A toy cooperative scheduler instrumented with Vigil.
//!
//! Tasks are plain step counters run round-robin. Between rounds the scheduler
//! pretends to wait on I/O. Every lifecycle point fires the matching hook, and
//! every hook is guarded by [`Instruments::is_listening`] so an uninstrumented
//! run pays one map lookup per hook and nothing else.
//!
//! ```text
//! before_run
//! │  spawn ──▶ task_spawned, task_scheduled
//! │  ┌─────────────── round ───────────────┐
//! │  │ before_io_wait / after_io_wait      │
//! │  │ for each runnable task:             │
//! │  │   before_task_step                  │
//! │  │   step                              │
//! │  │   after_task_step                   │
//! │  │   task_exited | task_scheduled      │
//! │  └─────────────────────────────────────┘
//! after_run
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use vigil_instrument::Instruments;
use vigil_instrument::hooks::events::{HookEvent, TaskId, TaskRef};
use vigil_instrument::hooks::schedule::Hook;

struct Task {
    id: TaskId,
    name: String,
    remaining: usize,
}

impl Task {
    fn task_ref(&self) -> TaskRef<'_> {
        TaskRef::new(self.id, &self.name)
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Task steps executed.
    pub steps: usize,
    /// Scheduler rounds, each preceded by an I/O wait.
    pub rounds: usize,
    /// Tasks that ran to completion.
    pub exited: usize,
}

/// Round-robin scheduler that owns the instrument table for one run.
pub struct ToyScheduler {
    instruments: Instruments,
    run_queue: VecDeque<Task>,
    next_id: usize,
    io_timeout: Duration,
}

impl ToyScheduler {
    /// Creates a scheduler with the given instruments.
    #[must_use]
    pub fn new(instruments: Instruments) -> Self {
        Self {
            instruments,
            run_queue: VecDeque::new(),
            next_id: 0,
            io_timeout: Duration::from_millis(10),
        }
    }

    /// Sets the timeout reported to the I/O wait hooks.
    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// The instrument table of this run.
    #[must_use]
    pub fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    /// Spawns a task that needs `steps` steps to finish.
    pub fn spawn(&mut self, name: impl Into<String>, steps: usize) -> TaskId {
        let task = Task {
            id: TaskId::new(self.next_id),
            name: name.into(),
            remaining: steps,
        };
        self.next_id += 1;

        self.emit(Hook::TaskSpawned, || HookEvent::TaskSpawned {
            task: task.task_ref(),
        });
        self.emit(Hook::TaskScheduled, || HookEvent::TaskScheduled {
            task: task.task_ref(),
        });

        let id = task.id;
        self.run_queue.push_back(task);
        id
    }

    /// Runs every spawned task to completion.
    pub fn run(mut self) -> RunStats {
        let mut stats = RunStats::default();
        self.emit(Hook::BeforeRun, || HookEvent::BeforeRun);

        while !self.run_queue.is_empty() {
            stats.rounds += 1;
            let timeout = self.io_timeout;
            self.emit(Hook::BeforeIoWait, || HookEvent::BeforeIoWait { timeout });
            self.emit(Hook::AfterIoWait, || HookEvent::AfterIoWait { timeout });

            for _ in 0..self.run_queue.len() {
                let Some(mut task) = self.run_queue.pop_front() else {
                    break;
                };

                self.emit(Hook::BeforeTaskStep, || HookEvent::BeforeTaskStep {
                    task: task.task_ref(),
                });
                task.remaining = task.remaining.saturating_sub(1);
                stats.steps += 1;
                self.emit(Hook::AfterTaskStep, || HookEvent::AfterTaskStep {
                    task: task.task_ref(),
                });

                if task.remaining == 0 {
                    stats.exited += 1;
                    self.emit(Hook::TaskExited, || HookEvent::TaskExited {
                        task: task.task_ref(),
                    });
                } else {
                    self.emit(Hook::TaskScheduled, || HookEvent::TaskScheduled {
                        task: task.task_ref(),
                    });
                    self.run_queue.push_back(task);
                }
            }
        }

        self.emit(Hook::AfterRun, || HookEvent::AfterRun);
        stats
    }

    /// Builds and dispatches the event only if someone listens to `hook`.
    fn emit<'a>(&self, hook: Hook, event: impl FnOnce() -> HookEvent<'a>) {
        if self.instruments.is_listening(hook) {
            self.instruments.dispatch(&event());
        }
    }
}
