//! Toy scheduler demo.
//!
//! Runs a handful of tasks with three instruments installed:
//!
//! - a [`LoggingInstrument`] configured from JSON
//! - a step profiler counting steps per task
//! - a flaky instrument that fails on its third call and gets disabled
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug toy-scheduler
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use example::ToyScheduler;
use tracing::Level;
use vigil_core_plugins::{LoggingInstrument, LoggingInstrumentConfig, TracingConfig, TracingFormat};
use vigil_instrument::hooks::events::TaskRef;
use vigil_instrument::hooks::schedule::{AfterTaskStep, BeforeTaskStep, HookSet};
use vigil_instrument::{HookResult, Instrument, InstrumentError, Instruments};

const LOGGER_CONFIG: &str = r#"{
    "hooks": ["before_run", "task_spawned", "task_exited", "after_run"],
    "level": "info"
}"#;

/// Counts steps per task.
#[derive(Default)]
struct StepProfiler {
    steps: RefCell<BTreeMap<String, usize>>,
}

impl Instrument for StepProfiler {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(HookSet::of::<AfterTaskStep>())
    }

    fn name(&self) -> &str {
        "step_profiler"
    }

    fn after_task_step(&self, task: TaskRef<'_>) -> HookResult {
        *self
            .steps
            .borrow_mut()
            .entry(task.name.to_owned())
            .or_default() += 1;
        Ok(())
    }
}

/// Fails on its third call.
#[derive(Default)]
struct Flaky {
    calls: RefCell<usize>,
}

impl Instrument for Flaky {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(HookSet::of::<BeforeTaskStep>())
    }

    fn name(&self) -> &str {
        "flaky"
    }

    fn before_task_step(&self, task: TaskRef<'_>) -> HookResult {
        let mut calls = self.calls.borrow_mut();
        *calls += 1;
        if *calls == 3 {
            return Err(InstrumentError::failed(format!("lost track of {task}")));
        }
        Ok(())
    }
}

fn main() {
    TracingConfig::default()
        .with_level(Level::INFO)
        .with_format(TracingFormat::Compact)
        .init();

    let config: LoggingInstrumentConfig = match serde_json::from_str(LOGGER_CONFIG) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid logger configuration");
            std::process::exit(1);
        }
    };

    let profiler = Rc::new(StepProfiler::default());
    let incoming: Vec<Rc<dyn Instrument>> = vec![
        Rc::new(LoggingInstrument::from_config("lifecycle", config)),
        Rc::clone(&profiler) as Rc<dyn Instrument>,
        Rc::new(Flaky::default()),
    ];
    let instruments = match Instruments::with_instruments(incoming) {
        Ok(instruments) => instruments,
        Err(error) => {
            tracing::error!(%error, "failed to activate instruments");
            std::process::exit(1);
        }
    };

    let mut scheduler = ToyScheduler::new(instruments);
    scheduler.spawn("fetch", 3);
    scheduler.spawn("parse", 2);
    scheduler.spawn("store", 1);
    tracing::info!(instruments = ?scheduler.instruments(), "starting run");

    let stats = scheduler.run();

    tracing::info!(
        steps = stats.steps,
        rounds = stats.rounds,
        exited = stats.exited,
        "run finished"
    );
    for (task, steps) in profiler.steps.borrow().iter() {
        tracing::info!(task = %task, steps, "profile");
    }
}
