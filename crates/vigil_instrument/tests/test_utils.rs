//! Shared test utilities for `vigil_instrument` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use vigil_instrument::hooks::api::LOG_TARGET;
use vigil_instrument::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// CALL LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// One delivered hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub instrument: String,
    pub hook: Hook,
    pub task: Option<TaskId>,
}

/// Shared, ordered log of hook calls across instruments.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, instrument: &str, event: &HookEvent<'_>) {
        self.0.borrow_mut().push(Call {
            instrument: instrument.to_owned(),
            hook: event.hook(),
            task: event.task().map(|task| task.id),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Names of the instruments that received `hook`, in delivery order.
    pub fn receivers(&self, hook: Hook) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|call| call.hook == hook)
            .map(|call| call.instrument.clone())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTRUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Records every event it receives and never fails.
pub struct Recorder {
    pub name: String,
    pub hooks: HookSet,
    pub log: CallLog,
}

impl Recorder {
    pub fn shared(name: &str, hooks: HookSet, log: &CallLog) -> Rc<dyn Instrument> {
        Rc::new(Self {
            name: name.to_owned(),
            hooks,
            log: log.clone(),
        })
    }
}

impl Instrument for Recorder {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(self.hooks)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        self.log.push(&self.name, event);
        Ok(())
    }
}

/// How a [`Faulty`] instrument misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Error,
    Panic,
}

/// Records the event, then fails.
pub struct Faulty {
    pub name: String,
    pub hooks: HookSet,
    pub fault: Fault,
    pub log: CallLog,
}

impl Faulty {
    pub fn shared(name: &str, hooks: HookSet, fault: Fault, log: &CallLog) -> Rc<dyn Instrument> {
        Rc::new(Self {
            name: name.to_owned(),
            hooks,
            fault,
            log: log.clone(),
        })
    }
}

impl Instrument for Faulty {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(self.hooks)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        self.log.push(&self.name, event);
        match self.fault {
            Fault::Error => Err(InstrumentError::failed(format!("{} failed", self.name))),
            Fault::Panic => panic!("{} panicked", self.name),
        }
    }
}

/// Runs `action` against the table from inside its own hook.
pub struct Reentrant {
    pub name: String,
    pub hooks: HookSet,
    pub table: Rc<Instruments>,
    pub log: CallLog,
    pub action: Box<dyn Fn(&Instruments)>,
}

impl Instrument for Reentrant {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(self.hooks)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &HookEvent<'_>) -> HookResult {
        self.log.push(&self.name, event);
        (self.action)(&self.table);
        Ok(())
    }
}

/// Runs `action` against the table while declaring its hooks.
pub struct ReentrantDeclaration {
    pub name: String,
    pub hooks: HookSet,
    pub table: Rc<Instruments>,
    pub action: Box<dyn Fn(&Instruments)>,
}

impl Instrument for ReentrantDeclaration {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        (self.action)(&self.table);
        Ok(self.hooks)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn step(id: usize) -> HookEvent<'static> {
    HookEvent::BeforeTaskStep {
        task: TaskRef::new(TaskId::new(id), "worker"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CAPTURE
// ═══════════════════════════════════════════════════════════════════════════════

/// An error-level record emitted on the instrument log target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub hook: String,
    pub instrument: String,
    pub instrument_id: String,
    pub error: String,
    pub message: String,
}

impl Visit for Diagnostic {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field.name(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field.name(), format!("{value:?}"));
    }
}

impl Diagnostic {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "hook" => self.hook = value,
            "instrument" => self.instrument = value,
            "instrument_id" => self.instrument_id = value,
            "error" => self.error = value,
            "message" => self.message = value,
            _ => {}
        }
    }
}

/// Layer collecting every [`Diagnostic`] on `vigil::instrument`.
#[derive(Clone, Default)]
pub struct DiagnosticCapture {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticCapture {
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() != LOG_TARGET || *meta.level() != Level::ERROR {
            return;
        }
        let mut record = Diagnostic::default();
        event.record(&mut record);
        self.records.lock().unwrap().push(record);
    }
}

/// Runs `f` with a subscriber that captures instrument diagnostics.
pub fn capture_diagnostics<R>(f: impl FnOnce() -> R) -> (R, Vec<Diagnostic>) {
    let capture = DiagnosticCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture.records())
}
