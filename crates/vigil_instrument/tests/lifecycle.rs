//! Activation, classification and deactivation as seen by a scheduler.

mod test_utils;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use test_utils::{CallLog, Recorder, ReentrantDeclaration};
use vigil_instrument::prelude::*;

struct StepWatcher {
    log: CallLog,
}

impl Instrument for StepWatcher {
    fn hooks(&self) -> Result<HookSet, InstrumentError> {
        Ok(HookSet::of::<BeforeTaskStep>())
    }

    fn name(&self) -> &str {
        "step_watcher"
    }

    fn before_task_step(&self, task: TaskRef<'_>) -> HookResult {
        self.log.push(self.name(), &HookEvent::BeforeTaskStep { task });
        Ok(())
    }
}

#[test]
fn end_to_end_single_instrument() {
    let log = CallLog::new();
    let instruments = Instruments::new();
    let watcher: Rc<dyn Instrument> = Rc::new(StepWatcher { log: log.clone() });

    instruments.activate(&watcher).unwrap();
    assert!(instruments.is_listening(Hook::BeforeTaskStep));
    assert!(!instruments.is_listening(Hook::AfterTaskStep));

    let task_x = TaskRef::new(TaskId::new(42), "x");
    instruments.dispatch(&HookEvent::BeforeTaskStep { task: task_x });

    let calls = log.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].hook, Hook::BeforeTaskStep);
    assert_eq!(calls[0].task, Some(TaskId::new(42)));

    instruments.deactivate(&watcher).unwrap();
    assert!(!instruments.is_listening(Hook::BeforeTaskStep));

    let err = instruments.deactivate(&watcher).unwrap_err();
    let id = InstrumentId::of(&watcher);
    assert!(matches!(err, InstrumentsError::NotActive { .. }));
    assert_eq!(
        err.to_string(),
        format!("instrument 'step_watcher' ({id}) is not active")
    );
}

#[test]
fn classification_indexes_exactly_the_declared_hooks() {
    let log = CallLog::new();
    let instruments = Instruments::new();
    let a_and_c = Recorder::shared("a_and_c", HookSet::of::<(BeforeRun, TaskSpawned)>(), &log);
    let only_b = Recorder::shared("only_b", HookSet::of::<AfterRun>(), &log);

    instruments.activate(&a_and_c).unwrap();
    assert!(instruments.is_listening(Hook::BeforeRun));
    assert!(!instruments.is_listening(Hook::AfterRun));
    assert!(instruments.is_listening(Hook::TaskSpawned));

    instruments.activate(&only_b).unwrap();
    assert_eq!(instruments.listener_count(Hook::AfterRun), 1);

    instruments.dispatch(&HookEvent::AfterRun);
    assert_eq!(log.receivers(Hook::AfterRun), vec!["only_b"]);
}

#[test]
fn undeclared_override_is_never_called() {
    struct Forgetful {
        log: CallLog,
    }

    impl Instrument for Forgetful {
        fn hooks(&self) -> Result<HookSet, InstrumentError> {
            Ok(HookSet::of::<AfterIoWait>())
        }

        fn before_io_wait(&self, timeout: Duration) -> HookResult {
            self.log.push("forgetful", &HookEvent::BeforeIoWait { timeout });
            Ok(())
        }
    }

    let log = CallLog::new();
    let instruments = Instruments::new();
    let forgetful: Rc<dyn Instrument> = Rc::new(Forgetful { log: log.clone() });
    instruments.activate(&forgetful).unwrap();

    assert!(!instruments.is_listening(Hook::BeforeIoWait));
    instruments.dispatch(&HookEvent::BeforeIoWait {
        timeout: Duration::from_millis(10),
    });
    assert!(log.calls().is_empty());
}

#[test]
fn panicking_declaration_aborts_activation() {
    struct Broken;

    impl Instrument for Broken {
        fn hooks(&self) -> Result<HookSet, InstrumentError> {
            panic!("malformed instrument")
        }
    }

    let instruments = Instruments::new();
    let broken: Rc<dyn Instrument> = Rc::new(Broken);

    let err = instruments.activate(&broken).unwrap_err();
    match err {
        InstrumentsError::Classification {
            instrument,
            source,
            ..
        } => {
            assert!(instrument.ends_with("Broken"));
            assert!(matches!(source, InstrumentError::Panicked(_)));
        }
        other => panic!("expected Classification, got {other:?}"),
    }
    assert!(instruments.is_empty());
    assert!(instruments.listening().is_empty());
}

#[test]
fn with_instruments_stops_at_first_failure() {
    struct Refuses;

    impl Instrument for Refuses {
        fn hooks(&self) -> Result<HookSet, InstrumentError> {
            Err(InstrumentError::failed("refused"))
        }
    }

    let log = CallLog::new();
    let incoming: Vec<Rc<dyn Instrument>> = vec![
        Recorder::shared("ok", HookSet::all(), &log),
        Rc::new(Refuses),
    ];

    let result = Instruments::with_instruments(incoming);
    assert!(matches!(
        result,
        Err(InstrumentsError::Classification { .. })
    ));
}

#[test]
fn declaration_that_deactivates_itself_leaves_nothing_indexed() {
    let table = Rc::new(Instruments::new());
    let slot: Rc<RefCell<Option<Rc<dyn Instrument>>>> = Rc::default();
    let slot_clone = Rc::clone(&slot);
    let fickle: Rc<dyn Instrument> = Rc::new(ReentrantDeclaration {
        name: "fickle".into(),
        hooks: HookSet::of::<(BeforeRun, TaskExited)>(),
        table: Rc::clone(&table),
        action: Box::new(move |table: &Instruments| {
            if let Some(me) = slot_clone.borrow_mut().take() {
                table.deactivate(&me).unwrap();
            }
        }),
    });
    *slot.borrow_mut() = Some(Rc::clone(&fickle));

    table.activate(&fickle).unwrap();

    assert!(!table.is_active(&fickle));
    assert!(table.is_empty());
    assert!(!table.is_listening(Hook::BeforeRun));
    assert!(!table.is_listening(Hook::TaskExited));
    assert!(matches!(
        table.deactivate(&fickle),
        Err(InstrumentsError::NotActive { .. })
    ));

    // The slot is empty now, so the next declaration keeps it active.
    table.activate(&fickle).unwrap();
    assert!(table.is_active(&fickle));
    assert_eq!(table.listening(), HookSet::of::<(BeforeRun, TaskExited)>());
}

#[test]
fn closure_instrument_receives_typed_arguments() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);

    let record = move |event: &HookEvent<'_>| -> HookResult {
        if let HookEvent::BeforeIoWait { timeout } | HookEvent::AfterIoWait { timeout } = *event {
            seen_clone.borrow_mut().push((event.hook(), timeout));
        }
        Ok(())
    };
    let io = InstrumentFn::new("io")
        .on::<(BeforeIoWait, AfterIoWait)>(record);
    let io: Rc<dyn Instrument> = Rc::new(io);

    let instruments = Instruments::new();
    instruments.activate(&io).unwrap();

    let timeout = Duration::from_millis(250);
    instruments.dispatch(&HookEvent::BeforeIoWait { timeout });
    instruments.dispatch(&HookEvent::AfterIoWait { timeout });

    assert_eq!(
        *seen.borrow(),
        vec![(Hook::BeforeIoWait, timeout), (Hook::AfterIoWait, timeout)]
    );
}

#[test]
fn every_hook_routes_to_its_own_method() {
    let log = CallLog::new();
    let instruments = Instruments::new();
    let everything = Recorder::shared("everything", HookSet::all(), &log);
    instruments.activate(&everything).unwrap();

    let task = TaskRef::new(TaskId::new(5), "t");
    let wait = Duration::from_secs(1);
    let events = [
        HookEvent::BeforeRun,
        HookEvent::TaskSpawned { task },
        HookEvent::TaskScheduled { task },
        HookEvent::BeforeTaskStep { task },
        HookEvent::AfterTaskStep { task },
        HookEvent::BeforeIoWait { timeout: wait },
        HookEvent::AfterIoWait { timeout: wait },
        HookEvent::TaskExited { task },
        HookEvent::AfterRun,
    ];
    for event in &events {
        assert!(instruments.is_listening(event.hook()));
        instruments.dispatch(event);
    }

    let hooks: Vec<Hook> = log.calls().into_iter().map(|call| call.hook).collect();
    let expected: Vec<Hook> = events.iter().map(HookEvent::hook).collect();
    assert_eq!(hooks, expected);
}
