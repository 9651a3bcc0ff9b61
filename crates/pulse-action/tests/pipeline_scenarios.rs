//! End-to-end pipeline scenarios: rejection flow, overload routing,
//! global completion, and interned-symbol keys shared with the bus.

use std::cell::RefCell;
use std::rc::Rc;

use pulse_action::{ActionPipeline, ActionResult, ProcessError};
use pulse_bus::EventBus;
use pulse_types::Symbol;

fn pipeline() -> ActionPipeline<String> {
    let pipeline = ActionPipeline::new();
    pipeline.set_error_sink(|_| {});
    pipeline
}

#[test]
fn rejected_execution_runs_nothing_downstream() {
    let pipeline = pipeline();
    let flag: Rc<RefCell<bool>> = Rc::default();
    let completions: Rc<RefCell<u32>> = Rc::default();
    let validation_listens: Rc<RefCell<u32>> = Rc::default();

    pipeline
        .add_validator("gate".to_string(), |_: &mut i32| false, "always reject", 0)
        .unwrap();
    let set = Rc::clone(&flag);
    pipeline
        .add_sequential_processor(
            "gate".to_string(),
            move |_: &mut i32| {
                *set.borrow_mut() = true;
                Ok(())
            },
            "flag setter",
            0,
        )
        .unwrap();
    let vl = Rc::clone(&validation_listens);
    pipeline
        .add_validation_listener(
            "gate".to_string(),
            move |_: &mut i32| *vl.borrow_mut() += 1,
            "",
            0,
        )
        .unwrap();
    let done = Rc::clone(&completions);
    pipeline
        .add_completion_listener(
            "gate".to_string(),
            move |_: &mut i32| *done.borrow_mut() += 1,
            "",
            0,
        )
        .unwrap();

    let result = pipeline.execute(&"gate".to_string(), (1,));
    assert!(!result.success);
    assert!(!result.validation_passed);
    assert_eq!(result.executed_processors, 0);
    assert_eq!(result.total_validators, 1);
    assert_eq!(result.passed_validators, 0);
    assert!(!*flag.borrow());
    assert_eq!(*validation_listens.borrow(), 0);
    assert_eq!(*completions.borrow(), 0);
}

#[test]
fn overload_routing_by_argument_types() {
    let pipeline: ActionPipeline<String> = ActionPipeline::with_overloads();
    pipeline.set_error_sink(|_| {});
    let int_seen: Rc<RefCell<Option<i32>>> = Rc::default();
    let string_seen: Rc<RefCell<Option<String>>> = Rc::default();

    let ints = Rc::clone(&int_seen);
    pipeline
        .add_sequential_processor(
            "k".to_string(),
            move |v: &mut i32| {
                *ints.borrow_mut() = Some(*v);
                Ok(())
            },
            "int overload",
            0,
        )
        .unwrap();
    let strings = Rc::clone(&string_seen);
    pipeline
        .add_sequential_processor(
            "k".to_string(),
            move |v: &mut String| {
                *strings.borrow_mut() = Some(v.clone());
                Ok(())
            },
            "string overload",
            0,
        )
        .unwrap();

    assert!(pipeline.execute(&"k".to_string(), (42,)).success);
    assert_eq!(*int_seen.borrow(), Some(42));
    assert!(string_seen.borrow().is_none());

    assert!(pipeline
        .execute(&"k".to_string(), ("hi".to_string(),))
        .success);
    assert_eq!(string_seen.borrow().as_deref(), Some("hi"));

    let miss = pipeline.execute(&"k".to_string(), (3.14_f64,));
    assert!(!miss.success);
    assert!(miss.error_message.contains("no matching parameter types"));
}

#[test]
fn global_listener_observes_failures_too() {
    let pipeline = pipeline();
    let log: Rc<RefCell<Vec<(String, bool, String)>>> = Rc::default();

    let sink = Rc::clone(&log);
    pipeline.add_global_completion_listener(
        move |key: &String, result: &ActionResult| {
            sink.borrow_mut()
                .push((key.clone(), result.success, result.error_message.clone()));
        },
        "audit trail",
        0,
    );

    pipeline.execute(&"unknown".to_string(), (1,));
    pipeline
        .add_sequential_processor("known".to_string(), |_: &mut i32| Ok(()), "", 0)
        .unwrap();
    pipeline.execute(&"known".to_string(), (1,));

    let entries = log.borrow();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "unknown");
    assert!(!entries[0].1);
    assert!(entries[0].2.contains("not found"));
    assert_eq!(entries[1].0, "known");
    assert!(entries[1].1);
}

#[test]
fn multi_argument_business_flow() {
    let pipeline = pipeline();
    let journal: Rc<RefCell<Vec<String>>> = Rc::default();

    let log = Rc::clone(&journal);
    pipeline
        .add_trigger_listener(
            "transfer".to_string(),
            move |user: &mut String, amount: &mut i32| {
                log.borrow_mut().push(format!("attempt {user} {amount}"));
            },
            "journal",
            0,
        )
        .unwrap();
    pipeline
        .add_validator(
            "transfer".to_string(),
            |user: &mut String, amount: &mut i32| !user.is_empty() && *amount > 0,
            "well-formed",
            0,
        )
        .unwrap();
    pipeline
        .add_validator(
            "transfer".to_string(),
            |_: &mut String, amount: &mut i32| *amount <= 10_000,
            "limit",
            1,
        )
        .unwrap();
    pipeline
        .add_sequential_processor(
            "transfer".to_string(),
            |_: &mut String, _: &mut i32| Ok(()),
            "debit",
            0,
        )
        .unwrap();
    let done = Rc::clone(&journal);
    pipeline
        .add_completion_listener(
            "transfer".to_string(),
            move |user: &mut String, amount: &mut i32| {
                done.borrow_mut().push(format!("done {user} {amount}"));
            },
            "confirmation",
            0,
        )
        .unwrap();

    let ok = pipeline.execute(&"transfer".to_string(), ("alice".to_string(), 5_000));
    assert!(ok.success);
    assert_eq!(ok.passed_validators, 2);

    let over = pipeline.execute(&"transfer".to_string(), ("bob".to_string(), 15_000));
    assert!(!over.success);
    assert!(!over.validation_passed);
    assert!(over.error_message.contains("limit"));

    let entries = journal.borrow();
    assert_eq!(
        *entries,
        vec![
            "attempt alice 5000".to_string(),
            "done alice 5000".to_string(),
            "attempt bob 15000".to_string(),
        ]
    );
}

#[test]
fn processor_failure_accounting_is_symmetric() {
    let pipeline = pipeline();
    pipeline
        .add_sequential_processor("steps".to_string(), |_: &mut i32| Ok(()), "one", 0)
        .unwrap();
    pipeline
        .add_sequential_processor(
            "steps".to_string(),
            |_: &mut i32| Err(ProcessError::new("step two failed")),
            "two",
            1,
        )
        .unwrap();
    pipeline
        .add_sequential_processor("steps".to_string(), |_: &mut i32| Ok(()), "three", 2)
        .unwrap();
    pipeline
        .set_final_processor("steps".to_string(), |_: &mut i32| Ok(()), "final", 0)
        .unwrap();

    let result = pipeline.execute(&"steps".to_string(), (1,));
    assert!(!result.success);
    assert_eq!(result.total_processors, 4, "3 sequential + 1 final");
    assert_eq!(result.executed_processors, 1);
    assert!(result.error_message.contains("step two failed"));
}

#[test]
fn symbol_keys_work_across_bus_and_pipeline() {
    // Interned symbols as the shared action/event vocabulary of an
    // editor runtime.
    let save = Symbol::new("file/save");

    let bus: EventBus<Symbol> = EventBus::new();
    bus.set_error_sink(|_| {});
    let pipeline: ActionPipeline<Symbol> = ActionPipeline::new();
    pipeline.set_error_sink(|_| {});

    let saved_paths: Rc<RefCell<Vec<String>>> = Rc::default();

    let log = Rc::clone(&saved_paths);
    pipeline
        .add_sequential_processor(
            save,
            move |file: &mut String| {
                log.borrow_mut().push(file.clone());
                Ok(())
            },
            "write to disk",
            0,
        )
        .unwrap();

    let announced: Rc<RefCell<u32>> = Rc::default();
    let count = Rc::clone(&announced);
    bus.subscribe(
        save,
        move |_: &mut String| *count.borrow_mut() += 1,
        "status bar",
    );

    let result = pipeline.execute(&save, ("buffer.txt".to_string(),));
    assert!(result.success);
    bus.publish(&save, ("buffer.txt".to_string(),));

    assert_eq!(*saved_paths.borrow(), vec!["buffer.txt".to_string()]);
    assert_eq!(*announced.borrow(), 1);
    assert_eq!(Symbol::new("file/save"), save);
}
