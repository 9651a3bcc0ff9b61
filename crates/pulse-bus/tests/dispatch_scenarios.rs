//! End-to-end bus scenarios: multicast fan-out, unicast eviction,
//! once-subscriptions, and interned-symbol keys.

use std::cell::RefCell;
use std::rc::Rc;

use pulse_bus::{EventBus, SubscriptionMode};
use pulse_types::Symbol;

fn bus() -> EventBus<String> {
    let bus = EventBus::new();
    bus.set_error_sink(|_| {});
    bus
}

#[test]
fn three_handlers_all_observe_the_publish() {
    let bus = bus();
    let outputs: Rc<RefCell<Vec<i32>>> = Rc::default();

    for factor in 1..=3 {
        let outputs = Rc::clone(&outputs);
        bus.subscribe(
            "scale".to_string(),
            move |x: &mut i32| outputs.borrow_mut().push(*x * factor),
            format!("x{factor}"),
        );
    }

    let result = bus.publish(&"scale".to_string(), (10,));
    assert!(result.success);
    assert_eq!(result.successful, 3);
    assert_eq!(result.total_subscribers, 3);
    assert_eq!(result.failed, 0);
    assert_eq!(*outputs.borrow(), vec![10, 20, 30]);
}

#[test]
fn unicast_eviction_leaves_only_the_latest() {
    let bus = bus();
    let first_seen: Rc<RefCell<Vec<i32>>> = Rc::default();
    let second_seen: Rc<RefCell<Vec<i32>>> = Rc::default();

    let first = Rc::clone(&first_seen);
    bus.subscribe_unicast(
        "slot".to_string(),
        move |x: &mut i32| first.borrow_mut().push(*x),
        "h1",
    );
    let second = Rc::clone(&second_seen);
    bus.subscribe_unicast(
        "slot".to_string(),
        move |x: &mut i32| second.borrow_mut().push(*x),
        "h2",
    );

    let result = bus.publish_unicast(&"slot".to_string(), (5,));
    assert!(result.success);
    assert_eq!(result.total_subscribers, 1);
    assert_eq!(result.mode, SubscriptionMode::Unicast);
    assert!(first_seen.borrow().is_empty());
    assert_eq!(*second_seen.borrow(), vec![5]);
}

#[test]
fn once_handler_lifecycle_across_publishes() {
    let bus = bus();
    let always: Rc<RefCell<u32>> = Rc::default();
    let single: Rc<RefCell<u32>> = Rc::default();

    let a = Rc::clone(&always);
    bus.subscribe(
        "tick".to_string(),
        move |_: &mut u8| *a.borrow_mut() += 1,
        "persistent",
    );
    let s = Rc::clone(&single);
    bus.subscribe_once(
        "tick".to_string(),
        move |_: &mut u8| *s.borrow_mut() += 1,
        "one-shot",
    );

    assert_eq!(bus.subscriber_count(&"tick".to_string()), 2);
    bus.publish(&"tick".to_string(), (0_u8,));
    bus.publish(&"tick".to_string(), (0_u8,));
    bus.publish(&"tick".to_string(), (0_u8,));

    assert_eq!(*always.borrow(), 3);
    assert_eq!(*single.borrow(), 1);
    assert_eq!(bus.subscriber_count(&"tick".to_string()), 1);
}

#[test]
fn mixed_signatures_under_one_key() {
    let bus = bus();
    let int_hits: Rc<RefCell<u32>> = Rc::default();
    let pair_hits: Rc<RefCell<u32>> = Rc::default();

    let ints = Rc::clone(&int_hits);
    bus.subscribe(
        "poly".to_string(),
        move |_: &mut i32| *ints.borrow_mut() += 1,
        "unary int",
    );
    let pairs = Rc::clone(&pair_hits);
    bus.subscribe(
        "poly".to_string(),
        move |_: &mut i32, _: &mut String| *pairs.borrow_mut() += 1,
        "int+string",
    );

    let unary = bus.publish(&"poly".to_string(), (1,));
    assert_eq!(unary.successful, 1);
    assert_eq!(unary.failed, 1);
    assert!(unary.success);

    let binary = bus.publish(&"poly".to_string(), (1, "x".to_string()));
    assert_eq!(binary.successful, 1);
    assert_eq!(binary.failed, 1);

    assert_eq!(*int_hits.borrow(), 1);
    assert_eq!(*pair_hits.borrow(), 1);
}

#[test]
fn no_matching_signature_reports_expected_types() {
    let bus = bus();
    bus.subscribe("strict".to_string(), |_: &mut bool| {}, "bool only");

    let result = bus.publish(&"strict".to_string(), (1_i64,));
    assert!(!result.success);
    assert_eq!(result.failed, 1);
    assert_eq!(result.expected_types.len(), 1);
    assert!(result.expected_types[0].contains("bool"));
    assert!(result.published_types.contains("i64"));
    assert!(result.error_message.contains("failed"));
}

#[test]
fn symbol_keys_dispatch_like_strings() {
    let bus: EventBus<Symbol> = EventBus::new();
    bus.set_error_sink(|_| {});
    let hits: Rc<RefCell<Vec<String>>> = Rc::default();

    let log = Rc::clone(&hits);
    bus.subscribe(
        Symbol::new("editor/save"),
        move |path: &mut String| log.borrow_mut().push(path.clone()),
        "save handler",
    );

    // A separately interned symbol with the same text is the same key.
    let result = bus.publish(&Symbol::new("editor/save"), ("main.rs".to_string(),));
    assert!(result.success);
    assert_eq!(*hits.borrow(), vec!["main.rs".to_string()]);

    let miss = bus.publish(&Symbol::new("editor/open"), ("main.rs".to_string(),));
    assert!(!miss.success);
}

#[test]
fn consuming_handler_drains_payload_for_later_handlers() {
    let bus = bus();
    let consumed: Rc<RefCell<String>> = Rc::default();
    let leftover: Rc<RefCell<String>> = Rc::default();

    let c = Rc::clone(&consumed);
    bus.subscribe(
        "hand-off".to_string(),
        move |text: &mut String| *c.borrow_mut() = std::mem::take(text),
        "consumer",
    );
    let l = Rc::clone(&leftover);
    bus.subscribe(
        "hand-off".to_string(),
        move |text: &mut String| *l.borrow_mut() = text.clone(),
        "second",
    );

    let result = bus.publish(&"hand-off".to_string(), ("precious".to_string(),));
    assert_eq!(result.successful, 2, "both handlers still execute");
    assert_eq!(*consumed.borrow(), "precious");
    assert_eq!(*leftover.borrow(), "");
}

#[test]
fn wide_tuples_round_trip() {
    let bus = bus();
    let sum: Rc<RefCell<i64>> = Rc::default();

    let total = Rc::clone(&sum);
    bus.subscribe(
        "wide".to_string(),
        move |a: &mut i64,
              b: &mut i64,
              c: &mut i64,
              d: &mut i64,
              e: &mut i64,
              f: &mut i64,
              g: &mut i64,
              h: &mut i64,
              i: &mut i64| {
            *total.borrow_mut() = *a + *b + *c + *d + *e + *f + *g + *h + *i;
        },
        "nine-way sum",
    );

    let result = bus.publish(
        &"wide".to_string(),
        (1_i64, 2_i64, 3_i64, 4_i64, 5_i64, 6_i64, 7_i64, 8_i64, 9_i64),
    );
    assert!(result.success);
    assert_eq!(*sum.borrow(), 45);
}
