//! The store's notification contract, end to end.

use std::cell::RefCell;
use std::rc::Rc;

use forma_store::{BoxError, ChangeEvent, PathStore};
use serde_json::json;

type Log = Rc<RefCell<Vec<ChangeEvent>>>;

fn recorder(log: Log) -> impl FnMut(&ChangeEvent) -> Result<(), BoxError> {
    move |ev| {
        log.borrow_mut().push(ev.clone());
        Ok(())
    }
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn exact_path_notification_with_noop_suppression() {
    let store = PathStore::new(json!({"x": 1}));
    let events = log();
    store.subscribe("x", recorder(events.clone())).unwrap();

    // Writing the same scalar notifies nobody.
    store.set("x", json!(1)).unwrap();
    assert!(events.borrow().is_empty());

    // A real change notifies exactly once.
    store.set("x", json!(2)).unwrap();
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].before, Some(json!(1)));
    assert_eq!(events[0].after, Some(json!(2)));
}

#[test]
fn ancestor_subscriptions_fire_and_siblings_do_not() {
    let store = PathStore::new(json!({"a": {"b": {"c": 1, "d": 2}}}));
    let on_a = log();
    let on_ab = log();
    let on_abd = log();
    store.subscribe("a", recorder(on_a.clone())).unwrap();
    store.subscribe("a.b", recorder(on_ab.clone())).unwrap();
    store.subscribe("a.b.d", recorder(on_abd.clone())).unwrap();

    store.set("a.b.c", json!(9)).unwrap();

    assert_eq!(on_a.borrow().len(), 1);
    assert_eq!(on_ab.borrow().len(), 1);
    assert!(on_abd.borrow().is_empty());

    // Ancestor events carry the subscriber's own old and new subtree.
    assert_eq!(on_ab.borrow()[0].before, Some(json!({"c": 1, "d": 2})));
    assert_eq!(on_ab.borrow()[0].after, Some(json!({"c": 9, "d": 2})));
}

#[test]
fn length_subscription_ignores_content_and_sees_count() {
    let store = PathStore::new(json!({
        "todos": [{"completed": false}, {"completed": false}]
    }));
    let events = log();
    store
        .subscribe("todos.length", recorder(events.clone()))
        .unwrap();

    // Element content mutation: count unchanged, no notification.
    store.set("todos.0.completed", json!(true)).unwrap();
    assert!(events.borrow().is_empty());

    // Growing the array notifies exactly once with the counts.
    store
        .set(
            "todos",
            json!([
                {"completed": true},
                {"completed": false},
                {"completed": false}
            ]),
        )
        .unwrap();
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].before, Some(json!(2)));
    assert_eq!(events[0].after, Some(json!(3)));
}

#[test]
fn batch_notifies_each_subscriber_at_most_once() {
    let store = PathStore::new(json!({"x": 0, "y": 0}));
    let on_x = log();
    let on_y = log();
    store.subscribe("x", recorder(on_x.clone())).unwrap();
    store.subscribe("y", recorder(on_y.clone())).unwrap();

    store
        .set_batch(vec![("x", json!(1)), ("y", json!(2))])
        .unwrap();

    assert_eq!(on_x.borrow().len(), 1);
    assert_eq!(on_y.borrow().len(), 1);
}

#[test]
fn batch_coalesces_overlapping_writes_for_one_subscriber() {
    let store = PathStore::new(json!({"a": {"b": 0, "c": 0}}));
    let on_a = log();
    store.subscribe("a", recorder(on_a.clone())).unwrap();

    store
        .set_batch(vec![("a.b", json!(1)), ("a.c", json!(2))])
        .unwrap();

    // Two writes under the same ancestor, one notification.
    assert_eq!(on_a.borrow().len(), 1);
    // The subscriber sees the fully applied batch, never a partial state.
    assert_eq!(on_a.borrow()[0].after, Some(json!({"b": 1, "c": 2})));
}

#[test]
fn index_subscriptions_are_path_identity_based() {
    let store = PathStore::new(json!({"items": ["A", "B", "C"]}));
    let events = log();
    store.subscribe("items.0", recorder(events.clone())).unwrap();

    // Reordering the array re-evaluates the same index against new content.
    store.set("items", json!(["B", "A", "C"])).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].before, Some(json!("A")));
    assert_eq!(events[0].after, Some(json!("B")));
    assert_eq!(store.get("items.0").unwrap(), Some(json!("B")));
}

#[test]
fn unsubscribe_is_idempotent_and_scoped() {
    let store = PathStore::new(json!({"x": 0}));
    let first = log();
    let second = log();
    let id_first = store.subscribe("x", recorder(first.clone())).unwrap();
    store.subscribe("x", recorder(second.clone())).unwrap();

    assert!(store.unsubscribe(id_first));
    assert!(!store.unsubscribe(id_first));

    // Double-unsubscribing the first registration must not evict the second.
    store.set("x", json!(1)).unwrap();
    assert!(first.borrow().is_empty());
    assert_eq!(second.borrow().len(), 1);
    assert_eq!(store.subscription_count(), 1);
}

#[test]
fn set_then_get_round_trips() {
    let store = PathStore::new(json!({}));
    let value = json!({"name": "Ada", "tags": ["a", "b"], "meta": {"n": 3}});
    store.set("user.profile", value.clone()).unwrap();
    assert_eq!(store.get("user.profile").unwrap(), Some(value));
    assert_eq!(store.get("user.profile.tags.1").unwrap(), Some(json!("b")));
}

#[test]
fn reset_restores_baseline_and_fires_only_changed() {
    let store = PathStore::new(json!({"x": 1, "y": 1}));
    store.set("x", json!(2)).unwrap();

    let on_x = log();
    let on_y = log();
    store.subscribe("x", recorder(on_x.clone())).unwrap();
    store.subscribe("y", recorder(on_y.clone())).unwrap();

    store.reset_all();

    assert_eq!(store.get("x").unwrap(), Some(json!(1)));
    assert_eq!(on_x.borrow().len(), 1);
    assert_eq!(on_x.borrow()[0].before, Some(json!(2)));
    assert_eq!(on_x.borrow()[0].after, Some(json!(1)));
    // y never deviated from the baseline, so it stays quiet.
    assert!(on_y.borrow().is_empty());
}

#[test]
fn reset_of_subtree_leaves_rest_alone() {
    let store = PathStore::new(json!({"form": {"name": ""}, "draft": ""}));
    store.set("form.name", json!("Ada")).unwrap();
    store.set("draft", json!("keep me")).unwrap();

    store.reset("form").unwrap();

    assert_eq!(store.get("form.name").unwrap(), Some(json!("")));
    assert_eq!(store.get("draft").unwrap(), Some(json!("keep me")));
}

#[test]
fn two_subscriptions_on_one_path_fire_in_registration_order() {
    let store = PathStore::new(json!({"x": 0}));
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = order.clone();
    store
        .subscribe("x", move |_ev| {
            o.borrow_mut().push("first");
            Ok(())
        })
        .unwrap();
    let o = order.clone();
    store
        .subscribe("x", move |_ev| {
            o.borrow_mut().push("second");
            Ok(())
        })
        .unwrap();

    store.set("x", json!(1)).unwrap();
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}
