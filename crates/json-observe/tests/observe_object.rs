mod common;

use common::Recorder;
use json_observe::{
    Config, ExcludeProperty, Graph, Observable, ObserveOptions, ParentLink, Value,
};
use serde_json::json;

fn graph() -> Graph {
    common::init_tracing();
    Graph::new(
        Config::default()
            .with_splice(true)
            .with_exclude(ExcludeProperty::prefix("_")),
    )
}

/// `x = {a: {b: 1}}` observed, recorder attached, `tmp = x.a` read once.
fn fixture() -> (Graph, Observable, Recorder, Observable) {
    let mut g = graph();
    let x = g
        .observe_json(&json!({"a": {"b": 1}}), ObserveOptions::default())
        .unwrap();
    let cb = Recorder::attach(&mut g, x);
    let tmp = g.get_observable(x, "a").unwrap();
    (g, x, cb, tmp)
}

#[test]
fn set_object_property() {
    let (mut g, x, cb, tmp) = fixture();
    assert_eq!(g.handler(tmp).parents(), &[ParentLink::new(x.handler_id(), "a")]);

    let v = g.alloc(&json!({"c": 2}));
    g.set(x, "a", v).unwrap();

    assert!(g.handler(tmp).parents().is_empty());
    assert_eq!(g.to_json(x), json!({"a": {"c": 2}}));
    assert_eq!(cb.count(), 1);
    assert_eq!(cb.call(0), json!({"op": "add", "path": "/a", "value": {"c": 2}}));
}

#[test]
fn delete_object_property() {
    let (mut g, x, cb, tmp) = fixture();
    g.delete(x, "a").unwrap();

    assert!(g.handler(tmp).parents().is_empty());
    assert_eq!(g.to_json(x), json!({}));
    assert_eq!(cb.calls(), vec![json!({"op": "remove", "path": "/a"})]);
}

#[test]
fn nested_write_reports_full_path() {
    let (mut g, x, cb, tmp) = fixture();
    g.set(tmp, "b", 5.into()).unwrap();
    assert_eq!(cb.calls(), vec![json!({"op": "add", "path": "/a/b", "value": 5})]);
    assert_eq!(g.to_json(x), json!({"a": {"b": 5}}));
}

#[test]
fn shared_object_reference() {
    let (mut g, _, cb, _) = fixture();
    let y = g.observe_json(&json!({}), ObserveOptions::default()).unwrap();
    g.subscribe(y, cb.subscriber.clone());

    // y.a = y.b = y._c = {d: 1}, assigned right to left.
    let shared = g.alloc(&json!({"d": 1}));
    g.set(y, "_c", shared.clone()).unwrap();
    g.set(y, "b", shared.clone()).unwrap();
    g.set(y, "a", shared).unwrap();
    assert_eq!(cb.call(0), json!({"op": "add", "path": "/b", "value": {"d": 1}}));
    assert_eq!(cb.call(1), json!({"op": "add", "path": "/a", "value": {"d": 1}}));

    let a = g.get_observable(y, "a").unwrap();
    g.set(a, "d", 2.into()).unwrap();
    assert_eq!(cb.call(2), json!({"op": "add", "path": "/b/d", "value": 2}));
    assert_eq!(cb.call(3), json!({"op": "add", "path": "/a/d", "value": 2}));
    assert_eq!(cb.count(), 4);

    let t = g.alloc(&json!({"c": 1}));
    let holder_a = g.object_from([("d", t.clone())]);
    g.set(y, "a", Value::Node(holder_a)).unwrap();
    assert_eq!(cb.call(4), json!({"op": "add", "path": "/a", "value": {"d": {"c": 1}}}));
    let holder_b = g.object_from([("d", t.clone())]);
    g.set(y, "b", Value::Node(holder_b)).unwrap();
    assert_eq!(cb.call(5), json!({"op": "add", "path": "/b", "value": {"d": {"c": 1}}}));

    let holder_c = g.object_from([("d", t)]);
    g.set(y, "_c", Value::Node(holder_c)).unwrap();
    let c = g.get_observable(y, "_c").unwrap();
    let d = g.get_observable(c, "d").unwrap();
    g.set(d, "c", 3.into()).unwrap();
    assert_eq!(cb.call(6), json!({"op": "add", "path": "/a/d/c", "value": 3}));
    assert_eq!(cb.call(7), json!({"op": "add", "path": "/b/d/c", "value": 3}));
    assert_eq!(cb.count(), 8);
}

#[test]
fn replaced_shared_object_keeps_remaining_link() {
    let mut g = graph();
    let y = g.observe_json(&json!({}), ObserveOptions::default()).unwrap();
    let cb = Recorder::attach(&mut g, y);
    let shared = g.alloc(&json!({"d": 1}));
    g.set(y, "a", shared.clone()).unwrap();
    g.set(y, "b", shared.clone()).unwrap();
    g.set(y, "a", Value::Null).unwrap();
    cb.clear();

    let s = g.observable(shared.as_node().unwrap()).unwrap();
    assert_eq!(g.handler(s).parents(), &[ParentLink::new(y.handler_id(), "b")]);
    g.set(s, "d", 7.into()).unwrap();
    assert_eq!(cb.calls(), vec![json!({"op": "add", "path": "/b/d", "value": 7})]);
}

#[test]
fn observe_is_idempotent() {
    let (mut g, x, _, tmp) = fixture();
    assert_eq!(g.observe(x.node(), ObserveOptions::default()).unwrap(), x);
    assert_eq!(g.observe(tmp.node(), ObserveOptions::deep()).unwrap(), tmp);
    assert_eq!(g.handler(tmp).parents().len(), 1);
}

#[test]
fn deep_observe_links_existing_children() {
    let mut g = graph();
    let root = g
        .observe_json(&json!({"a": {"n": 1}, "_hidden": {"n": 2}}), ObserveOptions::deep())
        .unwrap();
    let cb = Recorder::attach(&mut g, root);

    let a_id = g.get(root, "a").unwrap().unwrap().as_node().unwrap();
    let a = g.observable(a_id).unwrap();
    assert_eq!(g.handler(a).parents(), &[ParentLink::new(root.handler_id(), "a")]);

    let hidden = g.get_observable(root, "_hidden").unwrap();
    assert!(g.handler(hidden).parents().is_empty());
    g.set(hidden, "n", 3.into()).unwrap();
    assert_eq!(cb.count(), 0);
}

#[test]
fn assigning_container_wraps_children_for_nested_writes() {
    let mut g = graph();
    let root = g.observe_json(&json!({}), ObserveOptions::default()).unwrap();
    let cb = Recorder::attach(&mut g, root);
    let v = g.alloc(&json!({"inner": {"leaf": 1}}));
    g.set(root, "outer", v).unwrap();

    let outer = g.get_observable(root, "outer").unwrap();
    let inner = g.get_observable(outer, "inner").unwrap();
    g.delete(inner, "leaf").unwrap();
    assert_eq!(cb.call(1), json!({"op": "remove", "path": "/outer/inner/leaf"}));
}

#[test]
fn unsubscribe_stops_delivery() {
    let (mut g, x, cb, _) = fixture();
    assert!(g.unsubscribe(x, &cb.subscriber));
    g.set(x, "z", true.into()).unwrap();
    assert_eq!(cb.count(), 0);
    assert!(!g.unsubscribe(x, &cb.subscriber));
}

#[test]
fn subscribing_twice_delivers_once() {
    let (mut g, x, cb, _) = fixture();
    assert!(!g.subscribe(x, cb.subscriber.clone()));
    g.set(x, "z", "s".into()).unwrap();
    assert_eq!(cb.count(), 1);
}

#[test]
fn to_json_and_reads() {
    let (mut g, x, _, _) = fixture();
    assert_eq!(g.get(x, "missing").unwrap(), None);
    assert_eq!(g.to_json(x), json!({"a": {"b": 1}}));
    let a = g.get(x, "a").unwrap().unwrap();
    assert!(a.is_node());
    assert!(matches!(
        g.get_observable(x, "missing"),
        Err(json_observe::ObserveError::NotAContainer(_))
    ));
}

#[test]
fn keys_with_slash_or_tilde_are_pointer_escaped() {
    let (mut g, x, cb, tmp) = fixture();
    g.set(x, "a/b", 1.into()).unwrap();
    g.set(tmp, "~c", 2.into()).unwrap();
    g.delete(x, "a/b").unwrap();

    assert_eq!(
        cb.calls(),
        vec![
            json!({"op": "add", "path": "/a~1b", "value": 1}),
            json!({"op": "add", "path": "/a/~0c", "value": 2}),
            json!({"op": "remove", "path": "/a~1b"}),
        ]
    );

    // The escaped pointers replay onto the prior snapshot.
    let mut doc = json!({"a": {"b": 1}});
    common::replay(&mut doc, &cb.calls());
    assert_eq!(doc, g.to_json(x));
}
