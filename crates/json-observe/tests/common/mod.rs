#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use json_observe::{Graph, Observable, Subscriber};
use serde_json::Value;

// ── Recorder ──────────────────────────────────────────────────────────────

/// Subscriber that records every patch it receives, in wire shape.
pub struct Recorder {
    calls: Rc<RefCell<Vec<Value>>>,
    pub subscriber: Subscriber,
}

impl Recorder {
    pub fn new() -> Self {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let subscriber = Subscriber::infallible(move |p| sink.borrow_mut().push(p.to_json()));
        Self { calls, subscriber }
    }

    /// Creates a recorder and subscribes it to `obs`.
    pub fn attach(graph: &mut Graph, obs: Observable) -> Self {
        let rec = Self::new();
        graph.subscribe(obs, rec.subscriber.clone());
        rec
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn call(&self, i: usize) -> Value {
        self.calls.borrow()[i].clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Replay ────────────────────────────────────────────────────────────────

fn parse_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..]
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn container<'a>(doc: &'a mut Value, path: &[String]) -> &'a mut Value {
    let mut cur = doc;
    for step in path {
        cur = match cur {
            Value::Object(map) => map.get_mut(step).expect("missing key"),
            Value::Array(arr) => {
                let i: usize = step.parse().expect("bad index");
                &mut arr[i]
            }
            _ => panic!("path walks into a scalar"),
        };
    }
    cur
}

/// Applies one recorded patch (wire shape) to `doc`. Array `add` inserts,
/// object `add` assigns; `splice` follows `Array.prototype.splice`.
pub fn apply(doc: &mut Value, patch: &Value) {
    let path = parse_pointer(patch["path"].as_str().expect("path"));
    let (parent, last) = path.split_at(path.len() - 1);
    let key = &last[0];
    let target = container(doc, parent);
    match (patch["op"].as_str().expect("op"), target) {
        ("add", Value::Object(map)) | ("replace", Value::Object(map)) => {
            map.insert(key.clone(), patch["value"].clone());
        }
        ("remove", Value::Object(map)) => {
            map.remove(key);
        }
        ("add", Value::Array(arr)) => {
            let i: usize = key.parse().expect("index");
            arr.insert(i, patch["value"].clone());
        }
        ("replace", Value::Array(arr)) => {
            let i: usize = key.parse().expect("index");
            arr[i] = patch["value"].clone();
        }
        ("remove", Value::Array(arr)) => {
            let i: usize = key.parse().expect("index");
            arr.remove(i);
        }
        ("splice", Value::Array(arr)) => {
            let i: usize = key.parse().expect("index");
            let remove = patch["remove"].as_u64().expect("remove") as usize;
            let add = patch["add"].as_array().expect("add").clone();
            arr.splice(i..i + remove, add);
        }
        (op, target) => panic!("cannot apply {op} to {target}"),
    }
}

pub fn replay(doc: &mut Value, patches: &[Value]) {
    for patch in patches {
        apply(doc, patch);
    }
}
