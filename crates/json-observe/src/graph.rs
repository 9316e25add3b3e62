//! The observed graph: node arena, wrap registry, and patch propagation.
//!
//! # Overview
//!
//! A [`Graph`] owns every raw container (addressed by [`NodeId`]) and, for
//! the containers that have been observed, a [`Handler`] found through an
//! identity-keyed side table. Observation is lazy: [`Graph::observe`] wraps
//! one container, and children are wrapped the first time they are read
//! through [`Graph::get`] or stored through [`Graph::set`].
//!
//! Every mutation goes through the graph. The owning handler updates parent
//! links, mutates the raw storage, builds [`Patch`]es relative to itself and
//! hands them to [`Graph::on_patch`], which notifies the handler's own
//! subscribers and then walks every parent link upward, prefixing the key
//! at each step. Delivery is synchronous and depth-first.
//!
//! ```
//! use json_observe::{Graph, ObserveOptions, Subscriber};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut graph = Graph::default();
//! let root = graph.observe_json(&json!({"a": {"b": 1}}), ObserveOptions::default()).unwrap();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! graph.subscribe(root, Subscriber::infallible(move |p| sink.borrow_mut().push(p.to_json())));
//!
//! let a = graph.get_observable(root, "a").unwrap();
//! graph.set(a, "b", 2.into()).unwrap();
//! assert_eq!(seen.borrow()[0], json!({"op": "add", "path": "/a/b", "value": 2}));
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::config::{Config, ObserveOptions};
use crate::error::ObserveError;
use crate::handler::{Handler, HandlerId, HandlerKind, Subscriber};
use crate::patch::Patch;
use crate::value::{ArrayNode, Node, NodeId, Value};

/// Handle to an observed container.
///
/// Only the graph hands these out, so holding one means the container has
/// a handler. Two handles are equal iff they wrap the same container.
///
/// Handles belong to the graph that created them. The fallible operations
/// (`get`, `set`, `delete`, the array methods) reject a handle this graph
/// did not issue with `UNKNOWN_NODE`; the infallible accessors
/// ([`Graph::handler`], [`Graph::subscribe`], [`Graph::to_json`]) panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observable {
    pub(crate) node: NodeId,
    pub(crate) handler: HandlerId,
}

impl Observable {
    pub fn node(self) -> NodeId {
        self.node
    }

    pub fn handler_id(self) -> HandlerId {
        self.handler
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    handlers: Vec<Handler>,
    /// Wrap registry: raw container identity → its one handler.
    registry: HashMap<NodeId, HandlerId>,
    config: Config,
}

impl Graph {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settings may change between mutations; each trap reads them afresh.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    // ── Raw storage ───────────────────────────────────────────────────────

    pub fn new_object(&mut self) -> NodeId {
        self.push_node(Node::Object(IndexMap::new()))
    }

    pub fn new_array(&mut self) -> NodeId {
        self.push_node(Node::Array(ArrayNode::default()))
    }

    /// Allocates a raw object holding `entries`, which may reference
    /// existing containers.
    pub fn object_from<K: Into<String>>(&mut self, entries: impl IntoIterator<Item = (K, Value)>) -> NodeId {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.push_node(Node::Object(map))
    }

    /// Allocates a raw array holding `items`.
    pub fn array_from(&mut self, items: impl IntoIterator<Item = Value>) -> NodeId {
        self.push_node(Node::Array(ArrayNode {
            items: items.into_iter().map(Some).collect(),
            props: IndexMap::new(),
        }))
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Materializes a JSON tree as fresh, unobserved raw containers.
    pub fn alloc(&mut self, json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.clone()),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => {
                let items = items.iter().map(|item| Some(self.alloc(item))).collect();
                Value::Node(self.push_node(Node::Array(ArrayNode {
                    items,
                    props: IndexMap::new(),
                })))
            }
            Json::Object(map) => {
                let map = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.alloc(v)))
                    .collect();
                Value::Node(self.push_node(Node::Object(map)))
            }
        }
    }

    /// Read-only access to a raw container, bypassing observation.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn raw(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn raw_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    // ── Observation ───────────────────────────────────────────────────────

    /// Wraps `id`, or returns its existing wrapper unchanged.
    ///
    /// With `opts.deep`, each current non-excluded child container is wrapped
    /// (shallowly) and linked to the new handler under its key.
    pub fn observe(&mut self, id: NodeId, opts: ObserveOptions) -> Result<Observable, ObserveError> {
        if id.0 >= self.nodes.len() {
            return Err(ObserveError::UnknownNode(id));
        }
        Ok(self.wrap(id, opts))
    }

    /// Allocates `json` and observes it. Scalars cannot be observed.
    pub fn observe_json(&mut self, json: &Json, opts: ObserveOptions) -> Result<Observable, ObserveError> {
        match self.alloc(json) {
            Value::Node(id) => self.observe(id, opts),
            _ => Err(ObserveError::NotAContainer(json.to_string())),
        }
    }

    pub(crate) fn wrap(&mut self, id: NodeId, opts: ObserveOptions) -> Observable {
        if let Some(&handler) = self.registry.get(&id) {
            return Observable { node: id, handler };
        }
        let kind = if self.raw(id).is_array() {
            HandlerKind::Array
        } else {
            HandlerKind::Object
        };
        let handler = HandlerId(self.handlers.len());
        self.handlers.push(Handler::new(id, kind));
        self.registry.insert(id, handler);
        tracing::trace!(node = %id, handler = %handler, deep = opts.deep, "observe");

        if opts.deep {
            for (prop, value) in self.raw(id).entries() {
                let Value::Node(child) = value else { continue };
                if self.config.exclude_property.is_excluded(self.raw(id), &prop) {
                    continue;
                }
                let child = self.wrap(child, ObserveOptions::default());
                self.handlers[child.handler.0].add_parent(handler, prop);
            }
        }
        Observable { node: id, handler }
    }

    /// The wrapper of `id`, if it has been observed.
    pub fn observable(&self, id: NodeId) -> Option<Observable> {
        self.registry
            .get(&id)
            .map(|&handler| Observable { node: id, handler })
    }

    pub fn is_observed(&self, id: NodeId) -> bool {
        self.registry.contains_key(&id)
    }

    /// # Panics
    ///
    /// If `obs` was not issued by this graph.
    pub fn handler(&self, obs: Observable) -> &Handler {
        &self.handlers[obs.handler.0]
    }

    pub(crate) fn handler_mut(&mut self, id: HandlerId) -> &mut Handler {
        &mut self.handlers[id.0]
    }

    /// Registers `subscriber` on `obs`. Registering the same subscriber
    /// twice has no effect; returns whether it was added.
    pub fn subscribe(&mut self, obs: Observable, subscriber: Subscriber) -> bool {
        self.handler_mut(obs.handler).subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, obs: Observable, subscriber: &Subscriber) -> bool {
        self.handler_mut(obs.handler).unsubscribe(subscriber)
    }

    /// Fails with `UNKNOWN_NODE` unless `obs` is a handle this graph issued.
    pub(crate) fn check(&self, obs: Observable) -> Result<(), ObserveError> {
        match self.registry.get(&obs.node) {
            Some(&handler) if handler == obs.handler => Ok(()),
            _ => Err(ObserveError::UnknownNode(obs.node)),
        }
    }

    /// Fails with `UNKNOWN_NODE` if `value` refers to a node outside the arena.
    pub(crate) fn check_value(&self, value: &Value) -> Result<(), ObserveError> {
        match value {
            Value::Node(id) if id.0 >= self.nodes.len() => Err(ObserveError::UnknownNode(*id)),
            _ => Ok(()),
        }
    }

    // ── Parent links ──────────────────────────────────────────────────────

    /// Drops the `(owner, prop)` link of `value` if it is an observed container.
    pub(crate) fn unlink(&mut self, value: Option<&Value>, owner: HandlerId, prop: &str) {
        if let Some(Value::Node(id)) = value {
            if let Some(&child) = self.registry.get(id) {
                self.handlers[child.0].remove_parent(owner, prop);
            }
        }
    }

    /// Wraps `value` deeply if needed and links it under `(owner, prop)`.
    pub(crate) fn link(&mut self, value: Option<&Value>, owner: HandlerId, prop: String) {
        if let Some(Value::Node(id)) = value {
            let child = self.wrap(*id, ObserveOptions::deep());
            self.handlers[child.handler.0].add_parent(owner, prop);
        }
    }

    // ── Notification ──────────────────────────────────────────────────────

    /// Delivers `patch` to the subscribers of `handler`, then to every
    /// ancestor along every parent link, depth-first in link order.
    ///
    /// The first subscriber error stops delivery and is returned.
    pub fn on_patch(&self, handler: HandlerId, patch: &Patch) -> Result<(), ObserveError> {
        let mut chain = Vec::new();
        self.propagate(handler, patch, &mut chain)
    }

    fn propagate(
        &self,
        id: HandlerId,
        patch: &Patch,
        chain: &mut Vec<HandlerId>,
    ) -> Result<(), ObserveError> {
        let handler = &self.handlers[id.0];
        for subscriber in handler.subscribers() {
            subscriber
                .call(patch)
                .map_err(|source| ObserveError::Subscriber {
                    path: patch.pointer(),
                    source,
                })?;
        }
        chain.push(id);
        for link in handler.parents() {
            if chain.contains(&link.handler) {
                tracing::warn!(
                    handler = %id,
                    parent = %link.handler,
                    prop = %link.prop,
                    "cycle in parent links, not propagating further"
                );
                continue;
            }
            self.propagate(link.handler, &patch.lift(&link.prop), chain)?;
        }
        chain.pop();
        Ok(())
    }

    pub(crate) fn emit(&self, handler: HandlerId, patch: Patch) -> Result<(), ObserveError> {
        tracing::trace!(handler = %handler, op = patch.op_name(), path = %patch.pointer(), "patch");
        self.on_patch(handler, &patch)
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    /// JSON snapshot of an observed container.
    pub fn to_json(&self, obs: Observable) -> Json {
        self.value_to_json(&Value::Node(obs.node))
    }

    /// JSON snapshot of any value. Holes and named array properties are
    /// dropped the way `JSON.stringify` drops them; a container reached
    /// again while it is being serialized becomes `null`.
    pub fn value_to_json(&self, value: &Value) -> Json {
        let mut visiting = Vec::new();
        self.snapshot(value, &mut visiting)
    }

    pub(crate) fn slot_to_json(&self, slot: Option<&Value>) -> Json {
        slot.map(|v| self.value_to_json(v)).unwrap_or(Json::Null)
    }

    fn snapshot(&self, value: &Value, visiting: &mut Vec<NodeId>) -> Json {
        let id = match value {
            Value::Null => return Json::Null,
            Value::Bool(b) => return Json::Bool(*b),
            Value::Number(n) => return Json::Number(n.clone()),
            Value::String(s) => return Json::String(s.clone()),
            Value::Node(id) => *id,
        };
        if visiting.contains(&id) {
            tracing::warn!(node = %id, "cyclic reference serialized as null");
            return Json::Null;
        }
        visiting.push(id);
        let out = match self.raw(id) {
            Node::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), self.snapshot(v, visiting));
                }
                Json::Object(out)
            }
            Node::Array(arr) => Json::Array(
                arr.items
                    .iter()
                    .map(|slot| match slot {
                        Some(v) => self.snapshot(v, visiting),
                        None => Json::Null,
                    })
                    .collect(),
            ),
        };
        visiting.pop();
        out
    }

    // ── Trap dispatch ─────────────────────────────────────────────────────

    /// Reads `key`, wrapping a not-yet-observed child container on the way.
    ///
    /// Returns `None` for missing keys, holes and out-of-range indices.
    pub fn get(&mut self, obs: Observable, key: &str) -> Result<Option<Value>, ObserveError> {
        self.check(obs)?;
        match self.handler(obs).kind() {
            HandlerKind::Object => Ok(self.object_get(obs, key)),
            HandlerKind::Array => Ok(self.array_get(obs, key)),
        }
    }

    /// Reads `key` and requires it to hold a container.
    pub fn get_observable(&mut self, obs: Observable, key: &str) -> Result<Observable, ObserveError> {
        match self.get(obs, key)? {
            Some(Value::Node(id)) => Ok(self.wrap(id, ObserveOptions::default())),
            _ => Err(ObserveError::NotAContainer(key.to_string())),
        }
    }

    /// Writes `value` under `key`. Writing the value already stored there
    /// is a no-op.
    pub fn set(&mut self, obs: Observable, key: &str, value: Value) -> Result<(), ObserveError> {
        self.check(obs)?;
        self.check_value(&value)?;
        match self.handler(obs).kind() {
            HandlerKind::Object => self.set_property(obs, key, value),
            HandlerKind::Array => self.array_set(obs, key, value),
        }
    }

    /// Deletes `key`. Deleting a key that is not an own property is a no-op.
    pub fn delete(&mut self, obs: Observable, key: &str) -> Result<(), ObserveError> {
        self.check(obs)?;
        match self.handler(obs).kind() {
            HandlerKind::Object => self.delete_property(obs, key),
            HandlerKind::Array => self.array_delete(obs, key),
        }
    }

    pub(crate) fn is_excluded(&self, obs: Observable, prop: &str) -> bool {
        self.config
            .exclude_property
            .is_excluded(self.raw(obs.node), prop)
    }
}
