//! Raw values and container storage.
//!
//! Containers live in the [`Graph`](crate::Graph) arena and are addressed by
//! [`NodeId`]. A [`Value`] is either a JSON scalar or a reference to one of
//! those containers, so the same container can sit under several keys at
//! once (shared references) without being copied.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Number;

// ── NodeId ────────────────────────────────────────────────────────────────

/// Identity of a raw container in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// A value stored under an object key or array index.
///
/// Equality is the "same value" test used to suppress no-op writes:
/// scalars compare by value, containers by identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Node(NodeId),
}

impl Value {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number((n as u64).into())
    }
}

/// Non-finite floats have no JSON representation and become `Null`.
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

// ── Node ──────────────────────────────────────────────────────────────────

/// Storage of an array container.
///
/// `items` holds the indexed elements; `None` is a hole. `props` holds
/// named properties assigned on the array itself (e.g. `arr.hello`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayNode {
    pub items: Vec<Option<Value>>,
    pub props: IndexMap<String, Value>,
}

/// A raw container. Mutated in place, never replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(IndexMap<String, Value>),
    Array(ArrayNode),
}

impl Node {
    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    /// Own enumerable entries as `(key, value)` pairs: array indices first
    /// (holes skipped), then named properties.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Node::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Node::Array(arr) => arr
                .items
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.as_ref().map(|v| (i.to_string(), v.clone())))
                .chain(arr.props.iter().map(|(k, v)| (k.clone(), v.clone())))
                .collect(),
        }
    }

    /// Whether `key` is an own property (holes and missing keys are not).
    pub fn has_own(&self, key: &str) -> bool {
        match self {
            Node::Object(map) => map.contains_key(key),
            Node::Array(arr) => match crate::util::parse_index(key) {
                Some(i) => matches!(arr.items.get(i), Some(Some(_))),
                None => arr.props.contains_key(key),
            },
        }
    }

    /// Named-property map: the object itself, or an array's `props`.
    pub(crate) fn props(&self) -> &IndexMap<String, Value> {
        match self {
            Node::Object(map) => map,
            Node::Array(arr) => &arr.props,
        }
    }

    pub(crate) fn props_mut(&mut self) -> &mut IndexMap<String, Value> {
        match self {
            Node::Object(map) => map,
            Node::Array(arr) => &mut arr.props,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
