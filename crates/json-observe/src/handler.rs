//! Per-container bookkeeping: subscribers and parent links.
//!
//! A [`Handler`] exists for every observed container. Its parent links
//! record every `(owner, key)` slot the container is currently reachable
//! from; a container stored under two keys has two links and every patch it
//! emits fans out along both. Links are non-owning: they only attribute
//! paths.

use std::fmt;
use std::rc::Rc;

use crate::error::SubscriberError;
use crate::patch::Patch;
use crate::value::NodeId;

/// Identity of a handler in the graph's handler arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) usize);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Object,
    Array,
}

/// One place a container is reachable from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub handler: HandlerId,
    pub prop: String,
}

impl ParentLink {
    pub fn new(handler: HandlerId, prop: impl Into<String>) -> Self {
        Self {
            handler,
            prop: prop.into(),
        }
    }
}

// ── Subscriber ────────────────────────────────────────────────────────────

/// Callback receiving the patches of one container.
///
/// Identity is the underlying allocation: clones of a subscriber are the
/// same subscriber, two subscribers built from equal closures are not.
#[derive(Clone)]
pub struct Subscriber(Rc<dyn Fn(&Patch) -> Result<(), SubscriberError>>);

impl Subscriber {
    pub fn new(f: impl Fn(&Patch) -> Result<(), SubscriberError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wraps a callback that cannot fail.
    pub fn infallible(f: impl Fn(&Patch) + 'static) -> Self {
        Self::new(move |patch| {
            f(patch);
            Ok(())
        })
    }

    pub fn call(&self, patch: &Patch) -> Result<(), SubscriberError> {
        (self.0)(patch)
    }

    pub fn same(&self, other: &Subscriber) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscriber({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// ── Handler ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Handler {
    node: NodeId,
    kind: HandlerKind,
    subscribers: Vec<Subscriber>,
    parents: Vec<ParentLink>,
}

impl Handler {
    pub(crate) fn new(node: NodeId, kind: HandlerKind) -> Self {
        Self {
            node,
            kind,
            subscribers: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Current parent links, in the order they were added.
    pub fn parents(&self) -> &[ParentLink] {
        &self.parents
    }

    pub fn subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }

    /// Records that this container is now held by `handler` under `prop`.
    ///
    /// No deduplication: every call must be paired with one
    /// [`remove_parent`](Self::remove_parent) when the slot changes.
    pub fn add_parent(&mut self, handler: HandlerId, prop: impl Into<String>) {
        self.parents.push(ParentLink::new(handler, prop));
    }

    /// Removes the first link matching `(handler, prop)`.
    ///
    /// A missing link means parent tracking drifted; the mutation still
    /// proceeds, so this only warns and returns `false`.
    pub fn remove_parent(&mut self, handler: HandlerId, prop: &str) -> bool {
        match self
            .parents
            .iter()
            .position(|p| p.handler == handler && p.prop == prop)
        {
            Some(i) => {
                self.parents.remove(i);
                true
            }
            None => {
                tracing::warn!(
                    node = %self.node,
                    parent = %handler,
                    prop,
                    "removing a non-existent parent"
                );
                false
            }
        }
    }

    /// Registers `subscriber` unless it is already registered.
    pub(crate) fn subscribe(&mut self, subscriber: Subscriber) -> bool {
        if self.subscribers.iter().any(|s| s.same(&subscriber)) {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    pub(crate) fn unsubscribe(&mut self, subscriber: &Subscriber) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| !s.same(subscriber));
        self.subscribers.len() != before
    }
}
