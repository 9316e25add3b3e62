//! Graph-wide settings and per-call options.

use std::fmt;
use std::rc::Rc;

use crate::value::Node;

// ── ExcludeProperty ───────────────────────────────────────────────────────

/// Policy deciding whether a property of a container bypasses observation.
///
/// Writes and deletes to an excluded property still reach the raw storage,
/// but emit no patch and never link the stored container to its owner.
/// The predicate is invoked on every trap and should be pure.
#[derive(Clone)]
pub struct ExcludeProperty(Rc<dyn Fn(&Node, &str) -> bool>);

impl ExcludeProperty {
    pub fn new(f: impl Fn(&Node, &str) -> bool + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Excludes nothing.
    pub fn none() -> Self {
        Self::new(|_, _| false)
    }

    /// Excludes every property whose name starts with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |_, prop| prop.starts_with(prefix.as_str()))
    }

    pub fn is_excluded(&self, target: &Node, prop: &str) -> bool {
        (self.0)(target, prop)
    }
}

impl Default for ExcludeProperty {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for ExcludeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExcludeProperty(..)")
    }
}

// ── Config ────────────────────────────────────────────────────────────────

/// Settings consulted on every mutation of a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Emit one coalesced `splice` patch per array change instead of
    /// decomposed `replace`/`add`/`remove` patches.
    pub enable_splice: bool,
    pub exclude_property: ExcludeProperty,
}

impl Config {
    pub fn with_splice(mut self, enable: bool) -> Self {
        self.enable_splice = enable;
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeProperty) -> Self {
        self.exclude_property = exclude;
        self
    }
}

// ── ObserveOptions ────────────────────────────────────────────────────────

/// Options for [`Graph::observe`](crate::Graph::observe).
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserveOptions {
    /// Eagerly wrap and link the container's current child containers
    /// instead of waiting for them to be read.
    pub deep: bool,
}

impl ObserveOptions {
    pub fn deep() -> Self {
        Self { deep: true }
    }
}
