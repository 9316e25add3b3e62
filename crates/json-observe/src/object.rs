//! Traps for plain-object containers.
//!
//! The same named-property logic serves non-index keys of arrays
//! (`arr.hello = "world"`), which are stored in [`ArrayNode::props`].
//!
//! [`ArrayNode::props`]: crate::value::ArrayNode::props

use crate::config::ObserveOptions;
use crate::error::ObserveError;
use crate::graph::{Graph, Observable};
use crate::patch::Patch;
use crate::value::{NodeId, Value};

impl Graph {
    pub(crate) fn object_get(&mut self, obs: Observable, key: &str) -> Option<Value> {
        let value = self.raw(obs.node).props().get(key).cloned();
        if let Some(Value::Node(child)) = &value {
            self.wrap_on_read(obs, key, *child);
        }
        value
    }

    /// Lazily wraps a child found on read and links it under `key`.
    ///
    /// A child that already has a wrapper is returned as is; reading it
    /// through another container does not add a link.
    pub(crate) fn wrap_on_read(&mut self, obs: Observable, key: &str, child: NodeId) {
        if self.is_observed(child) {
            return;
        }
        let wrapped = self.wrap(child, ObserveOptions::default());
        if !self.is_excluded(obs, key) {
            self.handler_mut(wrapped.handler).add_parent(obs.handler, key);
        }
    }

    /// Named-property write: relinks the slot and emits `add`.
    pub(crate) fn set_property(
        &mut self,
        obs: Observable,
        key: &str,
        value: Value,
    ) -> Result<(), ObserveError> {
        if self.raw(obs.node).props().get(key) == Some(&value) {
            return Ok(());
        }
        if self.is_excluded(obs, key) {
            self.raw_mut(obs.node).props_mut().insert(key.to_string(), value);
            return Ok(());
        }
        let old = self
            .raw_mut(obs.node)
            .props_mut()
            .insert(key.to_string(), value.clone());
        self.unlink(old.as_ref(), obs.handler, key);
        self.link(Some(&value), obs.handler, key.to_string());
        let patch = Patch::Add {
            path: vec![key.to_string()],
            value: self.value_to_json(&value),
        };
        self.emit(obs.handler, patch)
    }

    /// Named-property delete: unlinks the slot and emits `remove`.
    pub(crate) fn delete_property(&mut self, obs: Observable, key: &str) -> Result<(), ObserveError> {
        if !self.raw(obs.node).has_own(key) {
            return Ok(());
        }
        if self.is_excluded(obs, key) {
            self.raw_mut(obs.node).props_mut().shift_remove(key);
            return Ok(());
        }
        let old = self.raw_mut(obs.node).props_mut().shift_remove(key);
        self.unlink(old.as_ref(), obs.handler, key);
        self.emit(
            obs.handler,
            Patch::Remove {
                path: vec![key.to_string()],
            },
        )
    }
}
