//! Traps and mutating methods for array containers.
//!
//! Every mutation follows the same shape: normalize the arguments like the
//! native method, unlink the observed containers in the range about to be
//! touched, mutate the raw items, relink whatever now sits in the touched
//! range (wrapping new containers deeply), and describe the net effect as
//! one `(index, removed, added)` triple for [`Graph::generate_patches`].
//!
//! Index keys are canonical non-negative integers; every other key is a
//! named property and takes the object path.

use std::cmp::Ordering;

use serde_json::Value as Json;

use crate::error::ObserveError;
use crate::graph::{Graph, Observable};
use crate::handler::HandlerKind;
use crate::patch::Patch;
use crate::util::{clamp_delete_count, parse_index, relative_index};
use crate::value::{ArrayNode, Node, NodeId, Value};

const LENGTH: &str = "length";

impl Graph {
    // ── Raw access ────────────────────────────────────────────────────────

    fn items(&self, obs: Observable) -> &Vec<Option<Value>> {
        match self.raw(obs.node) {
            Node::Array(ArrayNode { items, .. }) => items,
            Node::Object(_) => unreachable!("array handler on object node"),
        }
    }

    fn items_mut(&mut self, obs: Observable) -> &mut Vec<Option<Value>> {
        match self.raw_mut(obs.node) {
            Node::Array(ArrayNode { items, .. }) => items,
            Node::Object(_) => unreachable!("array handler on object node"),
        }
    }

    fn expect_array(&self, obs: Observable) -> Result<(), ObserveError> {
        self.check(obs)?;
        match self.handler(obs).kind() {
            HandlerKind::Array => Ok(()),
            HandlerKind::Object => Err(ObserveError::NotAnArray),
        }
    }

    /// Number of indexed slots, holes included.
    pub fn len(&self, obs: Observable) -> Result<usize, ObserveError> {
        self.expect_array(obs)?;
        Ok(self.items(obs).len())
    }

    // ── Traps ─────────────────────────────────────────────────────────────

    pub(crate) fn array_get(&mut self, obs: Observable, key: &str) -> Option<Value> {
        let Some(index) = parse_index(key) else {
            if key == LENGTH {
                return Some(Value::from(self.items(obs).len()));
            }
            return self.object_get(obs, key);
        };
        let value = self.items(obs).get(index).cloned().flatten();
        if let Some(Value::Node(child)) = &value {
            self.wrap_on_read(obs, key, *child);
        }
        value
    }

    pub(crate) fn array_set(
        &mut self,
        obs: Observable,
        key: &str,
        value: Value,
    ) -> Result<(), ObserveError> {
        let Some(index) = parse_index(key) else {
            if key == LENGTH {
                return Err(ObserveError::InvalidKey(key.to_string()));
            }
            return self.set_property(obs, key, value);
        };
        if self.items(obs).get(index) == Some(&Some(value.clone())) {
            return Ok(());
        }
        let len = self.items(obs).len();
        if self.is_excluded(obs, key) {
            let Some(new_len) = index.checked_add(1) else {
                return Err(ObserveError::InvalidKey(key.to_string()));
            };
            let items = self.items_mut(obs);
            if index >= len {
                items.resize(new_len, None);
            }
            items[index] = Some(value);
            return Ok(());
        }
        if index < len {
            self.before_update(obs, index, index + 1);
            self.items_mut(obs)[index] = Some(value);
            self.after_update(obs, index, index + 1);
            self.generate_patches(obs, index, 1, 1)
        } else {
            let Some(new_len) = index.checked_add(1) else {
                return Err(ObserveError::InvalidKey(key.to_string()));
            };
            let items = self.items_mut(obs);
            items.resize(new_len, None);
            items[index] = Some(value);
            self.after_update(obs, len, new_len);
            self.generate_patches(obs, len, 0, new_len - len)
        }
    }

    /// Deleting an index leaves a hole; the length is unchanged.
    pub(crate) fn array_delete(&mut self, obs: Observable, key: &str) -> Result<(), ObserveError> {
        let Some(index) = parse_index(key) else {
            if key == LENGTH {
                return Err(ObserveError::InvalidKey(key.to_string()));
            }
            return self.delete_property(obs, key);
        };
        if !self.raw(obs.node).has_own(key) {
            return Ok(());
        }
        if self.is_excluded(obs, key) {
            self.items_mut(obs)[index] = None;
            return Ok(());
        }
        self.before_update(obs, index, index + 1);
        self.items_mut(obs)[index] = None;
        self.generate_patches(obs, index, 1, 1)
    }

    // ── Mutating methods ──────────────────────────────────────────────────

    /// `Array.prototype.copyWithin`: copies `[start, end)` over the slots
    /// beginning at `target`, truncated at the array's end.
    pub fn copy_within(
        &mut self,
        obs: Observable,
        target: i64,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Observable, ObserveError> {
        self.expect_array(obs)?;
        let len = self.items(obs).len();
        let target = relative_index(Some(target), 0, len);
        let start = relative_index(start, 0, len);
        let end = relative_index(end, len, len);
        if target >= len || start >= end {
            return Ok(obs);
        }
        let stop = (target + (end - start)).min(len);
        let count = stop - target;
        self.before_update(obs, target, stop);
        let items = self.items_mut(obs);
        let source: Vec<Option<Value>> = items[start..start + count].to_vec();
        items[target..stop].clone_from_slice(&source);
        self.after_update(obs, target, stop);
        self.generate_patches(obs, target, count, count)?;
        Ok(obs)
    }

    /// `Array.prototype.fill` over `[start, end)`.
    pub fn fill(
        &mut self,
        obs: Observable,
        value: Value,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Observable, ObserveError> {
        self.expect_array(obs)?;
        self.check_value(&value)?;
        let len = self.items(obs).len();
        let start = relative_index(start, 0, len);
        let end = relative_index(end, len, len);
        if start >= end {
            return Ok(obs);
        }
        self.before_update(obs, start, end);
        for slot in &mut self.items_mut(obs)[start..end] {
            *slot = Some(value.clone());
        }
        self.after_update(obs, start, end);
        self.generate_patches(obs, start, end - start, end - start)?;
        Ok(obs)
    }

    /// Removes the last element. An empty array is left untouched and
    /// yields `None`, as does a trailing hole.
    pub fn pop(&mut self, obs: Observable) -> Result<Option<Value>, ObserveError> {
        self.expect_array(obs)?;
        let len = self.items(obs).len();
        if len == 0 {
            return Ok(None);
        }
        self.before_update(obs, len - 1, len);
        let popped = self.items_mut(obs).pop().flatten();
        self.generate_patches(obs, len - 1, 1, 0)?;
        Ok(popped)
    }

    /// Appends `values`; returns the new length.
    pub fn push(&mut self, obs: Observable, values: Vec<Value>) -> Result<usize, ObserveError> {
        self.expect_array(obs)?;
        values.iter().try_for_each(|v| self.check_value(v))?;
        let start = self.items(obs).len();
        let added = values.len();
        self.items_mut(obs).extend(values.into_iter().map(Some));
        self.after_update(obs, start, start + added);
        self.generate_patches(obs, start, 0, added)?;
        Ok(start + added)
    }

    pub fn reverse(&mut self, obs: Observable) -> Result<Observable, ObserveError> {
        self.expect_array(obs)?;
        let len = self.items(obs).len();
        self.before_update(obs, 0, len);
        self.items_mut(obs).reverse();
        self.after_update(obs, 0, len);
        self.generate_patches(obs, 0, len, len)?;
        Ok(obs)
    }

    /// Removes the first element. An empty array is left untouched and
    /// yields `None`.
    pub fn shift(&mut self, obs: Observable) -> Result<Option<Value>, ObserveError> {
        self.expect_array(obs)?;
        let len = self.items(obs).len();
        if len == 0 {
            return Ok(None);
        }
        self.before_update(obs, 0, len);
        let shifted = self.items_mut(obs).remove(0);
        self.after_update(obs, 0, len - 1);
        self.generate_patches(obs, 0, 1, 0)?;
        Ok(shifted)
    }

    /// Sorts with the native default ordering: elements compare by their
    /// string form in UTF-16 code unit order, holes go last.
    pub fn sort(&mut self, obs: Observable) -> Result<Observable, ObserveError> {
        self.expect_array(obs)?;
        let keys: Vec<Option<Vec<u16>>> = self
            .items(obs)
            .iter()
            .map(|slot| slot.as_ref().map(|v| self.sort_key(v).encode_utf16().collect()))
            .collect();
        let mut order: Vec<usize> = (0..keys.len()).filter(|&i| keys[i].is_some()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        self.reorder(obs, order)
    }

    /// Sorts with `compare`, which must be a total order. Holes go last and
    /// are never passed to `compare`.
    pub fn sort_by<F>(&mut self, obs: Observable, mut compare: F) -> Result<Observable, ObserveError>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        self.expect_array(obs)?;
        let items = self.items(obs);
        let mut order: Vec<usize> = (0..items.len()).filter(|&i| items[i].is_some()).collect();
        order.sort_by(|&a, &b| match (&items[a], &items[b]) {
            (Some(x), Some(y)) => compare(x, y),
            _ => Ordering::Equal,
        });
        self.reorder(obs, order)
    }

    /// Rearranges the items so the filled slots come in `order`, followed
    /// by the holes, and reports the whole array as replaced.
    fn reorder(&mut self, obs: Observable, order: Vec<usize>) -> Result<Observable, ObserveError> {
        let len = self.items(obs).len();
        self.before_update(obs, 0, len);
        let items = self.items_mut(obs);
        let mut sorted: Vec<Option<Value>> = order.iter().map(|&i| items[i].take()).collect();
        sorted.resize(len, None);
        *items = sorted;
        self.after_update(obs, 0, len);
        self.generate_patches(obs, 0, len, len)?;
        Ok(obs)
    }

    /// `Array.prototype.splice`: removes `delete_count` elements at `start`
    /// (all remaining when `None`) and inserts `values` in their place.
    /// Returns the removed slots.
    pub fn splice(
        &mut self,
        obs: Observable,
        start: i64,
        delete_count: Option<i64>,
        values: Vec<Value>,
    ) -> Result<Vec<Option<Value>>, ObserveError> {
        self.expect_array(obs)?;
        values.iter().try_for_each(|v| self.check_value(v))?;
        let len = self.items(obs).len();
        let start = relative_index(Some(start), 0, len);
        let removed = clamp_delete_count(delete_count, start, len);
        let added = values.len();
        self.before_update(obs, start, len);
        let out: Vec<Option<Value>> = self
            .items_mut(obs)
            .splice(start..start + removed, values.into_iter().map(Some))
            .collect();
        let new_len = self.items(obs).len();
        self.after_update(obs, start, new_len);
        self.generate_patches(obs, start, removed, added)?;
        Ok(out)
    }

    /// Prepends `values`; returns the new length.
    pub fn unshift(&mut self, obs: Observable, values: Vec<Value>) -> Result<usize, ObserveError> {
        self.expect_array(obs)?;
        values.iter().try_for_each(|v| self.check_value(v))?;
        let len = self.items(obs).len();
        let added = values.len();
        self.before_update(obs, 0, len);
        let items = self.items_mut(obs);
        let tail = std::mem::take(items);
        *items = values.into_iter().map(Some).chain(tail).collect();
        self.after_update(obs, 0, len + added);
        self.generate_patches(obs, 0, 0, added)?;
        Ok(len + added)
    }

    // ── Link maintenance ──────────────────────────────────────────────────

    /// Unlinks every observed container in `[start, end)` from this array.
    fn before_update(&mut self, obs: Observable, start: usize, end: usize) {
        for i in start..end {
            let slot = self.items(obs)[i].clone();
            self.unlink(slot.as_ref(), obs.handler, &i.to_string());
        }
    }

    /// Links every container in `[start, end)` to this array under its
    /// current index, wrapping it deeply if it was not yet observed.
    fn after_update(&mut self, obs: Observable, start: usize, end: usize) {
        for i in start..end {
            let slot = self.items(obs)[i].clone();
            self.link(slot.as_ref(), obs.handler, i.to_string());
        }
    }

    // ── Patch generation ──────────────────────────────────────────────────

    /// Describes "`removed` elements at `index` were replaced by the `added`
    /// elements now at `index`".
    ///
    /// With splice enabled this is a single `splice` patch. Otherwise it is
    /// decomposed into `replace`s for the overlap, `add`s for the surplus,
    /// then `remove`s from the highest index down so each path is still
    /// valid when applied in order.
    pub(crate) fn generate_patches(
        &self,
        obs: Observable,
        index: usize,
        removed: usize,
        added: usize,
    ) -> Result<(), ObserveError> {
        if removed == 0 && added == 0 {
            return Ok(());
        }
        let element = |i: usize| -> Json { self.slot_to_json(self.items(obs).get(i).and_then(Option::as_ref)) };
        if self.config().enable_splice {
            let patch = Patch::Splice {
                path: vec![index.to_string()],
                remove: removed,
                add: (index..index + added).map(element).collect(),
            };
            return self.emit(obs.handler, patch);
        }
        for i in 0..removed.min(added) {
            let at = index + i;
            self.emit(
                obs.handler,
                Patch::Replace {
                    path: vec![at.to_string()],
                    value: element(at),
                },
            )?;
        }
        for i in removed..added {
            let at = index + i;
            self.emit(
                obs.handler,
                Patch::Add {
                    path: vec![at.to_string()],
                    value: element(at),
                },
            )?;
        }
        for i in (added..removed).rev() {
            self.emit(
                obs.handler,
                Patch::Remove {
                    path: vec![(index + i).to_string()],
                },
            )?;
        }
        Ok(())
    }

    // ── Default sort ordering ─────────────────────────────────────────────

    /// String form used by the default sort comparator.
    fn sort_key(&self, value: &Value) -> String {
        let mut visiting = Vec::new();
        self.stringify(value, &mut visiting)
    }

    fn stringify(&self, value: &Value, visiting: &mut Vec<NodeId>) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_key(n),
            Value::String(s) => s.clone(),
            Value::Node(id) => match self.raw(*id) {
                Node::Object(_) => "[object Object]".to_string(),
                Node::Array(arr) => {
                    if visiting.contains(id) {
                        return String::new();
                    }
                    visiting.push(*id);
                    let joined = arr
                        .items
                        .iter()
                        .map(|slot| match slot {
                            Some(Value::Null) | None => String::new(),
                            Some(v) => self.stringify(v, visiting),
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    visiting.pop();
                    joined
                }
            },
        }
    }
}

/// Number display as the native `String(n)` gives it for the values a
/// JSON number can hold: integral floats drop the `.0`, `-0` is `"0"`.
fn number_key(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e21 {
                return format!("{}", f as i128);
            }
        }
    }
    n.to_string()
}
