//! Change records emitted by observed containers.
//!
//! A [`Patch`] describes one mutation relative to the container whose
//! subscriber receives it. Paths are segment lists; [`Patch::pointer`] and
//! [`Patch::to_json`] render them as RFC 6901 JSON Pointers.
//!
//! Overwriting an object key is reported as `add` even when the key
//! already existed: the op means "this key now holds this value".

use serde_json::{json, Map, Value};

/// Path segments from the receiving container down to the mutated slot.
pub type Path = Vec<String>;

// ── Patch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Add {
        path: Path,
        value: Value,
    },
    Remove {
        path: Path,
    },
    Replace {
        path: Path,
        value: Value,
    },
    /// Coalesced array change: `remove` elements starting at the last path
    /// segment were replaced by `add`.
    Splice {
        path: Path,
        remove: usize,
        add: Vec<Value>,
    },
}

impl Patch {
    pub fn op_name(&self) -> &'static str {
        match self {
            Patch::Add { .. } => "add",
            Patch::Remove { .. } => "remove",
            Patch::Replace { .. } => "replace",
            Patch::Splice { .. } => "splice",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Patch::Add { path, .. } => path,
            Patch::Remove { path } => path,
            Patch::Replace { path, .. } => path,
            Patch::Splice { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut Path {
        match self {
            Patch::Add { path, .. } => path,
            Patch::Remove { path } => path,
            Patch::Replace { path, .. } => path,
            Patch::Splice { path, .. } => path,
        }
    }

    /// The path as a JSON Pointer string (`""` for the root).
    pub fn pointer(&self) -> String {
        format_pointer(self.path())
    }

    /// Returns a copy of this patch as seen from a parent that holds the
    /// patched container under `segment`.
    pub fn lift(&self, segment: &str) -> Patch {
        let mut lifted = self.clone();
        lifted.path_mut().insert(0, segment.to_string());
        lifted
    }

    /// Serializes to the wire shape `{op, path, value?, remove?, add?}`.
    pub fn to_json(&self) -> Value {
        match self {
            Patch::Add { value, .. } => json!({
                "op": "add",
                "path": self.pointer(),
                "value": value
            }),
            Patch::Remove { .. } => json!({ "op": "remove", "path": self.pointer() }),
            Patch::Replace { value, .. } => json!({
                "op": "replace",
                "path": self.pointer(),
                "value": value
            }),
            Patch::Splice { remove, add, .. } => {
                let mut m = Map::new();
                m.insert("op".into(), json!("splice"));
                m.insert("path".into(), json!(self.pointer()));
                m.insert("remove".into(), json!(remove));
                m.insert("add".into(), Value::Array(add.clone()));
                Value::Object(m)
            }
        }
    }
}

// ── Pointer helpers ───────────────────────────────────────────────────────

/// Escapes one path segment: `~` becomes `~0`, `/` becomes `~1`.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    // `~` first, otherwise the `~1` we introduce would be re-escaped.
    segment.replace('~', "~0").replace('/', "~1")
}

pub fn format_pointer(path: &[String]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    for segment in path {
        out.push('/');
        out.push_str(&escape_segment(segment));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────
