//! Reactive Objects
//!
//! A [`Reactive`] wraps a raw map or list so that every key acts like an
//! independent reactive source: reads subscribe the running effect to that
//! key alone, writes notify only that key's subscribers.
//!
//! # Keys and accessors
//!
//! Property access goes through explicit [`get`]/[`set`] accessors keyed by
//! [`Key`]: a named property, a list index, or the list length. Rust's
//! `Index` trait hands out plain references and could neither track the read
//! nor wrap the result, so there is no operator surface.
//!
//! # Lazy deep wrapping
//!
//! Values stored in the target stay raw. A read that produces a nested map
//! or list wraps it on the way out, through the runtime's wrap cache, so
//! reading the same nested object twice yields the identical wrapper and
//! `wrap(wrap(x))` is `wrap(x)`. Primitives pass through untouched.
//!
//! # Length semantics
//!
//! A list write at or past the current length grows the list (null-filled)
//! and additionally notifies the `Len` key, so length- and
//! iteration-dependent computations re-run. Shrinking through `Len` notifies
//! the removed indices. Map inserts of a new key notify `Len` the same way,
//! which is what keeps entry-count readers honest.
//!
//! [`get`]: Reactive::get
//! [`set`]: Reactive::set

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::value::{RawList, RawMap, Value};

use super::handle::DepId;
use super::runtime::Runtime;

/// Address of one reactive source inside an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named map property.
    Prop(String),
    /// A list position.
    Index(usize),
    /// The list length (or map entry count).
    Len,
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Prop(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Prop(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

#[derive(Clone)]
enum Target {
    Map(RawMap),
    List(RawList),
}

/// A dependency-tracked wrapper around a raw map or list.
///
/// Obtained from [`Runtime::reactive`]; wrapping the same raw container
/// twice yields wrappers that compare equal and share all state.
#[derive(Clone)]
pub struct Reactive {
    runtime: Runtime,
    target: Target,
    /// Per-key dependency sets, created on first read of each key.
    keys: Arc<Mutex<HashMap<Key, DepId>>>,
}

impl Reactive {
    pub(crate) fn from_map(runtime: Runtime, map: RawMap) -> Self {
        Self {
            runtime,
            target: Target::Map(map),
            keys: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn from_list(runtime: Runtime, list: RawList) -> Self {
        Self {
            runtime,
            target: Target::List(list),
            keys: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether this wrapper is over a list target.
    pub fn is_list(&self) -> bool {
        matches!(self.target, Target::List(_))
    }

    fn dep_for(&self, key: &Key) -> DepId {
        let mut keys = self.keys.lock();
        *keys.entry(key.clone()).or_insert_with(DepId::new)
    }

    fn existing_dep(&self, key: &Key) -> Option<DepId> {
        self.keys.lock().get(key).copied()
    }

    fn trigger_key(&self, key: &Key) {
        // A key nobody ever read has no dependency set; nothing to notify.
        if let Some(dep) = self.existing_dep(key) {
            self.runtime.trigger(dep);
        }
    }

    /// Read one key.
    ///
    /// Subscribes the running effect to this key and returns the stored
    /// value, wrapping a nested raw map or list to its reactive form.
    /// Missing properties and out-of-range indices read as [`Value::Null`];
    /// `Key::Len` reads as the current length.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        let dep = self.dep_for(&key);
        self.runtime.track(dep);

        let raw = match (&self.target, &key) {
            (Target::Map(map), Key::Prop(name)) => {
                map.read().get(name).cloned().unwrap_or(Value::Null)
            }
            (Target::List(list), Key::Index(index)) => {
                list.read().get(*index).cloned().unwrap_or(Value::Null)
            }
            (Target::Map(map), Key::Len) => Value::Int(map.read().len() as i64),
            (Target::List(list), Key::Len) => Value::Int(list.read().len() as i64),
            // Shape-mismatched addresses hold nothing.
            _ => Value::Null,
        };

        self.runtime.reactive(raw)
    }

    /// Write one key and notify its subscribers.
    ///
    /// The value is stored raw. Notification is unconditional: overwriting
    /// with an equal value still notifies. List writes at or past the
    /// current length also notify `Len`, as does inserting a new map key.
    /// Writing `Key::Len` on a list resizes it (null-filling growth) and
    /// notifies `Len` plus each removed index. Shape-mismatched writes
    /// (a property on a list, an index or `Len` on a map) are ignored.
    pub fn set(&self, key: impl Into<Key>, value: Value) {
        let key = key.into();
        match (&self.target, &key) {
            (Target::Map(map), Key::Prop(name)) => {
                let added = map.write().insert(name.clone(), value).is_none();
                self.trigger_key(&key);
                if added {
                    self.trigger_key(&Key::Len);
                }
            }
            (Target::List(list), Key::Index(index)) => {
                let grew = {
                    let mut guard = list.write();
                    if *index >= guard.len() {
                        guard.resize(*index + 1, Value::Null);
                        guard[*index] = value;
                        true
                    } else {
                        guard[*index] = value;
                        false
                    }
                };
                self.trigger_key(&key);
                if grew {
                    self.trigger_key(&Key::Len);
                }
            }
            (Target::List(list), Key::Len) => {
                let Ok(requested) = value.as_int() else { return };
                let new_len = requested.max(0) as usize;
                let removed: Vec<usize> = {
                    let mut guard = list.write();
                    let old_len = guard.len();
                    guard.resize(new_len, Value::Null);
                    (new_len..old_len).collect()
                };
                for index in removed {
                    self.trigger_key(&Key::Index(index));
                }
                self.trigger_key(&Key::Len);
            }
            _ => {}
        }
    }

    /// Remove a map entry, notifying the key and `Len` when it existed.
    /// No-op on lists and absent keys.
    pub fn remove(&self, key: impl Into<Key>) {
        let key = key.into();
        if let (Target::Map(map), Key::Prop(name)) = (&self.target, &key) {
            let existed = map.write().shift_remove(name).is_some();
            if existed {
                self.trigger_key(&key);
                self.trigger_key(&Key::Len);
            }
        }
    }

    /// Append to a list target, notifying the new index and `Len`.
    /// No-op on maps.
    pub fn push(&self, value: Value) {
        if let Target::List(list) = &self.target {
            let index = {
                let mut guard = list.write();
                guard.push(value);
                guard.len() - 1
            };
            self.trigger_key(&Key::Index(index));
            self.trigger_key(&Key::Len);
        }
    }

    /// Current length (list items or map entries). A tracked read of `Len`.
    pub fn len(&self) -> usize {
        let dep = self.dep_for(&Key::Len);
        self.runtime.track(dep);
        match &self.target {
            Target::Map(map) => map.read().len(),
            Target::List(list) => list.read().len(),
        }
    }

    /// Whether the target is empty. A tracked read of `Len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw target this wrapper guards, as an untracked value.
    pub fn raw(&self) -> Value {
        match &self.target {
            Target::Map(map) => Value::Map(Arc::clone(map)),
            Target::List(list) => Value::List(Arc::clone(list)),
        }
    }

    /// Identity comparison: do both wrappers guard one raw target?
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        match (&self.target, &other.target) {
            (Target::Map(a), Target::Map(b)) => Arc::ptr_eq(a, b),
            (Target::List(a), Target::List(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Reactive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_list() { "list" } else { "map" };
        f.debug_struct("Reactive").field("target", &kind).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
