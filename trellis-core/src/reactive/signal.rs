//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive: one mutable [`Value`]
//! cell that tracks which computations read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is running, the signal's
//!    dependency set records that effect as a subscriber.
//!
//! 2. When a signal's value is written, every subscriber is notified.
//!    Writes always notify: there is no old-versus-new comparison, so
//!    assigning an equal value still re-runs subscribers. Downstream code
//!    may rely on write-always-notifies, so this stays as-is.
//!
//! 3. Object values are converted to their reactive form when they enter
//!    the cell (at construction and on set), not on every read.
//!
//! Signals are `Clone`; clones share one cell and one subscriber set.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::{RawMap, Value};

use super::handle::DepId;
use super::runtime::Runtime;

/// A reactive value cell.
///
/// # Example
///
/// ```rust,ignore
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 0);
///
/// // Read the value (subscribes the running effect, if any)
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
#[derive(Clone)]
pub struct Signal {
    runtime: Runtime,
    /// Guards the cell. The set of subscribers it names is created in the
    /// runtime on first track and reused for the signal's whole life.
    dep: DepId,
    value: Arc<RwLock<Value>>,
}

impl Signal {
    /// Create a new signal holding `value`.
    ///
    /// A plain map or list value is wrapped to its reactive form here, once.
    pub fn new(runtime: &Runtime, value: impl Into<Value>) -> Self {
        let value = runtime.reactive(value.into());
        Self {
            runtime: runtime.clone(),
            dep: DepId::new(),
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Get the current value.
    ///
    /// If called while an effect is running, registers that effect as a
    /// subscriber.
    pub fn get(&self) -> Value {
        self.runtime.track(self.dep);
        self.value.read().clone()
    }

    /// Get the current value without tracking a dependency.
    pub fn get_untracked(&self) -> Value {
        self.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Notifies unconditionally, even when `value` equals the current
    /// contents.
    pub fn set(&self, value: impl Into<Value>) {
        let value = self.runtime.reactive(value.into());
        {
            let mut guard = self.value.write();
            *guard = value;
        }
        self.runtime.trigger(self.dep);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let current = self.value.read().clone();
        self.set(f(&current));
    }

    /// Identity comparison: do both handles share one cell?
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("dep", &self.dep.raw())
            .field("value", &self.value.read())
            .finish()
    }
}

/// View over a map of signals that reads and writes through them.
///
/// Structured state bags mix signal and plain fields; a `Bindings` view
/// exposes both uniformly. `get` unwraps a signal slot to its current value
/// (a tracked read); `set` writes through to an existing signal's cell
/// (preserving the cell and its subscribers) when the incoming value is not
/// itself a signal, and replaces the slot raw otherwise.
pub struct Bindings {
    target: RawMap,
}

impl Bindings {
    /// Create a view over `target`.
    pub fn new(target: RawMap) -> Self {
        Self { target }
    }

    /// Read a field, unwrapping a signal slot.
    ///
    /// Missing fields read as [`Value::Null`].
    pub fn get(&self, key: &str) -> Value {
        let slot = self.target.read().get(key).cloned();
        match slot {
            Some(Value::Signal(signal)) => signal.get(),
            Some(value) => value,
            None => Value::Null,
        }
    }

    /// Write a field, writing through a signal slot.
    pub fn set(&self, key: &str, value: Value) {
        let existing = self.target.read().get(key).cloned();
        match existing {
            Some(Value::Signal(signal)) if !value.is_signal() => signal.set(value),
            _ => {
                self.target.write().insert(key.to_string(), value);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
