//! Computed Values
//!
//! A Computed is a cached derived value: a getter whose result is stored
//! and re-used until one of the sources it read changes.
//!
//! # Push-invalidate, pull-recompute
//!
//! A source write does not recompute anything. It flips the computed's
//! dirty flag (through the inner effect's scheduler) and notifies the
//! computed's own subscribers, once per dirtying, however many writes
//! arrive before the next read. The getter actually re-executes on the next
//! [`get`](Computed::get), so computed values that nobody reads cost
//! nothing when their inputs churn.
//!
//! Reading a computed inside an effect chains subscriptions: the effect
//! subscribes to the computed, the computed's getter subscribes to its
//! sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::value::Value;

use super::effect::Effect;
use super::handle::DepId;
use super::runtime::Runtime;

/// A cached derived value that recomputes only when dirty.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(&rt, 2);
/// let doubled = {
///     let count = count.clone();
///     Computed::new(&rt, move || {
///         Value::from(count.get().as_int().unwrap() * 2)
///     })
/// };
///
/// assert_eq!(doubled.get(), Value::from(4));
/// count.set(5); // marks dirty, nothing recomputes yet
/// assert_eq!(doubled.get(), Value::from(10));
/// ```
#[derive(Clone)]
pub struct Computed {
    runtime: Runtime,
    /// Runs the getter with the computed as observer; its scheduler flips
    /// the dirty flag instead of recomputing.
    effect: Effect,
    value: Arc<RwLock<Value>>,
    dirty: Arc<AtomicBool>,
    /// Guards readers of the computed itself.
    dep: DepId,
}

impl Computed {
    /// Create a computed value. The getter does not run until first read.
    pub fn new<F>(runtime: &Runtime, getter: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let value = Arc::new(RwLock::new(Value::Null));
        let dirty = Arc::new(AtomicBool::new(true));
        let dep = DepId::new();

        let body = {
            let value = Arc::clone(&value);
            move || {
                *value.write() = getter();
            }
        };

        let scheduler = {
            let dirty = Arc::clone(&dirty);
            let runtime = runtime.clone();
            move || {
                // Invalidate once; further source writes before the next
                // read are already covered.
                if !dirty.swap(true, Ordering::SeqCst) {
                    runtime.trigger(dep);
                }
            }
        };

        let effect = Effect::with_scheduler_lazy(runtime, body, scheduler);

        Self {
            runtime: runtime.clone(),
            effect,
            value,
            dirty,
            dep,
        }
    }

    /// Get the current value, recomputing if a source changed since the
    /// last read. Subscribes the running effect to this computed.
    pub fn get(&self) -> Value {
        self.runtime.track(self.dep);
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.effect.run();
        }
        self.value.read().clone()
    }

    /// Get the cached value without tracking or recomputing.
    pub fn get_untracked(&self) -> Value {
        self.value.read().clone()
    }

    /// Whether a source changed since the last read.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Stop observing sources. Reads keep returning the cached value.
    pub fn stop(&self) {
        self.effect.stop();
    }
}

impl std::fmt::Debug for Computed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("dirty", &self.is_dirty())
            .field("value", &self.value.read())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn computes_lazily_and_caches() {
        let rt = Runtime::new();
        let source = Signal::new(&rt, 2);
        let computes = Arc::new(AtomicI32::new(0));

        let computes_inner = computes.clone();
        let source_inner = source.clone();
        let doubled = Computed::new(&rt, move || {
            computes_inner.fetch_add(1, Ordering::SeqCst);
            Value::from(source_inner.get().as_int().unwrap() * 2)
        });

        // Nothing runs until first read.
        assert_eq!(computes.load(Ordering::SeqCst), 0);

        assert_eq!(doubled.get(), Value::from(4));
        assert_eq!(doubled.get(), Value::from(4));
        assert_eq!(doubled.get(), Value::from(4));
        assert_eq!(computes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn source_write_invalidates_without_recomputing() {
        let rt = Runtime::new();
        let source = Signal::new(&rt, 2);
        let computes = Arc::new(AtomicI32::new(0));

        let computes_inner = computes.clone();
        let source_inner = source.clone();
        let doubled = Computed::new(&rt, move || {
            computes_inner.fetch_add(1, Ordering::SeqCst);
            Value::from(source_inner.get().as_int().unwrap() * 2)
        });
        assert_eq!(doubled.get(), Value::from(4));

        // Many writes, zero recomputes until the next read.
        source.set(3);
        source.set(4);
        source.set(5);
        assert!(doubled.is_dirty());
        assert_eq!(computes.load(Ordering::SeqCst), 1);

        assert_eq!(doubled.get(), Value::from(10));
        assert_eq!(computes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn effect_reading_computed_reruns_on_source_write() {
        let rt = Runtime::new();
        let source = Signal::new(&rt, 1);

        let source_inner = source.clone();
        let plus_one = Computed::new(&rt, move || {
            Value::from(source_inner.get().as_int().unwrap() + 1)
        });

        let seen = Arc::new(AtomicI32::new(0));
        let seen_inner = seen.clone();
        let plus_one_inner = plus_one.clone();
        Effect::new(&rt, move || {
            seen_inner.store(
                plus_one_inner.get().as_int().unwrap() as i32,
                Ordering::SeqCst,
            );
        });
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        source.set(10);
        assert_eq!(seen.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn stopped_computed_serves_cache() {
        let rt = Runtime::new();
        let source = Signal::new(&rt, 1);

        let source_inner = source.clone();
        let derived = Computed::new(&rt, move || source_inner.get());
        assert_eq!(derived.get(), Value::from(1));

        derived.stop();
        source.set(2);
        assert_eq!(derived.get(), Value::from(1));
    }
}
