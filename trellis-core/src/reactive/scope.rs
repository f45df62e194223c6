//! Effect Scopes
//!
//! A scope groups the effects created inside it so they can be torn down
//! together. Components are the motivating case: everything a component
//! sets up while mounting is collected in one scope, and unmounting is a
//! single `stop`.
//!
//! Scope membership is bookkeeping for bulk teardown only; it plays no
//! part in track/trigger correctness. Scopes nest: a scope created while
//! another is entered becomes its child and is stopped with it, unless
//! created with [`EffectScope::detached`].

use super::handle::ScopeId;
use super::runtime::Runtime;

/// A group of effects with a shared lifetime.
///
/// # Example
///
/// ```rust,ignore
/// let scope = EffectScope::new(&rt);
/// scope.run(|| {
///     Effect::new(&rt, || { /* owned by the scope */ });
/// });
/// scope.stop(); // stops everything created inside
/// ```
#[derive(Clone)]
pub struct EffectScope {
    runtime: Runtime,
    id: ScopeId,
}

impl EffectScope {
    /// Create a scope. If another scope is currently entered, the new scope
    /// becomes its child and is stopped with it.
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            id: runtime.create_scope(false),
        }
    }

    /// Create a scope that never attaches to an enclosing scope.
    pub fn detached(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            id: runtime.create_scope(true),
        }
    }

    /// Get the scope's handle.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Run `f` with this scope entered; effects created inside become its
    /// children. Returns `None` without executing `f` if the scope has been
    /// stopped.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if !self.runtime.scope_is_active(self.id) {
            return None;
        }
        let _guard = self.runtime.enter_scope(self.id);
        Some(f())
    }

    /// Stop every owned effect and nested scope, transitively. Idempotent.
    pub fn stop(&self) {
        self.runtime.stop_scope(self.id);
    }

    /// Whether the scope has not been stopped.
    pub fn is_active(&self) -> bool {
        self.runtime.scope_is_active(self.id)
    }
}

impl std::fmt::Debug for EffectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectScope")
            .field("id", &self.id.raw())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn stop_stops_owned_effects() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let runs = Arc::new(AtomicI32::new(0));

        let scope = EffectScope::new(&rt);
        scope.run(|| {
            let runs_inner = runs.clone();
            let signal_inner = signal.clone();
            Effect::new(&rt, move || {
                runs_inner.fetch_add(1, Ordering::SeqCst);
                let _ = signal_inner.get();
            });
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        signal.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        scope.stop();
        signal.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn effect_outside_scope_is_unaffected() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let runs = Arc::new(AtomicI32::new(0));

        let scope = EffectScope::new(&rt);
        scope.run(|| {});

        // Created while the scope exists but not entered: not owned.
        let runs_inner = runs.clone();
        let signal_inner = signal.clone();
        Effect::new(&rt, move || {
            runs_inner.fetch_add(1, Ordering::SeqCst);
            let _ = signal_inner.get();
        });

        scope.stop();
        signal.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn nested_scopes_stop_transitively() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let runs = Arc::new(AtomicI32::new(0));

        let outer = EffectScope::new(&rt);
        outer.run(|| {
            let inner = EffectScope::new(&rt);
            inner.run(|| {
                let runs_inner = runs.clone();
                let signal_inner = signal.clone();
                Effect::new(&rt, move || {
                    runs_inner.fetch_add(1, Ordering::SeqCst);
                    let _ = signal_inner.get();
                });
            });
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        outer.stop();
        signal.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detached_scope_survives_parent_stop() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let runs = Arc::new(AtomicI32::new(0));

        let outer = EffectScope::new(&rt);
        let mut detached = None;
        outer.run(|| {
            let scope = EffectScope::detached(&rt);
            scope.run(|| {
                let runs_inner = runs.clone();
                let signal_inner = signal.clone();
                Effect::new(&rt, move || {
                    runs_inner.fetch_add(1, Ordering::SeqCst);
                    let _ = signal_inner.get();
                });
            });
            detached = Some(scope);
        });

        outer.stop();
        signal.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        detached.unwrap().stop();
        signal.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stop_twice_is_noop() {
        let rt = Runtime::new();
        let scope = EffectScope::new(&rt);
        scope.run(|| {
            Effect::new(&rt, || {});
        });

        scope.stop();
        scope.stop();
        assert!(!scope.is_active());
    }

    #[test]
    fn run_after_stop_returns_none() {
        let rt = Runtime::new();
        let scope = EffectScope::new(&rt);

        assert_eq!(scope.run(|| 1), Some(1));
        scope.stop();
        assert_eq!(scope.run(|| 2), None);
    }
}
