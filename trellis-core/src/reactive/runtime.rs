//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, reactive
//! objects, effects, and scopes. It owns the dependency graph and propagates
//! changes when sources are written.
//!
//! # How It Works
//!
//! 1. Every reactive source (a signal's cell, one key of a reactive object)
//!    is guarded by a [`DepId`]. The set of effects subscribed to it is
//!    materialized lazily, on first track.
//!
//! 2. While an effect runs, reads call [`Runtime::track`], which links the
//!    effect and the dependency set in both directions.
//!
//! 3. A write calls [`Runtime::trigger`], which snapshots the set's members
//!    and re-runs (or reschedules) each one. Snapshotting is load-bearing:
//!    a re-running effect unsubscribes and resubscribes to the very sets
//!    being iterated.
//!
//! 4. Before an effect's body re-executes, every dependency set it belongs
//!    to drops it and its own list is cleared, so a branch not taken this
//!    run leaves no stale subscription behind.
//!
//! # Re-entrancy
//!
//! Everything is synchronous and may nest: an effect body can write sources,
//! which runs other effects before the write returns. The runtime never
//! holds a lock while user code executes: membership is copied out first,
//! the same discipline as snapshotting. An effect that writes a source it
//! itself reads is skipped by that trigger, which is what keeps the graph
//! cycle-free at run time.
//!
//! # Isolation
//!
//! All graph state hangs off a cloneable `Runtime` handle. Two runtimes in
//! one process share nothing, so tests can build and tear down reactive
//! systems independently.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::value::{RawList, RawMap, Value};

use super::context::{ObserverGuard, PauseGuard, ScopeGuard, TrackingState};
use super::handle::{DepId, EffectId, ScopeId};
use super::object::Reactive;

/// A registered effect.
pub(crate) struct EffectRecord {
    /// The computation body.
    body: Arc<dyn Fn() + Send + Sync>,
    /// When present, trigger invokes this instead of running the body.
    scheduler: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Cleared exactly once by stop; never set again.
    active: bool,
    /// Dependency sets this effect currently belongs to, deduplicated.
    deps: SmallVec<[DepId; 4]>,
}

/// A registered effect scope.
pub(crate) struct ScopeRecord {
    active: bool,
    effects: Vec<EffectId>,
    children: Vec<ScopeId>,
}

struct RuntimeInner {
    /// All effects ever created on this runtime. Stopped effects stay
    /// registered (inactive) so stale snapshot deliveries stay well-defined.
    effects: DashMap<EffectId, EffectRecord>,

    /// Dependency sets, keyed by the source they guard. An entry exists only
    /// once something has tracked the source; trigger on an absent entry is
    /// a no-op.
    deps: DashMap<DepId, HashSet<EffectId>>,

    /// All effect scopes created on this runtime.
    scopes: DashMap<ScopeId, ScopeRecord>,

    /// Wrap cache for reactive objects, keyed by raw-target address. Makes
    /// wrapping idempotent and nested reads identity-stable.
    wrapped: DashMap<usize, Reactive>,

    /// Observer/scope stacks and the pause flag.
    tracking: Mutex<TrackingState>,
}

/// Handle to one reactive system instance.
///
/// Cloning is cheap and every clone addresses the same graph. Signals,
/// reactive objects, effects, and scopes each hold a clone of the runtime
/// they were created on.
///
/// # Example
///
/// ```rust,ignore
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 0);
///
/// Effect::new(&rt, move || {
///     println!("count is {:?}", count.get());
/// });
///
/// count.set(5); // effect re-runs synchronously
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a fresh, empty reactive system.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                effects: DashMap::new(),
                deps: DashMap::new(),
                scopes: DashMap::new(),
                wrapped: DashMap::new(),
                tracking: Mutex::new(TrackingState::default()),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Tracking
    // ------------------------------------------------------------------

    /// Record that the currently running effect depends on `dep`.
    ///
    /// No-op when tracking is paused, nothing is running, or the running
    /// effect has been stopped (a stopped effect never re-subscribes).
    /// Idempotent: reading the same source many times in one run subscribes
    /// once.
    pub(crate) fn track(&self, dep: DepId) {
        let observer = self.inner.tracking.lock().tracking_observer();
        let Some(effect) = observer else { return };

        if !self.effect_is_active(effect) {
            return;
        }

        let inserted = {
            let mut set = self.inner.deps.entry(dep).or_default();
            set.insert(effect)
        };
        if inserted {
            if let Some(mut record) = self.inner.effects.get_mut(&effect) {
                record.deps.push(dep);
            }
            trace!(effect = effect.raw(), dep = dep.raw(), "tracked");
        }
    }

    /// Notify every effect subscribed to `dep`.
    ///
    /// Iterates a snapshot of the membership taken up front. An effect with
    /// a scheduler is rescheduled instead of run; the effect currently
    /// running is skipped so a self-write cannot recurse.
    pub(crate) fn trigger(&self, dep: DepId) {
        let snapshot: Vec<EffectId> = match self.inner.deps.get(&dep) {
            Some(set) => set.iter().copied().collect(),
            None => return, // never tracked
        };

        if snapshot.is_empty() {
            return;
        }

        let running = self.inner.tracking.lock().running();
        trace!(dep = dep.raw(), subscribers = snapshot.len(), "trigger");

        for effect in snapshot {
            if running == Some(effect) {
                continue;
            }

            let scheduler = match self.inner.effects.get(&effect) {
                Some(record) => record.scheduler.clone(),
                None => continue,
            };

            match scheduler {
                Some(schedule) => schedule(),
                None => self.run_effect(effect),
            }
        }
    }

    /// Run `f` with dependency tracking paused.
    ///
    /// Reads inside `f` return current values without subscribing anything.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _pause = PauseGuard::pause(&self.inner.tracking);
        f()
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    pub(crate) fn create_effect(
        &self,
        body: Arc<dyn Fn() + Send + Sync>,
        scheduler: Option<Arc<dyn Fn() + Send + Sync>>,
    ) -> EffectId {
        let id = EffectId::new();
        self.inner.effects.insert(
            id,
            EffectRecord {
                body,
                scheduler,
                active: true,
                deps: SmallVec::new(),
            },
        );

        // Effects created inside `scope.run(..)` belong to that scope.
        let scope = self.inner.tracking.lock().entered_scope();
        if let Some(scope) = scope {
            if let Some(mut record) = self.inner.scopes.get_mut(&scope) {
                record.effects.push(id);
            }
        }

        id
    }

    /// Execute an effect's body inside a tracking context.
    ///
    /// Subscriptions from the previous run are dropped first, then the body
    /// runs with this effect as the active observer. A panic in the body
    /// propagates to the caller after the observer stack is restored.
    ///
    /// A stopped effect can still land here through a trigger snapshot taken
    /// before the stop, or an explicit `run`; its body executes once with
    /// tracking paused, so it cannot re-subscribe.
    pub(crate) fn run_effect(&self, id: EffectId) {
        let (body, active) = match self.inner.effects.get(&id) {
            Some(record) => (record.body.clone(), record.active),
            None => return,
        };

        if !active {
            let _pause = PauseGuard::pause(&self.inner.tracking);
            body();
            return;
        }

        self.cleanup_effect(id);

        // The body is a fresh tracking context: re-enable tracking for its
        // duration even when the caller sits inside an untracked region.
        let _resume = PauseGuard::resume(&self.inner.tracking);
        let _observer = ObserverGuard::enter(&self.inner.tracking, id);
        body();
    }

    /// Remove the effect from every dependency set it belongs to and clear
    /// its own list. Runs before every re-execution and on stop.
    fn cleanup_effect(&self, id: EffectId) {
        let taken: SmallVec<[DepId; 4]> = match self.inner.effects.get_mut(&id) {
            Some(mut record) => std::mem::take(&mut record.deps),
            None => return,
        };

        for dep in taken {
            if let Some(mut set) = self.inner.deps.get_mut(&dep) {
                set.remove(&id);
            }
        }
    }

    /// Stop an effect: unsubscribe everywhere, mark permanently inactive.
    /// Idempotent.
    pub(crate) fn stop_effect(&self, id: EffectId) {
        {
            let Some(mut record) = self.inner.effects.get_mut(&id) else {
                return;
            };
            if !record.active {
                return;
            }
            record.active = false;
        }

        self.cleanup_effect(id);
        debug!(effect = id.raw(), "effect stopped");
    }

    pub(crate) fn effect_is_active(&self, id: EffectId) -> bool {
        self.inner
            .effects
            .get(&id)
            .map(|record| record.active)
            .unwrap_or(false)
    }

    pub(crate) fn effect_dep_count(&self, id: EffectId) -> usize {
        self.inner
            .effects
            .get(&id)
            .map(|record| record.deps.len())
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    pub(crate) fn create_scope(&self, detached: bool) -> ScopeId {
        let id = ScopeId::new();
        self.inner.scopes.insert(
            id,
            ScopeRecord {
                active: true,
                effects: Vec::new(),
                children: Vec::new(),
            },
        );

        if !detached {
            let parent = self.inner.tracking.lock().entered_scope();
            if let Some(parent) = parent {
                if let Some(mut record) = self.inner.scopes.get_mut(&parent) {
                    record.children.push(id);
                }
            }
        }

        id
    }

    pub(crate) fn enter_scope(&self, id: ScopeId) -> ScopeGuard<'_> {
        ScopeGuard::enter(&self.inner.tracking, id)
    }

    /// Stop a scope: every owned effect and nested scope, transitively,
    /// exactly once. Idempotent.
    pub(crate) fn stop_scope(&self, id: ScopeId) {
        let (effects, children) = {
            let Some(mut record) = self.inner.scopes.get_mut(&id) else {
                return;
            };
            if !record.active {
                return;
            }
            record.active = false;
            (
                std::mem::take(&mut record.effects),
                std::mem::take(&mut record.children),
            )
        };

        for effect in effects {
            self.stop_effect(effect);
        }
        for child in children {
            self.stop_scope(child);
        }
        debug!(scope = id.raw(), "scope stopped");
    }

    pub(crate) fn scope_is_active(&self, id: ScopeId) -> bool {
        self.inner
            .scopes
            .get(&id)
            .map(|record| record.active)
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Wrapping
    // ------------------------------------------------------------------

    /// Convert a raw value to its reactive form.
    ///
    /// Raw maps and lists become [`Value::Reactive`] wrappers; everything
    /// else (scalars, signals, already-wrapped objects) passes through
    /// unchanged. Wrapping is idempotent by identity: the same raw container
    /// always yields the same wrapper.
    pub fn reactive(&self, value: Value) -> Value {
        match value {
            Value::Map(map) => Value::Reactive(self.wrap_map(map)),
            Value::List(list) => Value::Reactive(self.wrap_list(list)),
            other => other,
        }
    }

    pub(crate) fn wrap_map(&self, map: RawMap) -> Reactive {
        let key = Arc::as_ptr(&map) as *const () as usize;
        self.inner
            .wrapped
            .entry(key)
            .or_insert_with(|| Reactive::from_map(self.clone(), map))
            .clone()
    }

    pub(crate) fn wrap_list(&self, list: RawList) -> Reactive {
        let key = Arc::as_ptr(&list) as *const () as usize;
        self.inner
            .wrapped
            .entry(key)
            .or_insert_with(|| Reactive::from_list(self.clone(), list))
            .clone()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("effects", &self.inner.effects.len())
            .field("deps", &self.inner.deps.len())
            .field("scopes", &self.inner.scopes.len())
            .finish()
    }
}
