//! Effect Implementation
//!
//! An Effect is a re-runnable computation and the unit of subscription in
//! the dependency graph: reactive reads performed while its body runs
//! subscribe it to those sources.
//!
//! # How Effects Work
//!
//! 1. When created with [`Effect::new`], the effect runs its body
//!    immediately to establish initial dependencies.
//!
//! 2. When any dependency changes, the effect re-runs, or, if it carries a
//!    scheduler, the scheduler is invoked instead and decides when (and
//!    whether) the body runs again.
//!
//! 3. Before re-running, the effect's old subscriptions are dropped and new
//!    ones are recorded during execution, so conditional reads never leave
//!    stale subscriptions behind.
//!
//! # Stopping
//!
//! [`Effect::stop`] unsubscribes the effect everywhere and marks it
//! permanently inactive; it will never be notified or re-subscribe again.
//! Stopping twice is a no-op.

use std::sync::Arc;

use super::handle::EffectId;
use super::runtime::Runtime;

/// A re-runnable computation that subscribes to what it reads.
///
/// `Effect` is a cheap handle; clones address the same computation.
///
/// # Example
///
/// ```rust,ignore
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 0);
///
/// let effect = Effect::new(&rt, move || {
///     println!("count is {:?}", count.get());
/// });
///
/// count.set(5); // prints again
/// effect.stop();
/// count.set(6); // silence
/// ```
#[derive(Clone)]
pub struct Effect {
    runtime: Runtime,
    id: EffectId,
}

impl Effect {
    /// Create an effect and run it immediately to establish dependencies.
    pub fn new<F>(runtime: &Runtime, body: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(runtime, body);
        effect.run();
        effect
    }

    /// Create an effect without running it.
    ///
    /// It subscribes to nothing until the first [`run`](Effect::run).
    pub fn new_lazy<F>(runtime: &Runtime, body: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = runtime.create_effect(Arc::new(body), None);
        Self {
            runtime: runtime.clone(),
            id,
        }
    }

    /// Create an effect with a scheduler and run the body once immediately.
    ///
    /// On trigger, the scheduler is invoked instead of the body; it may run
    /// the effect right away, enqueue it somewhere, or drop the notification.
    pub fn with_scheduler<F, S>(runtime: &Runtime, body: F, scheduler: S) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        S: Fn() + Send + Sync + 'static,
    {
        let effect = Self::with_scheduler_lazy(runtime, body, scheduler);
        effect.run();
        effect
    }

    /// Create a scheduled effect without running it.
    pub fn with_scheduler_lazy<F, S>(runtime: &Runtime, body: F, scheduler: S) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        S: Fn() + Send + Sync + 'static,
    {
        let id = runtime.create_effect(Arc::new(body), Some(Arc::new(scheduler)));
        Self {
            runtime: runtime.clone(),
            id,
        }
    }

    /// Get the effect's handle.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Execute the body inside a tracking context.
    ///
    /// Subscriptions from the previous run are dropped first. Running a
    /// stopped effect executes the body once without tracking anything.
    pub fn run(&self) {
        self.runtime.run_effect(self.id);
    }

    /// Stop the effect. Idempotent.
    pub fn stop(&self) {
        self.runtime.stop_effect(self.id);
    }

    /// Whether the effect has not been stopped.
    pub fn is_active(&self) -> bool {
        self.runtime.effect_is_active(self.id)
    }

    /// How many dependency sets the effect currently belongs to.
    pub fn dependency_count(&self) -> usize {
        self.runtime.effect_dep_count(self.id)
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id.raw())
            .field("active", &self.is_active())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
