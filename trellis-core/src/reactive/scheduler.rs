//! Flush Queue
//!
//! Effects that re-run synchronously on every write are the default, but a
//! renderer typically wants batching: apply a burst of state writes, then
//! re-run each affected effect once. The flush queue is that batching
//! scheduler.
//!
//! # How It Works
//!
//! 1. [`FlushQueue::effect`] creates an effect whose scheduler enqueues the
//!    effect's id instead of running it.
//!
//! 2. Triggers during a batch deduplicate: an effect already pending is not
//!    enqueued again, so N writes cost one re-run.
//!
//! 3. [`FlushQueue::flush`] drains the queue in insertion order, running
//!    each effect through the runtime (with the usual cleanup-and-retrack).
//!    Jobs enqueued *by* the flushed jobs are drained in the same call, so
//!    a flush returns with the queue empty.
//!
//! Nothing here is asynchronous: an unflushed queue simply holds its jobs
//! until the host decides to flush.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::effect::Effect;
use super::handle::EffectId;
use super::runtime::Runtime;

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<EffectId>,
    pending: HashSet<EffectId>,
}

/// A batching scheduler for effects.
///
/// # Example
///
/// ```rust,ignore
/// let queue = FlushQueue::new(&rt);
/// let _effect = queue.effect(move || {
///     render(state.get());
/// });
///
/// state.set(1); // queued
/// state.set(2); // deduplicated
/// queue.flush(); // one re-run, sees 2
/// ```
#[derive(Clone)]
pub struct FlushQueue {
    runtime: Runtime,
    state: Arc<Mutex<QueueState>>,
}

impl FlushQueue {
    /// Create an empty queue on `runtime`.
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    /// Create an effect that batches through this queue.
    ///
    /// The body runs once immediately to establish dependencies; afterwards
    /// every trigger enqueues instead of running.
    pub fn effect<F>(&self, body: F) -> Effect
    where
        F: Fn() + Send + Sync + 'static,
    {
        // The scheduler needs the effect's id before the effect exists, so
        // it reads the id out of a slot filled right after creation. The
        // slot is written before the first run, and triggers can only
        // originate from a run.
        let slot: Arc<OnceLock<EffectId>> = Arc::new(OnceLock::new());

        let queue = self.clone();
        let slot_inner = Arc::clone(&slot);
        let effect = Effect::with_scheduler_lazy(&self.runtime, body, move || {
            if let Some(&id) = slot_inner.get() {
                queue.enqueue(id);
            }
        });

        let _ = slot.set(effect.id());
        effect.run();
        effect
    }

    /// Enqueue an effect for the next flush. Deduplicates while pending.
    pub fn enqueue(&self, id: EffectId) {
        let mut state = self.state.lock();
        if state.pending.insert(id) {
            state.jobs.push_back(id);
        }
    }

    /// Number of jobs waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Run every queued effect once, in insertion order, then jobs they
    /// enqueued in turn, until the queue is dry.
    pub fn flush(&self) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.jobs.pop_front() {
                    Some(id) => {
                        state.pending.remove(&id);
                        Some(id)
                    }
                    None => None,
                }
            };
            let Some(id) = next else { break };
            self.runtime.run_effect(id);
        }
    }
}
