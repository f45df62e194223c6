//! Tracking Context
//!
//! The tracking context answers the question "what is currently executing?"
//! so that a reactive read knows which effect to subscribe. It holds a stack
//! of running effects (effects can run other effects re-entrantly), a stack
//! of entered scopes, and a pause flag for reads that must not create
//! subscriptions.
//!
//! # Implementation
//!
//! Unlike a thread-local, the context lives inside each [`Runtime`] so that
//! independent runtimes in one process never observe each other's tracking
//! state. Entry and exit go through RAII guards: the guard pushes on
//! construction and pops in `Drop`, so the stack is restored on every exit
//! path, including a panicking effect body.
//!
//! [`Runtime`]: super::Runtime

use parking_lot::Mutex;

use super::handle::{EffectId, ScopeId};

/// Mutable tracking state shared by one runtime.
#[derive(Debug, Default)]
pub(crate) struct TrackingState {
    /// Stack of currently running effects; the top is the active observer.
    observers: Vec<EffectId>,
    /// Stack of entered effect scopes; the top adopts new effects.
    scopes: Vec<ScopeId>,
    /// While set, reads do not subscribe anything.
    paused: bool,
}

impl TrackingState {
    /// The effect a reactive read should subscribe, if any.
    pub(crate) fn tracking_observer(&self) -> Option<EffectId> {
        if self.paused {
            None
        } else {
            self.observers.last().copied()
        }
    }

    /// The effect currently running, regardless of the pause flag.
    ///
    /// Used by trigger to suppress re-entrant self-triggering.
    pub(crate) fn running(&self) -> Option<EffectId> {
        self.observers.last().copied()
    }

    /// The scope new effects should register with, if any.
    pub(crate) fn entered_scope(&self) -> Option<ScopeId> {
        self.scopes.last().copied()
    }

    #[cfg(test)]
    fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Guard that marks an effect as the active observer until dropped.
pub(crate) struct ObserverGuard<'a> {
    state: &'a Mutex<TrackingState>,
    id: EffectId,
}

impl<'a> ObserverGuard<'a> {
    pub(crate) fn enter(state: &'a Mutex<TrackingState>, id: EffectId) -> Self {
        state.lock().observers.push(id);
        Self { state, id }
    }
}

impl Drop for ObserverGuard<'_> {
    fn drop(&mut self) {
        let popped = self.state.lock().observers.pop();

        // Verify we're popping the right entry. This helps catch bugs where
        // guards are dropped out of order.
        debug_assert_eq!(
            popped,
            Some(self.id),
            "observer stack mismatch: expected {:?}, got {:?}",
            self.id,
            popped
        );
    }
}

/// Guard that marks a scope as entered until dropped.
pub(crate) struct ScopeGuard<'a> {
    state: &'a Mutex<TrackingState>,
    id: ScopeId,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn enter(state: &'a Mutex<TrackingState>, id: ScopeId) -> Self {
        state.lock().scopes.push(id);
        Self { state, id }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let popped = self.state.lock().scopes.pop();
        debug_assert_eq!(
            popped,
            Some(self.id),
            "scope stack mismatch: expected {:?}, got {:?}",
            self.id,
            popped
        );
    }
}

/// Guard that overrides the pause flag until dropped.
///
/// The flag is a saved-and-restored boolean rather than a counter: it is
/// only ever scoped around a single closure or effect body, so nesting
/// degenerates to restoring the previous value.
pub(crate) struct PauseGuard<'a> {
    state: &'a Mutex<TrackingState>,
    previous: bool,
}

impl<'a> PauseGuard<'a> {
    /// Disable tracking until the guard drops.
    pub(crate) fn pause(state: &'a Mutex<TrackingState>) -> Self {
        Self::set(state, true)
    }

    /// Re-enable tracking until the guard drops. Every effect body runs
    /// under this, so an effect created inside an untracked region still
    /// tracks its own reads.
    pub(crate) fn resume(state: &'a Mutex<TrackingState>) -> Self {
        Self::set(state, false)
    }

    fn set(state: &'a Mutex<TrackingState>, paused: bool) -> Self {
        let previous = {
            let mut guard = state.lock();
            std::mem::replace(&mut guard.paused, paused)
        };
        Self { state, previous }
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().paused = self.previous;
    }
}
