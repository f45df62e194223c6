//! Handle types for the reactive graph.
//!
//! Every participant in the dependency graph is addressed by an opaque
//! integer handle rather than a reference: effects, dependency sets, and
//! scopes. Membership (which effect belongs to which dependency set, which
//! scope owns which effect) is stored as sets of handles inside the runtime,
//! so the two sides of a relationship never own each other.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a dependency set.
///
/// One `DepId` guards one reactive source: a signal's value cell, or one
/// key of a reactive object. The set of subscribed effects it names is
/// materialized in the runtime only once something actually tracks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepId(u64);

impl DepId {
    /// Generate a new unique dependency-set ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for DepId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an effect scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        assert_ne!(EffectId::new(), EffectId::new());
        assert_ne!(DepId::new(), DepId::new());
        assert_ne!(ScopeId::new(), ScopeId::new());
    }

    #[test]
    fn handle_kinds_are_independent_counters() {
        let e = EffectId::new();
        let d = DepId::new();
        // Raw values may collide across kinds; the types keep them apart.
        let _ = (e.raw(), d.raw());
    }
}
