//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, reactive
//! objects, computed values, effects, and scopes. These primitives form the
//! foundation of Trellis's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a container for one mutable value. When a signal is read
//! while an effect runs, the signal registers that effect as a subscriber;
//! when the signal is written, all subscribers re-run.
//!
//! ## Reactive objects
//!
//! A [`Reactive`] wraps a map or list so every key behaves like an
//! independent signal: readers of one key are untouched by writes to
//! another. Nested objects become reactive lazily, on first read.
//!
//! ## Effects
//!
//! An [`Effect`] is a side-effecting computation that re-runs whenever its
//! dependencies change, the unit of subscription in the dependency graph.
//! An [`EffectScope`] groups effects for bulk teardown, and a [`FlushQueue`]
//! batches their re-runs.
//!
//! # Implementation Notes
//!
//! Dependency detection is automatic: while an effect's body runs, the
//! runtime marks it as the active observer, and every reactive read
//! subscribes it to the source being read. Before each re-run the effect's
//! previous subscriptions are dropped, so the graph always reflects the
//! latest run's actual reads.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod computed;
mod context;
mod effect;
mod handle;
mod object;
mod runtime;
mod scheduler;
mod scope;
mod signal;

pub use computed::Computed;
pub use effect::Effect;
pub use handle::{DepId, EffectId, ScopeId};
pub use object::{Key, Reactive};
pub use runtime::Runtime;
pub use scheduler::FlushQueue;
pub use scope::EffectScope;
pub use signal::{Bindings, Signal};
