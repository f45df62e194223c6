//! Trellis Core
//!
//! This crate provides the reactive core of the Trellis UI framework: the
//! value/effect/dependency subsystem that lets mutable state cells notify
//! the computations reading them, so those computations re-execute exactly
//! when their observed inputs change.
//!
//! It implements:
//!
//! - Reactive primitives (signals, reactive objects, computed values)
//! - Automatic dependency tracking with per-run subscription cleanup
//! - Effect lifecycle management (scopes, batched flushing)
//! - A dynamic value model with snapshot serialization
//!
//! Template compilation and rendering consume these primitives but live
//! elsewhere; this crate has no host bindings, no wire format, and no
//! persistence.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `value`: the dynamically shaped [`Value`](value::Value) union shared by
//!   all reactive state
//! - `reactive`: dependency tracking, signals, objects, effects, and scopes
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::reactive::{Effect, Runtime, Signal};
//!
//! let rt = Runtime::new();
//! let count = Signal::new(&rt, 0);
//!
//! // Create an effect
//! let reader = count.clone();
//! Effect::new(&rt, move || {
//!     println!("count: {:?}", reader.get());
//! });
//!
//! // Update the signal
//! count.set(5);
//! // Effect automatically re-runs, prints: "count: Int(5)"
//! ```

pub mod reactive;
pub mod value;
