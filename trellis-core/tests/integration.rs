//! Integration Tests for the Reactive System
//!
//! These tests verify that signals, reactive objects, computed values,
//! effects, and scopes work together correctly.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::Mutex;

use trellis_core::reactive::{
    Computed, Effect, EffectScope, FlushQueue, Runtime, Signal,
};
use trellis_core::value::Value;

/// The canonical signal/effect lifecycle: log on every run, stop, go quiet.
#[test]
fn signal_effect_lifecycle_end_to_end() {
    let rt = Runtime::new();
    let count = Signal::new(&rt, 1);
    let log: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));

    let log_inner = log.clone();
    let count_inner = count.clone();
    let effect = Effect::new(&rt, move || {
        log_inner.lock().push(count_inner.get().as_int().unwrap());
    });

    assert_eq!(*log.lock(), vec![1]);

    count.set(2);
    assert_eq!(*log.lock(), vec![1, 2]);

    effect.stop();
    count.set(3);
    assert_eq!(*log.lock(), vec![1, 2]);
}

/// Deep reads subscribe per key: a sibling write is invisible, the read key
/// re-runs the effect.
#[test]
fn nested_object_tracks_per_key() {
    let rt = Runtime::new();
    let obj = rt
        .reactive(Value::map([
            ("a", Value::from(1)),
            ("b", Value::map([("c", Value::from(2))])),
        ]))
        .as_reactive()
        .unwrap();

    let runs = Arc::new(AtomicI32::new(0));
    let seen = Arc::new(AtomicI32::new(0));

    let runs_inner = runs.clone();
    let seen_inner = seen.clone();
    let obj_inner = obj.clone();
    Effect::new(&rt, move || {
        runs_inner.fetch_add(1, Ordering::SeqCst);
        let b = obj_inner.get("b").as_reactive().unwrap();
        seen_inner.store(b.get("c").as_int().unwrap() as i32, Ordering::SeqCst);
    });
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    obj.set("a", Value::from(100));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    obj.get("b").as_reactive().unwrap().set("c", Value::from(5));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}

/// signal -> computed -> effect, driven end to end.
#[test]
fn computed_chain_propagates() {
    let rt = Runtime::new();
    let base = Signal::new(&rt, 5);

    let base_inner = base.clone();
    let doubled = Computed::new(&rt, move || {
        Value::from(base_inner.get().as_int().unwrap() * 2)
    });
    let doubled_reader = doubled.clone();
    let plus_ten = Computed::new(&rt, move || {
        Value::from(doubled_reader.get().as_int().unwrap() + 10)
    });

    let seen = Arc::new(AtomicI32::new(0));
    let seen_inner = seen.clone();
    let plus_ten_inner = plus_ten.clone();
    Effect::new(&rt, move || {
        seen_inner.store(
            plus_ten_inner.get().as_int().unwrap() as i32,
            Ordering::SeqCst,
        );
    });
    assert_eq!(seen.load(Ordering::SeqCst), 20);

    base.set(10);
    assert_eq!(seen.load(Ordering::SeqCst), 30);
    assert_eq!(doubled.get(), Value::from(20));
}

/// A component-shaped teardown: one scope owning effects over a state bag.
#[test]
fn scope_tears_down_component_state() {
    let rt = Runtime::new();
    let state = rt
        .reactive(Value::map([
            ("title", Value::from("hello")),
            ("items", Value::list([Value::from(1), Value::from(2)])),
        ]))
        .as_reactive()
        .unwrap();

    let renders = Arc::new(AtomicI32::new(0));
    let scope = EffectScope::new(&rt);

    scope.run(|| {
        let renders_inner = renders.clone();
        let state_inner = state.clone();
        Effect::new(&rt, move || {
            renders_inner.fetch_add(1, Ordering::SeqCst);
            let _ = state_inner.get("title");
        });

        let renders_inner = renders.clone();
        let state_inner = state.clone();
        Effect::new(&rt, move || {
            renders_inner.fetch_add(1, Ordering::SeqCst);
            let items = state_inner.get("items").as_reactive().unwrap();
            let _ = items.len();
        });
    });
    assert_eq!(renders.load(Ordering::SeqCst), 2);

    state.set("title", Value::from("hi"));
    assert_eq!(renders.load(Ordering::SeqCst), 3);

    state
        .get("items")
        .as_reactive()
        .unwrap()
        .push(Value::from(3));
    assert_eq!(renders.load(Ordering::SeqCst), 4);

    // Unmount: all of it goes quiet at once.
    scope.stop();
    state.set("title", Value::from("bye"));
    state
        .get("items")
        .as_reactive()
        .unwrap()
        .push(Value::from(4));
    assert_eq!(renders.load(Ordering::SeqCst), 4);
}

/// Batched rendering over a bindings view of mixed signal/plain state.
#[test]
fn bindings_with_flush_queue() {
    let rt = Runtime::new();
    let queue = FlushQueue::new(&rt);

    let count = Signal::new(&rt, 0);
    let state = Value::map([
        ("count", Value::Signal(count.clone())),
        ("label", Value::from("clicks")),
    ]);
    let bindings = Arc::new(trellis_core::reactive::Bindings::new(
        state.as_map().unwrap(),
    ));

    let renders = Arc::new(AtomicI32::new(0));
    let last = Arc::new(Mutex::new(String::new()));

    let renders_inner = renders.clone();
    let last_inner = last.clone();
    let bindings_inner = bindings.clone();
    queue.effect(move || {
        renders_inner.fetch_add(1, Ordering::SeqCst);
        let count = bindings_inner.get("count");
        let label = bindings_inner.get("label");
        *last_inner.lock() = format!(
            "{} {}",
            count.as_int().unwrap(),
            label.as_str().unwrap()
        );
    });
    assert_eq!(*last.lock(), "0 clicks");

    // Three writes through the view, one re-render.
    bindings.set("count", Value::from(1));
    bindings.set("count", Value::from(2));
    bindings.set("count", Value::from(3));
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    queue.flush();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(*last.lock(), "3 clicks");

    // The underlying signal cell was written through, not replaced.
    assert_eq!(count.get(), Value::from(3));
}

/// Writes re-run subscribers even when the value is unchanged.
#[test]
fn write_always_notifies() {
    let rt = Runtime::new();
    let signal = Signal::new(&rt, 1);
    let runs = Arc::new(AtomicI32::new(0));

    let runs_inner = runs.clone();
    let signal_inner = signal.clone();
    Effect::new(&rt, move || {
        runs_inner.fetch_add(1, Ordering::SeqCst);
        let _ = signal_inner.get();
    });

    signal.set(1);
    signal.set(1);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

/// Snapshot a whole state tree to JSON while effects stay subscribed.
#[test]
fn snapshot_does_not_disturb_subscriptions() {
    let rt = Runtime::new();
    let count = Signal::new(&rt, 1);
    let state = Value::map([
        ("count", Value::Signal(count.clone())),
        ("tags", Value::list([Value::from("a")])),
    ]);

    let runs = Arc::new(AtomicI32::new(0));
    let runs_inner = runs.clone();
    let count_inner = count.clone();
    Effect::new(&rt, move || {
        runs_inner.fetch_add(1, Ordering::SeqCst);
        let _ = count_inner.get();
    });

    assert_eq!(state.to_json().unwrap(), r#"{"count":1,"tags":["a"]}"#);
    count.set(2);
    assert_eq!(state.to_json().unwrap(), r#"{"count":2,"tags":["a"]}"#);

    // Serializing twice never subscribed anything extra: still one re-run
    // per write.
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// An effect that rewires its own dependencies mid-trigger: the classic
/// cleanup-then-retrack pattern must not corrupt the iteration.
#[test]
fn retracking_during_trigger_is_safe() {
    let rt = Runtime::new();
    let toggle = Signal::new(&rt, false);
    let a = Signal::new(&rt, 1);
    let b = Signal::new(&rt, 2);
    let seen = Arc::new(AtomicI32::new(0));

    let seen_inner = seen.clone();
    let toggle_inner = toggle.clone();
    let a_inner = a.clone();
    let b_inner = b.clone();
    Effect::new(&rt, move || {
        let source = if toggle_inner.get().as_bool().unwrap() {
            &b_inner
        } else {
            &a_inner
        };
        seen_inner.store(source.get().as_int().unwrap() as i32, Ordering::SeqCst);
    });
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    // Flipping the toggle swaps the tracked source during the re-run.
    toggle.set(true);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    // The abandoned source no longer reaches the effect.
    a.set(100);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    b.set(5);
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}

/// Two runtimes in one process never cross-talk.
#[test]
fn independent_runtimes_are_isolated() {
    let rt_a = Runtime::new();
    let rt_b = Runtime::new();

    let sig_a = Signal::new(&rt_a, 0);
    let sig_b = Signal::new(&rt_b, 0);
    let runs_a = Arc::new(AtomicI32::new(0));

    let runs_inner = runs_a.clone();
    let sig_a_inner = sig_a.clone();
    Effect::new(&rt_a, move || {
        runs_inner.fetch_add(1, Ordering::SeqCst);
        let _ = sig_a_inner.get();
    });

    sig_b.set(1);
    assert_eq!(runs_a.load(Ordering::SeqCst), 1);

    sig_a.set(1);
    assert_eq!(runs_a.load(Ordering::SeqCst), 2);
}
