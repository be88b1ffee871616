//! Tests for listeners that call back into the registry during `emit`.

use less_emitter::{EmitLimit, EventRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn make_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// Snapshot semantics
// ============================================================================

#[test]
fn listener_added_during_emit_is_not_called_in_current_emission() {
    let registry: Arc<EventRegistry<i32>> = Arc::new(EventRegistry::new());
    let log = make_log();

    {
        let registry_clone = Arc::clone(&registry);
        let log_clone = Arc::clone(&log);
        registry
            .register_once("tick", move |_| {
                log_clone.lock().unwrap().push("first".to_string());
                let log2 = Arc::clone(&log_clone);
                registry_clone
                    .on("tick", move |_| log2.lock().unwrap().push("second".to_string()))
                    .unwrap();
            })
            .unwrap();
    }

    registry.emit("tick", &1);
    assert_eq!(*log.lock().unwrap(), vec!["first"]);

    registry.emit("tick", &2);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn listener_removed_during_emit_is_still_called_snapshot_semantics() {
    let registry: Arc<EventRegistry<i32>> = Arc::new(EventRegistry::new());
    let second_calls = Arc::new(AtomicUsize::new(0));
    let sc = Arc::clone(&second_calls);
    let victim = Arc::new(Mutex::new(None));

    // The first listener removes the second mid-emission.
    {
        let registry_clone = Arc::clone(&registry);
        let victim = Arc::clone(&victim);
        registry
            .on("tick", move |_| {
                if let Some(id) = *victim.lock().unwrap() {
                    registry_clone.off(id);
                }
            })
            .unwrap();
    }
    let second = registry
        .on("tick", move |_| {
            sc.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    *victim.lock().unwrap() = Some(second);

    registry.emit("tick", &1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.listener_count("tick"), 1);

    registry.emit("tick", &2);
    assert_eq!(
        second_calls.load(Ordering::SeqCst),
        1,
        "removed listener should not fire on the next emit"
    );
}

// ============================================================================
// Limits under reentrancy
// ============================================================================

#[test]
fn reentrant_emit_does_not_run_once_listener_twice() {
    let registry: Arc<EventRegistry<u32>> = Arc::new(EventRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let id = {
        let registry_clone = Arc::clone(&registry);
        let calls = Arc::clone(&calls);
        registry
            .register_once("loop", move |depth| {
                calls.fetch_add(1, Ordering::SeqCst);
                if *depth < 3 {
                    registry_clone.emit("loop", &(depth + 1));
                }
            })
            .unwrap()
    };

    registry.emit("loop", &0);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.emit_times(id), Some(1));
}

#[test]
fn reentrant_emit_respects_limit_of_two() {
    let registry: Arc<EventRegistry<u32>> = Arc::new(EventRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let id = {
        let registry_clone = Arc::clone(&registry);
        let calls = Arc::clone(&calls);
        registry
            .register(
                "loop",
                move |depth| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if *depth < 5 {
                        registry_clone.emit("loop", &(depth + 1));
                    }
                },
                EmitLimit::Times(2),
            )
            .unwrap()
    };

    registry.emit("loop", &0);
    registry.emit("loop", &0);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(registry.emit_times(id), Some(2));
}

#[test]
fn listener_can_unregister_itself() {
    let registry: Arc<EventRegistry<i32>> = Arc::new(EventRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let own_id = Arc::new(Mutex::new(None));

    let id = {
        let registry_clone = Arc::clone(&registry);
        let calls = Arc::clone(&calls);
        let own_id = Arc::clone(&own_id);
        registry
            .on("tick", move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *own_id.lock().unwrap() {
                    registry_clone.unregister("tick", id).unwrap();
                }
            })
            .unwrap()
    };
    *own_id.lock().unwrap() = Some(id);

    assert!(registry.emit("tick", &1));
    assert!(!registry.emit("tick", &2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(registry.event_names().is_empty());
}

// ============================================================================
// Threads
// ============================================================================

#[test]
fn registry_can_be_shared_across_threads() {
    let registry: Arc<EventRegistry<usize>> = Arc::new(EventRegistry::new());
    let total = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&total);
    let id = registry
        .register(
            "add",
            move |n| {
                t.fetch_add(*n, Ordering::SeqCst);
            },
            EmitLimit::Times(100),
        )
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    registry.emit("add", &1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // 200 emits, but the limit caps completed calls at 100.
    assert_eq!(total.load(Ordering::SeqCst), 100);
    assert_eq!(registry.emit_times(id), Some(100));
}
