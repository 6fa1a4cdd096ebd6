//! # Service Properties
//!
//! The observable guarantees of each service, checked through the public
//! API with a manual clock.

#[cfg(test)]
mod tests {
    use crate::fixtures::TestCore;
    use bc_03_module_loader::{
        FnModule, ModuleDescriptor, ModuleError, ModuleState, StaticSource,
    };
    use parking_lot::Mutex;
    use serde_json::json;
    use shared_bus::{BusError, Listener, ListenerError};
    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // EVENT BUS
    // =========================================================================

    #[test]
    fn test_listeners_run_in_registration_order_every_dispatch() {
        let core = TestCore::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for id in 0..5 {
            let calls = Arc::clone(&calls);
            core.bus
                .register("tick", Listener::infallible(move |_| calls.lock().push(id)))
                .unwrap();
        }

        for _ in 0..3 {
            core.bus.emit("tick", &json!(null)).unwrap();
        }

        let expected: Vec<i32> = (0..3).flat_map(|_| 0..5).collect();
        assert_eq!(*calls.lock(), expected);
    }

    #[test]
    fn test_failing_listener_does_not_stop_fan_out() {
        let core = TestCore::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        core.bus
            .register("e", Listener::infallible(move |_| first.lock().push(1)))
            .unwrap();
        core.bus
            .register("e", Listener::new(|_| Err(ListenerError::from("listener 2 failed"))))
            .unwrap();
        let third = Arc::clone(&calls);
        core.bus
            .register("e", Listener::infallible(move |_| third.lock().push(3)))
            .unwrap();

        let report = core.bus.emit("e", &json!({})).unwrap();

        assert_eq!(*calls.lock(), vec![1, 3]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(core.bus.stats().errors, 1);
    }

    #[test]
    fn test_rate_limit_blocks_then_recovers() {
        let core = TestCore::with_config(json!({
            "rate_limit": { "enabled": true, "default_limit": 3, "window": 60 }
        }));
        let seen = core.record("chat");

        for _ in 0..3 {
            core.bus.emit("chat", &json!("hi")).unwrap();
        }
        let err = core.bus.emit("chat", &json!("hi")).unwrap_err();
        assert!(matches!(err, BusError::RateLimited { limit: 3, .. }));
        assert_eq!(seen.lock().len(), 3);
        assert_eq!(core.bus.stats().blocked, 1);

        core.clock.advance_by(Duration::from_secs(60));
        core.bus.emit("chat", &json!("again")).unwrap();
        assert_eq!(seen.lock().len(), 4);
        assert_eq!(core.bus.rate_limiter().window("chat").map(|w| w.0), Some(1));
    }

    #[test]
    fn test_per_event_limits_are_independent() {
        let core = TestCore::with_config(json!({
            "rate_limit": {
                "default_limit": 100,
                "events": { "spam": { "limit": 1 } }
            }
        }));

        core.bus.emit("spam", &json!(1)).unwrap();
        assert!(core.bus.emit("spam", &json!(2)).is_err());
        for _ in 0..10 {
            core.bus.emit("other", &json!(1)).unwrap();
        }
    }

    #[test]
    fn test_concurrent_emits_admit_exactly_the_limit() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 40;
        const LIMIT: u64 = 25;

        let core = TestCore::with_config(json!({
            "rate_limit": { "default_limit": LIMIT, "window": 60 }
        }));
        let seen = core.record("flood");

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for i in 0..PER_THREAD {
                        let _ = core.bus.emit("flood", &json!(i));
                    }
                });
            }
        });

        let stats = core.bus.stats();
        assert_eq!(stats.emitted, LIMIT);
        assert_eq!(stats.blocked, THREADS * PER_THREAD - LIMIT);
        assert_eq!(seen.lock().len() as u64, LIMIT);
    }

    // =========================================================================
    // STATE STORE
    // =========================================================================

    #[test]
    fn test_ttl_entry_expires() {
        let core = TestCore::new();
        core.store
            .set("k", json!("v"), Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(core.store.get("k"), Some(json!("v")));

        core.clock.advance(1_100);
        assert_eq!(core.store.get("k"), None);
        assert!(!core.store.keys().contains(&"k".to_string()));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let core = TestCore::new();
        assert_eq!(core.store.clear(), 0);
        assert!(core.store.keys().is_empty());

        core.store.set("a", json!(1), None).unwrap();
        assert_eq!(core.store.clear(), 1);
        assert_eq!(core.store.clear(), 0);
    }

    // =========================================================================
    // PERMISSION AUTHORITY
    // =========================================================================

    #[test]
    fn test_unassigned_subject_has_default_role() {
        let core = TestCore::new();
        assert_eq!(core.permissions.get_permission(404), "user");
        assert!(core.permissions.has_permission(404, "user"));
        assert!(!core.permissions.has_permission(404, "moderator"));
    }

    #[test]
    fn test_configured_default_role() {
        let core = TestCore::with_config(json!({
            "player": { "default_permission": "guest" },
            "permissions": { "hierarchy": { "guest": 0, "member": 1 } }
        }));
        assert_eq!(core.permissions.get_permission(1), "guest");
        assert!(core.permissions.has_permission(1, "guest"));
        assert!(!core.permissions.has_permission(1, "member"));
    }

    #[test]
    fn test_permission_change_is_published() {
        let core = TestCore::new();
        let changes = core.record("permission:changed");

        core.permissions.set_permission(5, "admin").unwrap();
        core.permissions.set_permission(5, "moderator").unwrap();

        assert_eq!(
            *changes.lock(),
            vec![
                json!({ "subjectId": 5, "oldRole": null, "newRole": "admin" }),
                json!({ "subjectId": 5, "oldRole": "admin", "newRole": "moderator" }),
            ]
        );
    }

    // =========================================================================
    // MODULE LOADER
    // =========================================================================

    fn noop(name: &str, deps: &[&str]) -> ModuleDescriptor {
        ModuleDescriptor::new(name, "1.0.0")
            .with_dependencies(deps.iter().copied())
            .with_entry(FnModule::new(|_| Ok(())))
    }

    #[test]
    fn test_topological_order() {
        let core = TestCore::new();
        core.loader.add_source(Arc::new(
            StaticSource::new()
                .with("C", || noop("C", &["B"]))
                .with("A", || noop("A", &[]))
                .with("B", || noop("B", &["A"])),
        ));

        core.loader.load_modules();
        assert_eq!(core.loader.loaded_modules(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_is_contained() {
        let core = TestCore::new();
        core.loader.add_source(Arc::new(
            StaticSource::new()
                .with("X", || noop("X", &["Y"]))
                .with("Y", || noop("Y", &["X"]))
                .with("Z", || noop("Z", &[])),
        ));

        let summary = core.loader.load_modules();

        assert_eq!(summary.loaded, 1);
        assert!(core.loader.is_loaded("Z"));
        assert_eq!(core.loader.module_state("X"), Some(ModuleState::Failed));
        assert_eq!(core.loader.module_state("Y"), Some(ModuleState::Failed));
        let failed = core.loader.failed_modules();
        assert!(failed["X"].starts_with("Circular dependency"));
    }

    #[test]
    fn test_failed_init_isolated_and_published() {
        let core = TestCore::new();
        let failures = core.record("module:failed");
        core.loader.add_source(Arc::new(
            StaticSource::new()
                .with("bad", || {
                    ModuleDescriptor::new("bad", "1.0.0")
                        .with_entry(FnModule::new(|_| Err(ModuleError::init("no database"))))
                })
                .with("good", || noop("good", &[])),
        ));

        core.loader.load_modules();

        assert!(core.loader.is_loaded("good"));
        assert_eq!(
            *failures.lock(),
            vec![json!({ "name": "bad", "error": "no database" })]
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_admitted_publishes_never_exceed_limit(limit in 1u64..20, publishes in 0usize..60) {
            let core = TestCore::with_config(json!({
                "rate_limit": { "default_limit": limit, "window": 60 }
            }));
            let seen = core.record("burst");

            let admitted = (0..publishes)
                .filter(|_| core.bus.emit("burst", &json!(null)).is_ok())
                .count();

            let expected = publishes.min(limit as usize);
            proptest::prop_assert_eq!(admitted, expected);
            proptest::prop_assert_eq!(seen.lock().len(), expected);
            proptest::prop_assert_eq!(core.bus.stats().blocked as usize, publishes - expected);
        }
    }
}
