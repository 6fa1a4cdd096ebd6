//! # Module Lifecycle
//!
//! Modules using the facade against real services: listeners registered in
//! `init`, state shared between modules, and hot reload from a module
//! directory.

#[cfg(test)]
mod tests {
    use crate::fixtures::TestCore;
    use bc_03_module_loader::{
        DirectorySource, DynModule, FnModule, LoaderError, ModuleDescriptor, ModuleError,
        ModuleState, StaticSource,
    };
    use serde_json::json;
    use shared_bus::{Listener, ListenerError};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_manifest(root: &Path, dir: &str, manifest: serde_json::Value) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("module.json"), manifest.to_string()).unwrap();
    }

    /// Counts `score` events into the store under `score:<subjectId>`.
    fn scoring_module() -> ModuleDescriptor {
        ModuleDescriptor::new("scoring", "1.0.0").with_entry(FnModule::new(|core| {
            let handle = core.clone();
            core.on(
                "score",
                Listener::new(move |payload| {
                    let subject = payload["subjectId"]
                        .as_u64()
                        .ok_or_else(|| ListenerError::from("missing subjectId"))?;
                    let key = format!("score:{subject}");
                    let current = handle.state_get(&key).and_then(|v| v.as_u64()).unwrap_or(0);
                    handle
                        .state_set(&key, json!(current + 1), Some(Duration::from_secs(300)))
                        .map_err(|e| ListenerError::new(e.to_string()))
                }),
            )?;
            Ok(())
        }))
    }

    /// Reads what `scoring` wrote and gates on permissions.
    fn leaderboard_module() -> ModuleDescriptor {
        ModuleDescriptor::new("leaderboard", "1.0.0")
            .depends_on("scoring")
            .with_entry(FnModule::new(|core| {
                if !core.is_module_loaded("scoring") {
                    return Err(ModuleError::init("scoring missing"));
                }
                let handle = core.clone();
                core.on(
                    "leaderboard:reset",
                    Listener::new(move |payload| {
                        let subject = payload["subjectId"].as_u64().unwrap_or_default();
                        if !handle.has_permission(subject, "moderator") {
                            return Err(ListenerError::from("not allowed"));
                        }
                        let target = payload["target"].as_u64().unwrap_or_default();
                        handle.state_delete(&format!("score:{target}"));
                        Ok(())
                    }),
                )?;
                Ok(())
            }))
    }

    #[test]
    fn test_modules_share_services() {
        let core = TestCore::new();
        core.loader.add_source(Arc::new(
            StaticSource::new()
                .with("leaderboard", leaderboard_module)
                .with("scoring", scoring_module),
        ));

        let summary = core.loader.load_modules();
        assert_eq!(summary.loaded, 2);
        assert_eq!(core.loader.loaded_modules(), vec!["scoring", "leaderboard"]);

        for _ in 0..3 {
            core.bus.emit("score", &json!({ "subjectId": 8 })).unwrap();
        }
        assert_eq!(core.store.get("score:8"), Some(json!(3)));

        let denied = core
            .bus
            .emit("leaderboard:reset", &json!({ "subjectId": 1, "target": 8 }))
            .unwrap();
        assert_eq!(denied.failed, 1);
        assert!(core.store.has("score:8"));

        core.permissions.set_permission(1, "moderator").unwrap();
        core.bus
            .emit("leaderboard:reset", &json!({ "subjectId": 1, "target": 8 }))
            .unwrap();
        assert!(!core.store.has("score:8"));
    }

    #[test]
    fn test_module_scores_expire_with_clock() {
        let core = TestCore::new();
        core.loader
            .add_source(Arc::new(StaticSource::new().with("scoring", scoring_module)));
        core.loader.load_modules();

        core.bus.emit("score", &json!({ "subjectId": 2 })).unwrap();
        core.clock.advance_by(Duration::from_secs(301));
        assert_eq!(core.store.clear_expired(), 1);
        assert!(core.store.is_empty());
    }

    #[test]
    fn test_disabled_module_rejected_and_dependents_fail() {
        let core = TestCore::with_config(json!({ "modules": { "disabled": ["scoring"] } }));
        core.loader.add_source(Arc::new(
            StaticSource::new()
                .with("scoring", scoring_module)
                .with("leaderboard", leaderboard_module),
        ));

        let summary = core.loader.load_modules();

        assert_eq!(summary.loaded, 0);
        assert_eq!(core.loader.module_state("scoring"), Some(ModuleState::Rejected));
        assert_eq!(core.loader.module_state("leaderboard"), Some(ModuleState::Failed));
        assert_eq!(core.loader.stats().failed, 2);
    }

    #[test]
    fn test_second_pass_picks_up_new_modules() {
        let core = TestCore::new();
        let statics = Arc::new(StaticSource::new().with("scoring", scoring_module));
        core.loader.add_source(statics.clone());
        core.loader.load_modules();

        statics.register("leaderboard", leaderboard_module);
        let summary = core.loader.load_modules();

        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.loaded, 1);
        assert_eq!(core.loader.loaded_modules(), vec!["scoring", "leaderboard"]);
        assert_eq!(core.bus.listener_count("score"), 1);
    }

    #[test]
    fn test_directory_hot_reload() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            "greeter",
            json!({ "name": "greeter", "version": "1.0.0" }),
        );

        let inits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&inits);
        let entry: DynModule = Arc::new(FnModule::new(move |core| {
            counter.fetch_add(1, Ordering::SeqCst);
            let version = core.module_config().cloned().unwrap_or(json!(null));
            core.state_set("greeter:config", version, None)?;
            Ok(())
        }));

        let core = TestCore::with_config(json!({ "core": { "dev_mode": true } }));
        let reloaded = core.record("module:reloaded");
        core.loader.add_source(Arc::new(
            DirectorySource::new(tmp.path()).with_entry("greeter", entry),
        ));
        core.loader.load_modules();
        assert_eq!(core.loader.get_module("greeter").unwrap().version, "1.0.0");

        write_manifest(
            tmp.path(),
            "greeter",
            json!({ "name": "greeter", "version": "1.1.0" }),
        );
        fs::write(
            tmp.path().join("greeter").join("config.json"),
            json!({ "greeting": "hello" }).to_string(),
        )
        .unwrap();

        let fresh = core.loader.reload("greeter").unwrap();

        assert_eq!(fresh.version, "1.1.0");
        assert_eq!(inits.load(Ordering::SeqCst), 2);
        assert_eq!(core.loader.get_module("greeter").unwrap().version, "1.1.0");
        assert_eq!(
            core.store.get("greeter:config"),
            Some(json!({ "greeting": "hello" }))
        );
        assert_eq!(
            *reloaded.lock(),
            vec![json!({ "name": "greeter", "version": "1.1.0" })]
        );
    }

    #[test]
    fn test_reload_rejects_renamed_manifest() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            "greeter",
            json!({ "name": "greeter", "version": "1.0.0" }),
        );
        let entry: DynModule = Arc::new(FnModule::new(|_| Ok(())));

        let core = TestCore::with_config(json!({ "core": { "dev_mode": true } }));
        core.loader.add_source(Arc::new(
            DirectorySource::new(tmp.path()).with_entry("greeter", entry),
        ));
        core.loader.load_modules();

        write_manifest(
            tmp.path(),
            "greeter",
            json!({ "name": "welcomer", "version": "2.0.0", "entry": "greeter" }),
        );
        let err = core.loader.reload("greeter").unwrap_err();

        assert!(matches!(err, LoaderError::NameChanged { .. }));
        assert_eq!(core.loader.get_module("greeter").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_reload_outside_dev_mode() {
        let core = TestCore::new();
        core.loader
            .add_source(Arc::new(StaticSource::new().with("scoring", scoring_module)));
        core.loader.load_modules();

        assert!(matches!(
            core.loader.reload("scoring"),
            Err(LoaderError::ReloadDisabled)
        ));
    }
}
