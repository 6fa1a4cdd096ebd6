//! # Assembled Core
//!
//! The runtime container with its built-in modules, driven by player and
//! admin events.

#[cfg(test)]
mod tests {
    use bc_03_module_loader::ModuleState;
    use core_runtime::builtin::{admin, sessions};
    use core_runtime::container::build_config;
    use core_runtime::{CoreContainer, CoreRuntime};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_bus::Listener;
    use shared_types::ManualTimeSource;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn container(tmp: &TempDir, extra: Vec<(&str, &str)>) -> (CoreContainer, Arc<ManualTimeSource>) {
        let mut vars = vec![(
            "BUCU__MODULES__DIRECTORY".to_string(),
            tmp.path().display().to_string(),
        )];
        vars.extend(extra.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = Arc::new(build_config(None, vars).unwrap());
        let clock = Arc::new(ManualTimeSource::new(0));
        (CoreContainer::new(config, clock.clone()), clock)
    }

    fn record(core: &CoreContainer, event: &str) -> Arc<Mutex<Vec<Value>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        core.bus
            .register(event, Listener::infallible(move |p| sink.lock().push(p.clone())))
            .unwrap();
        seen
    }

    #[test]
    fn test_player_session_flow() {
        let tmp = TempDir::new().unwrap();
        let (core, clock) = container(&tmp, vec![]);
        core.register_default_sources();
        core.loader.load_modules();

        let responses = record(&core, admin::ADMIN_RESPONSE);
        core.permissions.set_permission(1, "superadmin").unwrap();

        core.bus
            .emit(sessions::PLAYER_JOIN, &json!({ "subjectId": 42, "name": "kim" }))
            .unwrap();
        core.bus
            .emit(
                admin::ADMIN_COMMAND,
                &json!({ "subjectId": 1, "command": "session", "target": 42 }),
            )
            .unwrap();

        let result = responses.lock()[0]["result"].clone();
        assert_eq!(result["name"], json!("kim"));

        clock.advance(sessions::DEFAULT_SESSION_TTL_SECS * 1_000 + 1);
        assert!(core.store.get(&sessions::session_key(42)).is_none());
    }

    #[test]
    fn test_disabling_sessions_fails_admin() {
        let tmp = TempDir::new().unwrap();
        let (core, _) = container(&tmp, vec![("BUCU__MODULES__DISABLED", r#"["bucu-sessions"]"#)]);
        core.register_default_sources();
        let summary = core.loader.load_modules();

        assert_eq!(summary.loaded, 0);
        assert_eq!(
            core.loader.module_state(admin::NAME),
            Some(ModuleState::Failed)
        );
        assert_eq!(
            core.loader.failed_modules()[admin::NAME],
            "Missing dependency: bucu-sessions"
        );
    }

    #[test]
    fn test_directory_config_overrides_builtin_entry() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("moderation");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("module.json"),
            json!({
                "name": "moderation",
                "version": "0.2.0",
                "entry": admin::NAME,
                "dependencies": [sessions::NAME]
            })
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.join("config.json"),
            json!({ "required_role": "moderator" }).to_string(),
        )
        .unwrap();

        let (core, _) = container(&tmp, vec![]);
        core.register_default_sources();
        core.loader.load_modules();
        assert!(core.loader.is_loaded("moderation"));

        let responses = record(&core, admin::ADMIN_RESPONSE);
        core.permissions.set_permission(3, "moderator").unwrap();
        core.bus
            .emit(
                admin::ADMIN_COMMAND,
                &json!({ "subjectId": 3, "command": "ping" }),
            )
            .unwrap();

        // bucu-admin denies, moderation answers.
        assert_eq!(responses.lock().len(), 1);
    }

    #[test]
    fn test_manifests_sharing_an_entry_keep_their_listeners() {
        let tmp = TempDir::new().unwrap();
        for name in ["lobby", "arena"] {
            let dir = tmp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("module.json"),
                json!({ "name": name, "version": "1.0.0", "entry": sessions::NAME }).to_string(),
            )
            .unwrap();
        }

        let (core, _) = container(&tmp, vec![("BUCU__CORE__DEV_MODE", "true")]);
        core.register_default_sources();
        core.loader.load_modules();
        assert!(core.loader.is_loaded("lobby"));
        assert!(core.loader.is_loaded("arena"));
        assert_eq!(core.bus.listener_count(sessions::PLAYER_JOIN), 3);

        let started = record(&core, sessions::SESSION_STARTED);
        core.bus
            .emit(sessions::PLAYER_JOIN, &json!({ "subjectId": 5 }))
            .unwrap();
        assert_eq!(started.lock().len(), 3);

        core.loader.reload("lobby").unwrap();
        assert_eq!(core.bus.listener_count(sessions::PLAYER_JOIN), 3);
        assert_eq!(core.bus.listener_count(sessions::PLAYER_LEAVE), 3);
    }

    #[test]
    fn test_reload_builtin_does_not_duplicate_listeners() {
        let tmp = TempDir::new().unwrap();
        let (core, _) = container(&tmp, vec![("BUCU__CORE__DEV_MODE", "true")]);
        core.register_default_sources();
        core.loader.load_modules();
        assert_eq!(core.bus.listener_count(sessions::PLAYER_JOIN), 1);

        core.loader.reload(sessions::NAME).unwrap();
        assert_eq!(core.bus.listener_count(sessions::PLAYER_JOIN), 1);
        assert_eq!(core.bus.listener_count(sessions::PLAYER_LEAVE), 1);
    }

    #[tokio::test]
    async fn test_runtime_start_and_shutdown() {
        let tmp = TempDir::new().unwrap();
        let (core, _) = container(&tmp, vec![("BUCU__CACHE__CLEANUP_INTERVAL", "1")]);
        let mut runtime = CoreRuntime::from_container(core);

        let summary = runtime.start();
        assert_eq!(summary.loaded, 2);

        let status = serde_json::to_value(runtime.container().status()).unwrap();
        assert_eq!(status["loadedModules"], json!([sessions::NAME, admin::NAME]));

        runtime.shutdown().await;
    }
}
