//! # Admin Module
//!
//! Role-gated commands on `admin:command` (`{subjectId, command, target?}`).
//! Callers below `required_role` (module config, default `admin`) get an
//! `admin:denied`; everyone else gets an `admin:response`
//! (`{subjectId, command, result}`).
//!
//! | Command | Result |
//! |---------|--------|
//! | `ping` | `"pong"` |
//! | `session` | target's session or `null` |
//! | `end-session` | whether a session was removed |
//! | `role` | target's role |

use super::sessions::{self, session_key, subject_of};
use super::Subscriptions;
use bc_03_module_loader::{CoreHandle, Module, ModuleDescriptor, ModuleError};
use serde_json::json;
use shared_bus::{Listener, ListenerError};
use shared_types::{Payload, SubjectId};
use std::sync::Arc;

pub const NAME: &str = "bucu-admin";

pub const ADMIN_COMMAND: &str = "admin:command";
pub const ADMIN_RESPONSE: &str = "admin:response";
pub const ADMIN_DENIED: &str = "admin:denied";

pub const DEFAULT_REQUIRED_ROLE: &str = "admin";

pub fn descriptor(subscriptions: Arc<Subscriptions>) -> ModuleDescriptor {
    ModuleDescriptor::new(NAME, env!("CARGO_PKG_VERSION"))
        .with_description("Administrative commands for moderators and admins")
        .depends_on(sessions::NAME)
        .with_entry(AdminModule::new(subscriptions))
}

pub struct AdminModule {
    subscriptions: Arc<Subscriptions>,
}

impl AdminModule {
    pub fn new(subscriptions: Arc<Subscriptions>) -> Self {
        Self { subscriptions }
    }
}

impl Module for AdminModule {
    fn init(&self, core: &CoreHandle) -> Result<(), ModuleError> {
        let required = required_role(core.module_config())?;

        let listener = {
            let core = core.clone();
            let required = required.clone();
            Listener::new(move |payload| on_command(&core, &required, payload))
        };
        self.subscriptions
            .replace(core, vec![(ADMIN_COMMAND, listener)])?;

        core.log()
            .info(format!("Admin commands enabled for role '{required}' and above"));
        Ok(())
    }
}

fn required_role(config: Option<&Payload>) -> Result<String, ModuleError> {
    match config.and_then(|c| c.get("required_role")) {
        None => Ok(DEFAULT_REQUIRED_ROLE.to_string()),
        Some(Payload::String(role)) if !role.is_empty() => Ok(role.clone()),
        Some(other) => Err(ModuleError::Config(format!(
            "required_role must be a role name, got {other}"
        ))),
    }
}

fn target_of(payload: &Payload) -> Result<SubjectId, ListenerError> {
    payload
        .get("target")
        .and_then(Payload::as_u64)
        .ok_or_else(|| ListenerError::new("command needs a numeric target"))
}

fn on_command(core: &CoreHandle, required: &str, payload: &Payload) -> Result<(), ListenerError> {
    let subject = subject_of(payload)?;
    let command = payload
        .get("command")
        .and_then(Payload::as_str)
        .unwrap_or_default()
        .to_string();

    if !core.has_permission(subject, required) {
        core.log().warn(format!(
            "Subject {subject} denied '{command}' (requires {required})"
        ));
        core.emit(ADMIN_DENIED, json!({ "subjectId": subject, "command": command }))
            .map_err(|e| ListenerError::new(e.to_string()))?;
        return Ok(());
    }

    let result = match command.as_str() {
        "ping" => json!("pong"),
        "session" => core
            .state_get(&session_key(target_of(payload)?))
            .unwrap_or(Payload::Null),
        "end-session" => json!(core.state_delete(&session_key(target_of(payload)?))),
        "role" => json!(core.get_permission(target_of(payload)?)),
        other => {
            return Err(ListenerError::new(format!("unknown admin command '{other}'")));
        }
    };

    core.emit(
        ADMIN_RESPONSE,
        json!({ "subjectId": subject, "command": command, "result": result }),
    )
    .map_err(|e| ListenerError::new(e.to_string()))?;
    Ok(())
}
