//! # Sessions Module
//!
//! Tracks connected players in the state store.
//!
//! | Event | Payload | Effect |
//! |-------|---------|--------|
//! | `player:join` | `{subjectId, name?}` | store `session:<id>`, emit `session:started` |
//! | `player:leave` | `{subjectId}` | delete `session:<id>`, emit `session:ended` |
//!
//! Sessions expire after `session_ttl` seconds (module config, default 3600)
//! if no `player:leave` arrives.

use super::Subscriptions;
use bc_03_module_loader::{CoreHandle, Module, ModuleDescriptor, ModuleError};
use serde_json::json;
use shared_bus::{Listener, ListenerError};
use shared_types::{Payload, SubjectId};
use std::sync::Arc;
use std::time::Duration;

pub const NAME: &str = "bucu-sessions";

pub const PLAYER_JOIN: &str = "player:join";
pub const PLAYER_LEAVE: &str = "player:leave";
pub const SESSION_STARTED: &str = "session:started";
pub const SESSION_ENDED: &str = "session:ended";

pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// State store key of a subject's session.
#[must_use]
pub fn session_key(subject: SubjectId) -> String {
    format!("session:{subject}")
}

pub fn descriptor(subscriptions: Arc<Subscriptions>) -> ModuleDescriptor {
    ModuleDescriptor::new(NAME, env!("CARGO_PKG_VERSION"))
        .with_description("Player sessions backed by the state store")
        .with_config(json!({ "session_ttl": DEFAULT_SESSION_TTL_SECS }))
        .with_entry(SessionsModule::new(subscriptions))
}

pub struct SessionsModule {
    subscriptions: Arc<Subscriptions>,
}

impl SessionsModule {
    pub fn new(subscriptions: Arc<Subscriptions>) -> Self {
        Self { subscriptions }
    }
}

impl Module for SessionsModule {
    fn init(&self, core: &CoreHandle) -> Result<(), ModuleError> {
        let ttl = session_ttl(core.module_config())?;

        let join = {
            let core = core.clone();
            Listener::new(move |payload| on_join(&core, ttl, payload))
        };
        let leave = {
            let core = core.clone();
            Listener::new(move |payload| on_leave(&core, payload))
        };
        self.subscriptions
            .replace(core, vec![(PLAYER_JOIN, join), (PLAYER_LEAVE, leave)])?;

        core.log()
            .info(format!("Tracking sessions (ttl {}s)", ttl.as_secs()));
        Ok(())
    }
}

fn session_ttl(config: Option<&Payload>) -> Result<Duration, ModuleError> {
    match config.and_then(|c| c.get("session_ttl")) {
        None => Ok(Duration::from_secs(DEFAULT_SESSION_TTL_SECS)),
        Some(value) => value
            .as_u64()
            .map(Duration::from_secs)
            .ok_or_else(|| ModuleError::Config(format!("session_ttl must be seconds, got {value}"))),
    }
}

pub(crate) fn subject_of(payload: &Payload) -> Result<SubjectId, ListenerError> {
    payload
        .get("subjectId")
        .and_then(Payload::as_u64)
        .ok_or_else(|| ListenerError::new("payload has no numeric subjectId"))
}

fn on_join(core: &CoreHandle, ttl: Duration, payload: &Payload) -> Result<(), ListenerError> {
    let subject = subject_of(payload)?;
    let name = payload.get("name").cloned().unwrap_or(Payload::Null);
    let session = json!({
        "subjectId": subject,
        "name": name.clone(),
        "role": core.get_permission(subject),
    });

    core.state_set(&session_key(subject), session, Some(ttl))
        .map_err(|e| ListenerError::new(e.to_string()))?;
    core.log().debug(format!("Session started for {subject}"));

    core.emit(SESSION_STARTED, json!({ "subjectId": subject, "name": name }))
        .map_err(|e| ListenerError::new(e.to_string()))?;
    Ok(())
}

fn on_leave(core: &CoreHandle, payload: &Payload) -> Result<(), ListenerError> {
    let subject = subject_of(payload)?;
    if !core.state_delete(&session_key(subject)) {
        core.log().debug(format!("No session to end for {subject}"));
        return Ok(());
    }

    core.emit(SESSION_ENDED, json!({ "subjectId": subject }))
        .map_err(|e| ListenerError::new(e.to_string()))?;
    Ok(())
}
