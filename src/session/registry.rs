//! Concurrent session registry.
//!
//! # Responsibilities
//! - Create sessions with collision-free identifiers
//! - Look up, touch and delete sessions from any request task
//! - Sweep sessions idle for longer than a timeout
//!
//! # Design Decisions
//! - `Arc<DashMap>` so clones share one map; shard locks make every
//!   operation atomic per entry
//! - Expiry decides inside `retain`, under the same shard lock a
//!   concurrent `touch` must take, so a touched session is never swept
//! - Drivers are released after removal, outside the map lock

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::command::CommandError;
use crate::driver::{Capabilities, DriverFactory};
use crate::observability::metrics;

use super::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown session '{0}'")]
    NotFound(String),

    #[error("failed to launch driver: {0}")]
    Launch(CommandError),
}

impl From<SessionError> for CommandError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => CommandError::NoSuchSession(id),
            SessionError::Launch(CommandError::SessionNotCreated(msg)) => {
                CommandError::SessionNotCreated(msg)
            }
            SessionError::Launch(other) => CommandError::SessionNotCreated(other.to_string()),
        }
    }
}

/// Shared map of live sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    factory: Arc<dyn DriverFactory>,
}

impl SessionRegistry {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            factory,
        }
    }

    /// Launch a driver and register a session owning it.
    pub async fn create(&self, capabilities: Capabilities) -> Result<Arc<Session>, SessionError> {
        let driver = self
            .factory
            .launch(&capabilities)
            .await
            .map_err(SessionError::Launch)?;

        loop {
            let id = Uuid::new_v4().to_string();
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = Arc::new(Session::new(id, capabilities, driver));
                    slot.insert(Arc::clone(&session));
                    metrics::record_sessions_active(self.sessions.len());
                    tracing::info!(session_id = %session.id(), "Session created");
                    return Ok(session);
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Look up and record activity in one step.
    pub fn get_and_touch(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| {
                entry.value().touch();
                Arc::clone(entry.value())
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Record activity. Returns false for unknown ids.
    pub fn touch(&self, id: &str) -> bool {
        match self.sessions.get(id) {
            Some(entry) => {
                entry.value().touch();
                true
            }
            None => false,
        }
    }

    /// Remove and release a session. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> bool {
        let Some((_, session)) = self.sessions.remove(id) else {
            tracing::debug!(session_id = %id, "Delete of unknown session ignored");
            return false;
        };
        metrics::record_sessions_active(self.sessions.len());
        session.release().await;
        true
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove every session idle for longer than `timeout`. Returns the
    /// ids that were removed.
    pub async fn expire_inactive(&self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut expired = Vec::new();
        self.sessions.retain(|_, session| {
            if session.idle_for(now) > timeout {
                expired.push(Arc::clone(session));
                false
            } else {
                true
            }
        });

        if expired.is_empty() {
            return Vec::new();
        }
        metrics::record_sessions_active(self.sessions.len());
        metrics::record_sessions_reaped(expired.len());

        let mut ids = Vec::with_capacity(expired.len());
        for session in expired {
            tracing::info!(
                session_id = %session.id(),
                idle_secs = session.idle_for(now).as_secs(),
                "Session expired"
            );
            session.release().await;
            ids.push(session.id().to_string());
        }
        ids
    }

    /// Delete every session. Used at shutdown.
    pub async fn clear(&self) -> usize {
        let mut released = 0;
        for id in self.ids() {
            if self.delete(&id).await {
                released += 1;
            }
        }
        released
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("factory", &self.factory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::InMemoryDriverFactory;
    use std::collections::HashSet;

    fn registry() -> (SessionRegistry, InMemoryDriverFactory) {
        let factory = InMemoryDriverFactory::new();
        (SessionRegistry::new(Arc::new(factory.clone())), factory)
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (registry, factory) = registry();
        let session = registry.create(Capabilities::new()).await.unwrap();
        let id = session.id().to_string();

        assert_eq!(registry.get(&id).unwrap().id(), id);
        assert_eq!(registry.ids(), vec![id.clone()]);

        assert!(registry.delete(&id).await);
        assert_eq!(registry.get(&id).unwrap_err(), SessionError::NotFound(id.clone()));
        assert_eq!(factory.quits(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (registry, factory) = registry();
        let id = registry.create(Capabilities::new()).await.unwrap().id().to_string();

        assert!(registry.delete(&id).await);
        assert!(!registry.delete(&id).await);
        assert!(!registry.delete("never-existed").await);
        assert_eq!(factory.quits(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (registry, _) = registry();
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let session = registry.create(Capabilities::new()).await.unwrap();
            assert!(seen.insert(session.id().to_string()));
        }
        assert_eq!(registry.len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_spares_recently_touched() {
        let (registry, factory) = registry();
        let idle = registry.create(Capabilities::new()).await.unwrap().id().to_string();
        let busy = registry.create(Capabilities::new()).await.unwrap().id().to_string();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(registry.touch(&busy));
        tokio::time::advance(Duration::from_secs(8)).await;

        let expired = registry.expire_inactive(Duration::from_secs(10)).await;
        assert_eq!(expired, vec![idle.clone()]);
        assert!(registry.get(&idle).is_err());
        assert!(registry.get(&busy).is_ok());
        assert_eq!(factory.quits(), 1);
    }

    #[tokio::test]
    async fn test_clear_releases_everything() {
        let (registry, factory) = registry();
        for _ in 0..3 {
            registry.create(Capabilities::new()).await.unwrap();
        }
        assert_eq!(registry.clear().await, 3);
        assert!(registry.is_empty());
        assert_eq!(factory.quits(), 3);
    }

    #[test]
    fn test_session_error_maps_to_wire_errors() {
        let err: CommandError = SessionError::NotFound("abc".into()).into();
        assert_eq!(err.status(), 6);
        let err: CommandError = SessionError::Launch(CommandError::Driver("no browser".into())).into();
        assert!(matches!(err, CommandError::SessionNotCreated(_)));
    }
}
