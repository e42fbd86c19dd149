//! Registry of live process instances.
//!
//! Each instance is guarded by its own async mutex so concurrent requests
//! for one instance are applied in arrival order while different instances
//! proceed in parallel.
//!
//! When the registry is full, an idle instance is evicted to make room:
//! submitted ones first, then the least recently used. Evicted instances
//! are resumed from storage on their next request.

use domain::services::ProcessRuntime;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<ProcessRuntime>>;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Live session limit of {0} reached")]
    Full(usize),
}

struct Session {
    handle: SessionHandle,
    last_used: Instant,
}

impl Session {
    /// Eviction rank of an idle session; lower goes first. `None` while a
    /// request still holds the handle.
    fn eviction_rank(&self) -> Option<(bool, Instant)> {
        if Arc::strong_count(&self.handle) > 1 {
            return None;
        }
        let runtime = self.handle.try_lock().ok()?;
        Some((!runtime.is_submitted(), self.last_used))
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Track a runtime. An instance already tracked keeps its existing
    /// handle, so a racing resume never replaces newer in-memory state.
    pub async fn insert(&self, runtime: ProcessRuntime) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        let instance_id = runtime.instance_id();

        if let Some(existing) = sessions.get_mut(&instance_id) {
            existing.last_used = Instant::now();
            return Ok(existing.handle.clone());
        }
        if sessions.len() >= self.capacity {
            let victim = sessions
                .iter()
                .filter_map(|(id, session)| session.eviction_rank().map(|rank| (rank, *id)))
                .min()
                .map(|(_, id)| id);

            match victim {
                Some(id) => {
                    sessions.remove(&id);
                    tracing::debug!(evicted = %id, "Evicted idle process instance");
                }
                None => {
                    tracing::warn!(capacity = self.capacity, "Live session limit reached");
                    return Err(SessionError::Full(self.capacity));
                }
            }
        }

        let handle = Arc::new(Mutex::new(runtime));
        sessions.insert(
            instance_id,
            Session {
                handle: handle.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(handle)
    }

    pub async fn get(&self, instance_id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&instance_id)?;
        session.last_used = Instant::now();
        Some(session.handle.clone())
    }

    pub async fn remove(&self, instance_id: Uuid) -> Option<SessionHandle> {
        self.sessions
            .write()
            .await
            .remove(&instance_id)
            .map(|session| session.handle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
