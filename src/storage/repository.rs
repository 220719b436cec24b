//! Session store behind a replaceable interface
//!
//! Completed runs are written once under a fresh id and read back by
//! session and export lookups.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{SessionRecord, StructuredExport};
use crate::{CliniaError, Result};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a completed session. Ids are never reused.
    async fn insert(&self, record: SessionRecord) -> Result<Arc<SessionRecord>>;

    async fn get(&self, session_id: &str) -> Result<Option<Arc<SessionRecord>>>;

    /// Fetch a session or fail with `NotFound`
    async fn require(&self, session_id: &str) -> Result<Arc<SessionRecord>> {
        self.get(session_id)
            .await?
            .ok_or_else(|| CliniaError::NotFound(format!("Session not found: {}", session_id)))
    }

    /// Structured data of a session as a downloadable document
    async fn export(&self, session_id: &str) -> Result<StructuredExport> {
        let record = self.require(session_id).await?;
        Ok(record.export()?)
    }
}

/// Process-lifetime store. Grows without eviction.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<Arc<SessionRecord>> {
        let record = Arc::new(record);
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&record.session_id) {
            return Err(CliniaError::Other(format!(
                "Session id already in use: {}",
                record.session_id
            )));
        }
        sessions.insert(record.session_id.clone(), Arc::clone(&record));
        Ok(record)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Arc<SessionRecord>>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }
}
