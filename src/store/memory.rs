//! In-process session store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::orchestrator::SessionContext;

use super::traits::SessionStore;

/// Sessions kept in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionContext>>,
}

impl MemorySessionStore {
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
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionContext>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, context: &SessionContext) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), context.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut entries: Vec<(&String, &SessionContext)> = sessions.iter().collect();
        entries.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at).then(a.0.cmp(b.0)));
        Ok(entries.into_iter().map(|(id, _)| id.clone()).collect())
    }
}
