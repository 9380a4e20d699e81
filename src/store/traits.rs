//! `SessionStore` trait: single async interface for session persistence.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::orchestrator::SessionContext;

/// Backend-agnostic session persistence. The store is authoritative: callers
/// load before a turn and save after it, with no caching in between.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session, `None` if it was never saved (or was deleted).
    async fn load(&self, session_id: &str) -> Result<Option<SessionContext>, StoreError>;

    /// Insert or replace a session. Last writer wins.
    async fn save(&self, session_id: &str, context: &SessionContext) -> Result<(), StoreError>;

    /// Remove a session. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Ids of all stored sessions, most recently updated first.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}
