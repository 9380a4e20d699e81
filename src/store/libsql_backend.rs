//! libSQL backend: async `SessionStore` implementation.
//!
//! Supports local file and in-memory databases. Each session row keeps the
//! full context as JSON next to a few columns useful for listing.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::orchestrator::SessionContext;
use crate::store::migrations;
use crate::store::traits::SessionStore;

/// libSQL session store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlSessionStore {
    _db: LibSqlDatabase,
    conn: Connection,
}

impl LibSqlSessionStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;
        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Session database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl SessionStore for LibSqlSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionContext>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT context FROM sessions WHERE id = ?1",
                params![session_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("load_session: {e}")))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("load_session: {e}")))?
        else {
            return Ok(None);
        };
        let json: String = row
            .get(0)
            .map_err(|e| StoreError::Query(format!("load_session: {e}")))?;
        let context = serde_json::from_str(&json)
            .map_err(|e| StoreError::Serialization(format!("session {session_id}: {e}")))?;
        Ok(Some(context))
    }

    async fn save(&self, session_id: &str, context: &SessionContext) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(context).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO sessions (id, checklist_type, context, progress, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (id) DO UPDATE SET
                    checklist_type = ?2, context = ?3, progress = ?4, updated_at = ?6",
                params![
                    session_id,
                    context.checklist_type.as_str(),
                    json,
                    context.progress(),
                    context.created_at.to_rfc3339(),
                    now
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("save_session: {e}")))?;
        debug!(session_id, progress = context.progress(), "Session saved");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let count = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
            .await
            .map_err(|e| StoreError::Query(format!("delete_session: {e}")))?;
        Ok(count > 0)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT id FROM sessions ORDER BY updated_at DESC, id", ())
            .await
            .map_err(|e| StoreError::Query(format!("list_sessions: {e}")))?;

        let mut ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_sessions: {e}")))?
        {
            ids.push(
                row.get::<String>(0)
                    .map_err(|e| StoreError::Query(format!("list_sessions: {e}")))?,
            );
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::ChecklistType;

    async fn test_store() -> LibSqlSessionStore {
        LibSqlSessionStore::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let store = test_store().await;
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = test_store().await;
        let mut ctx = SessionContext::new("s1", ChecklistType::Reconnection);
        ctx.attempts.insert("mood".into(), 1);
        store.save("s1", &ctx).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded, ctx);
    }

    #[tokio::test]
    async fn save_upserts() {
        let store = test_store().await;
        let mut ctx = SessionContext::new("s1", ChecklistType::Onboarding);
        store.save("s1", &ctx).await.unwrap();
        ctx.checklist_type = ChecklistType::DailyCheckin;
        store.save("s1", &ctx).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.checklist_type, ChecklistType::DailyCheckin);
        assert_eq!(store.list_ids().await.unwrap(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = test_store().await;
        let ctx = SessionContext::new("s1", ChecklistType::Onboarding);
        store.save("s1", &ctx).await.unwrap();
        assert!(store.delete("s1").await.unwrap());
        assert!(!store.delete("s1").await.unwrap());
        assert!(store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sessions.db");
        let ctx = SessionContext::new("s1", ChecklistType::Onboarding);
        {
            let store = LibSqlSessionStore::new_local(&path).await.unwrap();
            store.save("s1", &ctx).await.unwrap();
        }
        let store = LibSqlSessionStore::new_local(&path).await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), Some(ctx));
    }
}
