// On-device token storage backed by SQLite

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::store::TokenStore;

const ACCESS_TOKEN_KEY: &str = "ssw:access_token";
const REFRESH_TOKEN_KEY: &str = "ssw:refresh_token";
const PROFILE_ID_KEY: &str = "ssw:profile_id";

/// Token store persisted in an `auth_kv` table.
///
/// rusqlite is blocking, so every statement runs on the blocking pool.
pub struct SqliteTokenStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTokenStore {
    /// Open (or create) the token database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create token directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        tracing::debug!("Opened token database: {}", path.display());
        Self::with_connection(conn)
    }

    /// Non-persistent database, for tests and ephemeral sessions
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create auth_kv table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection off the async runtime
    async fn run<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| anyhow!("Token database lock poisoned"))?;
            op(&mut conn)
        })
        .await
        .context("Token database task failed")?
    }

    async fn get(&self, key: &'static str) -> Result<Option<String>> {
        self.run(move |conn| {
            conn.query_row("SELECT value FROM auth_kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("Failed to read {} from SQLite", key))
        })
        .await
    }

    async fn put(&self, entries: Vec<(&'static str, String)>) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction().context("Failed to begin transaction")?;
            for (key, value) in &entries {
                tx.execute(
                    "INSERT INTO auth_kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )
                .with_context(|| format!("Failed to write {} to SQLite", key))?;
            }
            tx.commit().context("Failed to commit token update")
        })
        .await
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn access_token(&self) -> Result<Option<String>> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    async fn set_access_token(&self, access_token: &str) -> Result<()> {
        self.put(vec![(ACCESS_TOKEN_KEY, access_token.to_string())])
            .await
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.put(vec![
            (ACCESS_TOKEN_KEY, access_token.to_string()),
            (REFRESH_TOKEN_KEY, refresh_token.to_string()),
        ])
        .await
    }

    async fn clear_tokens(&self) -> Result<()> {
        self.run(|conn| {
            conn.execute(
                "DELETE FROM auth_kv WHERE key IN (?1, ?2, ?3)",
                params![ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, PROFILE_ID_KEY],
            )
            .context("Failed to clear tokens from SQLite")?;
            Ok(())
        })
        .await
    }

    async fn profile_id(&self) -> Result<Option<String>> {
        self.get(PROFILE_ID_KEY).await
    }

    async fn set_profile_id(&self, profile_id: &str) -> Result<()> {
        self.put(vec![(PROFILE_ID_KEY, profile_id.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let store = SqliteTokenStore::open_in_memory().unwrap();
        assert_eq!(store.access_token().await.unwrap(), None);

        store.set_tokens("access-1", "refresh-1").await.unwrap();
        store.set_access_token("access-2").await.unwrap();
        store.set_profile_id("profile-1").await.unwrap();

        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.profile_id().await.unwrap().as_deref(), Some("profile-1"));
    }

    #[tokio::test]
    async fn test_sqlite_store_clear_is_idempotent() {
        let store = SqliteTokenStore::open_in_memory().unwrap();
        store.set_tokens("a", "r").await.unwrap();
        store.set_profile_id("p").await.unwrap();

        store.clear_tokens().await.unwrap();
        store.clear_tokens().await.unwrap();

        assert_eq!(store.access_token().await.unwrap(), None);
        assert_eq!(store.refresh_token().await.unwrap(), None);
        assert_eq!(store.profile_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_opens() {
        let path = std::env::temp_dir().join(format!(
            "ssw-token-test-{}.sqlite3",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let store = SqliteTokenStore::open(&path).unwrap();
            store.set_tokens("persisted", "refresh").await.unwrap();
        }

        let reopened = SqliteTokenStore::open(&path).unwrap();
        assert_eq!(
            reopened.access_token().await.unwrap().as_deref(),
            Some("persisted")
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sqlite_store_concurrent_writers() {
        let store = Arc::new(SqliteTokenStore::open_in_memory().unwrap());

        let writers = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set_tokens(&format!("access-{}", i), &format!("refresh-{}", i))
                    .await
            })
        });
        for writer in futures::future::join_all(writers).await {
            writer.unwrap().unwrap();
        }

        // Pairs are written in one transaction, so they never mix
        let access = store.access_token().await.unwrap().unwrap();
        let refresh = store.refresh_token().await.unwrap().unwrap();
        assert_eq!(
            access.trim_start_matches("access-"),
            refresh.trim_start_matches("refresh-")
        );
    }
}
