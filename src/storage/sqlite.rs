//! SQLite 画像存储
//!
//! 表结构：`characters(character_id, name, disambiguation_hint, profile_json)`，
//! 主键为 `character_id`，在 `name` 与 `disambiguation_hint` 上建索引。

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ProfileDocument, ProfileRecord};
use crate::storage::repository::{ProfileStore, closed_error};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS characters (
        character_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        disambiguation_hint TEXT,
        profile_json TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_characters_name ON characters(name);
    CREATE INDEX IF NOT EXISTS idx_characters_hint ON characters(disambiguation_hint);
";

/// SQLite 画像存储
pub struct SqliteProfileStore {
    /// 数据库连接（关闭后为 None），阻塞线程池共享
    conn: Arc<Mutex<Option<Connection>>>,
    /// 数据库路径
    path: PathBuf,
}

impl SqliteProfileStore {
    /// 打开（必要时创建）数据库文件
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&path)?
        };
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %path.display(), "profile store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path,
        })
    }

    /// 打开内存数据库
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:", Duration::from_secs(5))
    }

    /// 数据库路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 在阻塞线程池上执行一次数据库操作
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let guard = conn.lock();
            let conn = guard.as_ref().ok_or_else(closed_error)?;
            Ok(f(conn)?)
        })
        .await
        .map_err(|e| AppError::Internal(format!("sqlite task failed: {}", e)))?
    }

    fn decode(id: String, name: String, json: String) -> Result<ProfileRecord> {
        let profile: ProfileDocument = serde_json::from_str(&json)?;
        Ok(ProfileRecord { id, name, profile })
    }

    async fn query_records(
        &self,
        sql: &'static str,
        name: Option<String>,
    ) -> Result<Vec<ProfileRecord>> {
        let rows: Vec<(String, String, String)> = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(sql)?;
                let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String, String)> {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                };
                let rows = match name {
                    Some(name) => stmt.query_map(params![name], map)?.collect(),
                    None => stmt.query_map([], map)?.collect(),
                };
                rows
            })
            .await?;

        rows.into_iter()
            .map(|(id, name, json)| Self::decode(id, name, json))
            .collect()
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn create(&self, name: &str, document: &ProfileDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(document)?;
        let (row_id, row_name, hint) = (id.clone(), name.to_string(), document.hint.clone());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO characters (character_id, name, disambiguation_hint, profile_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row_id, row_name, hint, json],
            )
        })
        .await?;
        debug!(%id, name, "profile created");
        Ok(id)
    }

    async fn update(&self, id: &str, document: &ProfileDocument) -> Result<bool> {
        let json = serde_json::to_string(document)?;
        let (id, hint) = (id.to_string(), document.hint.clone());
        let changed = self
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE characters SET disambiguation_hint = ?2, profile_json = ?3
                     WHERE character_id = ?1",
                    params![id, hint, json],
                )
            })
            .await?;
        Ok(changed > 0)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ProfileRecord>> {
        self.query_records(
            "SELECT character_id, name, profile_json FROM characters
             WHERE name = ?1 ORDER BY rowid",
            Some(name.to_string()),
        )
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>> {
        let id = id.to_string();
        let row: Option<(String, String, String)> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT character_id, name, profile_json FROM characters WHERE character_id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
            })
            .await?;

        row.map(|(id, name, json)| Self::decode(id, name, json))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<ProfileRecord>> {
        self.query_records(
            "SELECT character_id, name, profile_json FROM characters
             ORDER BY name, disambiguation_hint, rowid",
            None,
        )
        .await
    }

    async fn clear(&self) -> Result<()> {
        let removed = self
            .with_conn(|conn| conn.execute("DELETE FROM characters", []))
            .await?;
        info!(removed, "profile store cleared");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let removed = self
            .with_conn(move |conn| {
                conn.execute("DELETE FROM characters WHERE character_id = ?1", params![id])
            })
            .await?;
        Ok(removed > 0)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = self
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM characters", [], |r| r.get(0)))
            .await?;
        Ok(count as u64)
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| AppError::from(e))?;
            info!(path = %self.path.display(), "profile store closed");
        }
        Ok(())
    }
}
