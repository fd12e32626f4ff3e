//! SQLite-backed record store

use super::model::{NewStoredFile, RecordFilter, RecordPatch, StoredFileRecord};
use super::store::{RecordError, RecordResult, RecordStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

const SELECT_COLUMNS: &str =
    "SELECT id, uuid, name, path, title, created_at, updated_at FROM stored_files";

/// Record store persisting to the `stored_files` table
///
/// # Examples
///
/// ```rust,no_run
/// use stowage::records::SqliteRecordStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let records = SqliteRecordStore::connect("sqlite://./stowage.db").await?;
/// records.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wraps an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, creating the database file if missing
    ///
    /// In-memory databases are limited to a single connection so every
    /// query sees the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails
    pub async fn connect(url: &str) -> RecordResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        tracing::debug!(url, "connected record store");
        Ok(Self { pool })
    }

    /// Runs the embedded schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply
    pub async fn migrate(&self) -> RecordResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Returns the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Maps a unique-constraint violation onto `RecordError::DuplicateUuid`
fn map_insert_error(err: sqlx::Error, uuid: &str) -> RecordError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RecordError::DuplicateUuid(uuid.to_string())
        }
        _ => RecordError::Database(err),
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewStoredFile) -> RecordResult<StoredFileRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO stored_files (uuid, name, path, title, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.uuid)
        .bind(&record.name)
        .bind(&record.path)
        .bind(&record.title)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &record.uuid))?;

        Ok(StoredFileRecord {
            id: result.last_insert_rowid(),
            uuid: record.uuid,
            name: record.name,
            path: record.path,
            title: record.title,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_uuid(&self, uuid: &str) -> RecordResult<Option<StoredFileRecord>> {
        let record = sqlx::query_as::<_, StoredFileRecord>(&format!("{SELECT_COLUMNS} WHERE uuid = ?"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find(&self, filter: &RecordFilter) -> RecordResult<Vec<StoredFileRecord>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        query.push(" WHERE 1 = 1");
        for (column, value) in filter.conditions() {
            // Column names come from a fixed list, values are bound
            query.push(" AND ").push(column).push(" = ").push_bind(value.to_string());
        }
        query.push(" ORDER BY id");

        let records = query
            .build_query_as::<StoredFileRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn update_by_uuid(&self, uuid: &str, patch: &RecordPatch) -> RecordResult<bool> {
        let Some(title) = &patch.title else {
            return self.exists_by_uuid(uuid).await;
        };

        let result = sqlx::query("UPDATE stored_files SET title = ?, updated_at = ? WHERE uuid = ?")
            .bind(title)
            .bind(Utc::now())
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_uuid(&self, uuid: &str) -> RecordResult<bool> {
        let result = sqlx::query("DELETE FROM stored_files WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_uuid(&self, uuid: &str) -> RecordResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stored_files WHERE uuid = ?")
            .bind(uuid)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
