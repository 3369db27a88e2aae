use crate::error::DbError;
use crate::query::query;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};

/// Name of the backing table. Also spelled out literally in the statements below.
pub const META_TABLE: &str = "metainfo";
/// The single setting this store reads and writes.
pub const META_KEY: &str = "versions";

/// The get/set pair the host uses for schema/version bookkeeping.
///
/// Object-safe so the host can hold a `Box<dyn MetaInfo>` without knowing
/// which backend provides it.
#[async_trait]
pub trait MetaInfo: Send + Sync {
    /// Returns the stored value, or `None` if nothing was ever set.
    async fn get(&self) -> Result<Option<JsonValue>, DbError>;

    /// Stores `value`, replacing any previous one.
    async fn set(&self, value: &JsonValue) -> Result<(), DbError>;
}

/// Persists a single JSON document under the `versions` key of the `metainfo` table.
#[derive(Debug, Clone)]
pub struct MetaInfoStore {
    pool: PgPool,
}

impl MetaInfoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads the stored value, creating the table first if it does not exist.
    ///
    /// Returns `None` only when no row exists for the key. A SQL `NULL` in the
    /// `value` column decodes as JSON `null`, so `T` must accept `null` for it.
    pub async fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, DbError> {
        self.ensure_table().await?;

        let result = query(
            &self.pool,
            "SELECT value FROM metainfo WHERE setting = $1",
            vec![META_KEY.into()],
        )
        .await?;

        let Some(row) = result.rows.first() else {
            return Ok(None);
        };
        // A row whose value was nulled out by an outside writer reads as JSON `null`.
        let value = match row.try_get::<Option<String>, _>("value")? {
            Some(text) => serde_json::from_str(&text)?,
            None => serde_json::from_value(JsonValue::Null)?,
        };
        Ok(Some(value))
    }

    /// Serializes `value` to JSON and upserts it under the fixed key.
    ///
    /// The unique constraint on `setting` keeps at most one row for the key.
    pub async fn set<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), DbError> {
        let text = serde_json::to_string(value)?;
        self.ensure_table().await?;

        query(
            &self.pool,
            r#"
            INSERT INTO metainfo (setting, value)
            VALUES ($1, $2)
            ON CONFLICT (setting) DO UPDATE SET value = EXCLUDED.value
            "#,
            vec![META_KEY.into(), text.into()],
        )
        .await?;
        Ok(())
    }

    /// Whether `public.metainfo` exists.
    pub async fn has_table(&self) -> Result<bool, DbError> {
        let result = query(
            &self.pool,
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = $1::text
            AND   table_name = $2::text
            "#,
            vec!["public".into(), META_TABLE.into()],
        )
        .await?;
        Ok(result.row_count > 0)
    }

    async fn ensure_table(&self) -> Result<(), DbError> {
        if self.has_table().await? {
            return Ok(());
        }

        tracing::debug!(table = META_TABLE, "Creating metainfo table.");
        // IF NOT EXISTS makes a race with another creator harmless.
        query(
            &self.pool,
            "CREATE TABLE IF NOT EXISTS metainfo (setting text unique, value text)",
            vec![],
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MetaInfo for MetaInfoStore {
    async fn get(&self) -> Result<Option<JsonValue>, DbError> {
        MetaInfoStore::get::<JsonValue>(self).await
    }

    async fn set(&self, value: &JsonValue) -> Result<(), DbError> {
        MetaInfoStore::set(self, value).await
    }
}
