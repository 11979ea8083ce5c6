use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::repository::StorageError;

pub(crate) async fn read_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, StorageError> {
    let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

    row.map(|row| {
        row.try_get::<String, _>("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))
    })
    .transpose()
}

pub(crate) async fn write_value(pool: &SqlitePool, key: &str, value: &str) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        ",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|err| StorageError::Connection(err.to_string()))?;

    Ok(())
}
