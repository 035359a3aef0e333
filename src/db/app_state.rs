use crate::db::DbPool;
use crate::errors::{Error, Result};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument};

/// Reads one entry from the `app_state` key-value table.
///
/// The table backs the crate's small persistent state: the new-project
/// notification watermark, the timer running flag, and the dark-mode
/// preference. Each key has exactly one writing component.
///
/// # Returns
///
/// `Ok(None)` when the key has never been written.
///
/// # Errors
///
/// Returns `Error::Database` when the connection lock is poisoned or the
/// query fails.
#[instrument(skip(pool))]
pub async fn get_state_value(pool: &DbPool, key: &str) -> Result<Option<String>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached("SELECT value FROM app_state WHERE key = ?1")?;
    let value_result: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    debug!("App state for key '{}': {:?}", key, value_result);
    Ok(value_result)
}

/// Writes one entry to the `app_state` table, inserting the key or
/// overwriting its current value.
///
/// # Errors
///
/// Returns `Error::Database` when the connection lock is poisoned or the
/// statement fails.
#[instrument(skip(pool))]
pub async fn set_state_value(pool: &DbPool, key: &str, value: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    info!("Set app state: {} = {}", key, value);
    Ok(())
}

/// Convenience accessor for boolean-valued state keys.
///
/// Any stored value other than the literal `"true"` reads as `false`, as
/// does an absent key.
///
/// # Errors
///
/// Propagates the underlying `get_state_value` error.
pub async fn get_state_flag(pool: &DbPool, key: &str) -> Result<bool> {
    Ok(get_state_value(pool, key).await?.as_deref() == Some("true"))
}

/// Convenience setter for boolean-valued state keys.
///
/// # Errors
///
/// Propagates the underlying `set_state_value` error.
pub async fn set_state_flag(pool: &DbPool, key: &str, value: bool) -> Result<()> {
    set_state_value(pool, key, if value { "true" } else { "false" }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::errors::Result;

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        set_state_value(&db_pool, "test_key_1", "test_value_1").await?;
        let retrieved = get_state_value(&db_pool, "test_key_1").await?;

        assert_eq!(
            retrieved,
            Some("test_value_1".to_string()),
            "Retrieved value should match the set value for a new key."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_existing_key() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        set_state_value(&db_pool, "test_key_update", "initial_value").await?;
        set_state_value(&db_pool, "test_key_update", "updated_value").await?;

        let retrieved = get_state_value(&db_pool, "test_key_update").await?;
        assert_eq!(
            retrieved,
            Some("updated_value".to_string()),
            "Retrieved value should be the updated value."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_non_existent_key() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let retrieved = get_state_value(&db_pool, "this_key_does_not_exist").await?;
        assert!(
            retrieved.is_none(),
            "Retrieved value for a non-existent key should be None."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_flag_roundtrip_and_default() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        assert!(!get_state_flag(&db_pool, "some_flag").await?, "absent flag reads false");

        set_state_flag(&db_pool, "some_flag", true).await?;
        assert!(get_state_flag(&db_pool, "some_flag").await?);

        set_state_flag(&db_pool, "some_flag", false).await?;
        assert!(!get_state_flag(&db_pool, "some_flag").await?);
        Ok(())
    }
}
