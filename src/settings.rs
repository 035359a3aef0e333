//! User preferences owned by the settings surface. Currently one entry:
//! the dark-mode flag, stored as its own named `app_state` key.

use crate::db::{DbPool, get_state_flag, set_state_flag};
use crate::errors::Result;

/// App-state key for the dark-mode preference.
const DARK_MODE_KEY: &str = "dark_mode";

/// Reads the dark-mode preference; absent reads as `false` (light).
///
/// # Errors
///
/// Returns `Error::Database` on store access failures.
pub async fn is_dark_mode(pool: &DbPool) -> Result<bool> {
    get_state_flag(pool, DARK_MODE_KEY).await
}

/// Persists the dark-mode preference.
///
/// # Errors
///
/// Returns `Error::Database` on store access failures.
pub async fn set_dark_mode(pool: &DbPool, enabled: bool) -> Result<()> {
    set_state_flag(pool, DARK_MODE_KEY, enabled).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::errors::Result;

    #[tokio::test]
    async fn test_dark_mode_defaults_to_light_and_roundtrips() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;

        assert!(!is_dark_mode(&pool).await?);
        set_dark_mode(&pool, true).await?;
        assert!(is_dark_mode(&pool).await?);
        set_dark_mode(&pool, false).await?;
        assert!(!is_dark_mode(&pool).await?);
        Ok(())
    }
}
