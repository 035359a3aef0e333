//! Periodic new-project detection and notification pipeline.
//!
//! Each round is one remote query plus one pointer comparison: fetch the
//! project with the maximum `created_at`, compare its id to the persisted
//! watermark, and on a difference post exactly one notification and advance
//! the watermark. Comparison is by id equality only; `created_at` plays no
//! part, so a backdated record with a fresh id still triggers and a
//! re-created record with the same id does not.

use crate::db::{DbPool, get_state_value, set_state_value};
use crate::errors::Result;
use crate::notify::Notifier;
use crate::remote::ProjectSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// App-state key holding the id of the last project that triggered a
/// notification.
const LAST_NOTIFIED_PROJECT_ID_KEY: &str = "last_notified_project_id";
/// App-state key holding that project's `created_at` (epoch millis).
const LAST_NOTIFIED_TIMESTAMP_KEY: &str = "last_notified_timestamp";

/// The identifier (plus timestamp) of the last remote record that triggered
/// a notification; used to detect "newness" without storing full history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub project_id: String,
    pub created_at: i64,
}

/// Loads the persisted watermark, absent until the first detected change.
///
/// A stored timestamp that fails to parse reads as 0 rather than an error;
/// only the id participates in the comparison anyway.
///
/// # Errors
///
/// Returns `Error::Database` on store access failures.
pub async fn load_watermark(pool: &DbPool) -> Result<Option<Watermark>> {
    let Some(project_id) = get_state_value(pool, LAST_NOTIFIED_PROJECT_ID_KEY).await? else {
        return Ok(None);
    };
    let created_at = get_state_value(pool, LAST_NOTIFIED_TIMESTAMP_KEY)
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    Ok(Some(Watermark {
        project_id,
        created_at,
    }))
}

/// Overwrites the watermark with the given project pointer.
///
/// # Errors
///
/// Returns `Error::Database` on store access failures.
pub async fn store_watermark(pool: &DbPool, project_id: &str, created_at: i64) -> Result<()> {
    set_state_value(pool, LAST_NOTIFIED_PROJECT_ID_KEY, project_id).await?;
    set_state_value(pool, LAST_NOTIFIED_TIMESTAMP_KEY, &created_at.to_string()).await?;
    Ok(())
}

/// Performs one check round: query, compare, conditionally notify, advance.
///
/// Remote failures and an empty collection both terminate the round
/// successfully with no side effects; the next scheduled round retries
/// naturally.
///
/// # Errors
///
/// Returns `Error::Database` only for local watermark store failures; the
/// remote leg never fails the round.
#[instrument(skip_all)]
pub async fn run_check_round<S>(source: &S, pool: &DbPool, notifier: &dyn Notifier) -> Result<()>
where
    S: ProjectSource + Sync,
{
    debug!("Checking for new projects");

    let latest = match source.latest_project().await {
        Ok(latest) => latest,
        Err(e) => {
            warn!("Remote query failed; treating as no new project: {}", e);
            return Ok(());
        }
    };

    let Some(latest) = latest else {
        debug!("No projects in remote store");
        return Ok(());
    };
    debug!("Latest project: '{}' ({})", latest.name, latest.id);

    let watermark = load_watermark(pool).await?;
    if watermark.as_ref().map(|w| w.project_id.as_str()) == Some(latest.id.as_str()) {
        debug!("No new projects since last notification");
        return Ok(());
    }

    info!("New project detected: '{}' ({})", latest.name, latest.id);
    notifier.notify_new_project(&latest);
    store_watermark(pool, &latest.id, latest.created_at).await?;
    Ok(())
}

/// Owns the checker's inputs and serializes rounds.
///
/// A scheduled round and a manual "run now" could otherwise race: both read
/// the same watermark and post a duplicate notification (last write wins on
/// the watermark either way). Rounds take an async mutex for their full
/// duration instead, so concurrent triggers collapse into sequential rounds
/// and the second observes the first's watermark.
pub struct CheckRunner<S> {
    source: S,
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
    round_gate: Mutex<()>,
}

impl<S> CheckRunner<S>
where
    S: ProjectSource + Send + Sync,
{
    pub fn new(source: S, pool: DbPool, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source,
            pool,
            notifier,
            round_gate: Mutex::new(()),
        }
    }

    /// Runs one round immediately (the manual "run now" trigger), waiting
    /// for any in-flight round to finish first.
    ///
    /// # Errors
    ///
    /// Propagates local watermark store failures from the round.
    pub async fn run_once(&self) -> Result<()> {
        let _guard = self.round_gate.lock().await;
        run_check_round(&self.source, &self.pool, self.notifier.as_ref()).await
    }

    /// Runs rounds forever on the configured cadence: one initial delay,
    /// then a fixed repeat interval. Round failures are logged and never
    /// break the loop. Runs until the owning task is dropped.
    pub async fn run_periodic(&self, initial_delay: Duration, interval: Duration) {
        info!(
            "Scheduling periodic project checks: first in {:?}, then every {:?}",
            initial_delay, interval
        );
        tokio::time::sleep(initial_delay).await;
        loop {
            if let Err(e) = self.run_once().await {
                warn!("Scheduled check round failed: {}", e);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::errors::{Error, Result};
    use crate::models::Project;
    use crate::notify::test_support::RecordingNotifier;
    use std::sync::Mutex as StdMutex;

    /// In-memory stand-in for the remote store's latest-project query.
    struct FakeSource {
        latest: StdMutex<Option<Project>>,
        fail: StdMutex<bool>,
    }

    impl FakeSource {
        fn new(latest: Option<Project>) -> Self {
            Self {
                latest: StdMutex::new(latest),
                fail: StdMutex::new(false),
            }
        }

        fn set_latest(&self, project: Project) {
            if let Ok(mut latest) = self.latest.lock() {
                *latest = Some(project);
            }
        }

        fn set_failing(&self, fail: bool) {
            if let Ok(mut f) = self.fail.lock() {
                *f = fail;
            }
        }
    }

    impl ProjectSource for FakeSource {
        async fn latest_project(&self) -> Result<Option<Project>> {
            if self.fail.lock().map(|f| *f).unwrap_or(false) {
                return Err(Error::Remote("simulated outage".to_string()));
            }
            Ok(self.latest.lock().map(|l| l.clone()).unwrap_or(None))
        }
    }

    fn project(id: &str, created_at: i64) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {id}"),
            location: "Cusco".to_string(),
            category_id: "cat_1".to_string(),
            description: String::new(),
            budget: 1000,
            progress: 10,
            image_url: String::new(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_first_round_notifies_and_sets_watermark() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(Some(project("proj_100", 100)));
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(notifier.project_notification_count(), 1);
        assert_eq!(notifier.last_notified_id().as_deref(), Some("proj_100"));
        let watermark = load_watermark(&pool).await?;
        assert_eq!(
            watermark,
            Some(Watermark {
                project_id: "proj_100".to_string(),
                created_at: 100
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_second_round_without_new_record_is_noop() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(Some(project("proj_100", 100)));
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;
        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(
            notifier.project_notification_count(),
            1,
            "identical latest id must not re-trigger"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_changed_id_notifies_exactly_once_and_advances() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(Some(project("proj_100", 100)));
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;
        source.set_latest(project("proj_200", 200));
        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(notifier.project_notification_count(), 2);
        assert_eq!(notifier.last_notified_id().as_deref(), Some("proj_200"));
        let watermark = load_watermark(&pool).await?;
        assert_eq!(watermark.map(|w| w.project_id), Some("proj_200".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_backdated_record_with_new_id_still_triggers() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(Some(project("proj_100", 100)));
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;
        // Earlier created_at than the watermark, but a different id.
        source.set_latest(project("proj_050", 50));
        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(notifier.project_notification_count(), 2);
        let watermark = load_watermark(&pool).await?;
        assert_eq!(watermark.map(|w| w.created_at), Some(50));
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_failure_is_swallowed() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(Some(project("proj_100", 100)));
        source.set_failing(true);
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(notifier.project_notification_count(), 0);
        assert!(load_watermark(&pool).await?.is_none(), "watermark untouched");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_remote_store_is_noop() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let source = FakeSource::new(None);
        let notifier = RecordingNotifier::default();

        run_check_round(&source, &pool, &notifier).await?;

        assert_eq!(notifier.project_notification_count(), 0);
        assert!(load_watermark(&pool).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_watermark_persists_under_stable_keys() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;

        store_watermark(&pool, "proj_100", 100).await?;

        // The raw key names are part of the stored-state contract; renaming
        // them would orphan existing databases.
        assert_eq!(
            get_state_value(&pool, "last_notified_project_id").await?.as_deref(),
            Some("proj_100")
        );
        assert_eq!(
            get_state_value(&pool, "last_notified_timestamp").await?.as_deref(),
            Some("100")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_runner_serializes_manual_triggers() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let runner = Arc::new(CheckRunner::new(
            FakeSource::new(Some(project("proj_100", 100))),
            pool,
            Arc::<RecordingNotifier>::clone(&notifier),
        ));

        // Two concurrent "run now" triggers: the second must observe the
        // first's watermark and stay silent.
        let a = Arc::clone(&runner);
        let b = Arc::clone(&runner);
        let (ra, rb) = tokio::join!(a.run_once(), b.run_once());
        ra?;
        rb?;

        assert_eq!(notifier.project_notification_count(), 1);
        Ok(())
    }
}
