use crate::errors::Result;
use crate::models::{Category, Project, ProjectDraft};
use crate::remote::decode::{decode_category, decode_project, decode_projects};
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Remote "Projects" collection name.
const PROJECTS: &str = "Projects";
/// Remote "Category" collection name.
const CATEGORIES: &str = "Category";

/// Read access to the single most recently created project.
///
/// The periodic checker depends on this trait rather than on the concrete
/// HTTP client so rounds can run against an in-memory source in tests.
pub trait ProjectSource {
    /// Returns the project with the maximum `created_at`, or `None` when
    /// the collection is empty.
    fn latest_project(&self) -> impl Future<Output = Result<Option<Project>>> + Send;
}

/// Client for the remote realtime document store's REST surface.
///
/// Collections are JSON maps from generated string keys to flat records;
/// an absent collection reads as JSON `null`. No request timeout is set:
/// a hung call is bounded by the caller's own scheduling, never retried
/// here.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// Creates a client for the store rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.base_url, collection)
    }

    fn member_url(&self, collection: &str, key: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, collection, key)
    }

    /// Fetches a whole collection as a key→record map. A `null` body (the
    /// store's encoding of "no such collection yet") reads as empty.
    async fn fetch_collection(&self, collection: &str) -> Result<Map<String, Value>> {
        let value: Value = self
            .client
            .get(self.collection_url(collection))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => {
                warn!(
                    "Collection '{}' has unexpected shape {:?}; treating as empty",
                    collection,
                    other.as_str()
                );
                Ok(Map::new())
            }
        }
    }

    async fn fetch_member(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let value: Value = self
            .client
            .get(self.member_url(collection, key))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    /// Single-shot read of all projects, newest first.
    ///
    /// Records that fail to decode are logged and skipped; they are never
    /// fatal to the batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the round-trip itself fails.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let map = self.fetch_collection(PROJECTS).await?;
        let projects = decode_projects(&map);
        debug!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    /// Single-shot read of one project by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` on transport failure or `Error::Remote` if the
    /// record exists but is not an object.
    #[instrument(skip(self))]
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        match self.fetch_member(PROJECTS, id).await? {
            Some(record) => Ok(Some(decode_project(id, &record)?)),
            None => Ok(None),
        }
    }

    /// Creates a project under a client-generated key of the form
    /// `proj_<epoch-millis>`, with `created_at` set to the same instant.
    ///
    /// A write failure propagates to the caller and is surfaced once; the
    /// operation is not retried automatically.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the write round-trip fails.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        let created_at = Utc::now().timestamp_millis();
        let id = format!("proj_{created_at}");
        let mut body = serde_json::to_value(draft)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("createdAt".to_string(), json!(created_at));
        }

        self.client
            .put(self.member_url(PROJECTS, &id))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        info!("Created remote project '{}' ({})", draft.name, id);
        Ok(Project {
            id,
            name: draft.name.clone(),
            location: draft.location.clone(),
            category_id: draft.category_id.clone(),
            description: draft.description.clone(),
            budget: draft.budget,
            progress: draft.progress,
            image_url: draft.image_url.clone(),
            created_at,
        })
    }

    /// Single-shot read of all categories.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the round-trip fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let map = self.fetch_collection(CATEGORIES).await?;
        let mut categories: Vec<Category> = Vec::with_capacity(map.len());
        for (id, record) in &map {
            match decode_category(id, record) {
                Ok(category) => categories.push(category),
                Err(e) => warn!("Skipping malformed category record: {}", e),
            }
        }
        Ok(categories)
    }

    /// Looks up one category. A dangling `Project::category_id` reference
    /// resolves to `None` and renders as "uncategorized" upstream.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` on transport failure or `Error::Remote` if the
    /// record exists but is not an object.
    #[instrument(skip(self))]
    pub async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        match self.fetch_member(CATEGORIES, id).await? {
            Some(record) => Ok(Some(decode_category(id, &record)?)),
            None => Ok(None),
        }
    }

    /// Continuous change listener over the projects collection.
    ///
    /// Polls at `interval` and publishes a new snapshot whenever the
    /// decoded set differs from the previous one. The background task ends
    /// when every receiver has been dropped; fetch errors are logged and
    /// the previous snapshot stands.
    #[must_use]
    pub fn watch_projects(&self, interval: Duration) -> watch::Receiver<Vec<Project>> {
        let (tx, rx) = watch::channel(Vec::new());
        let store = self.clone();
        // Detached on purpose; the task ends itself once `rx` is gone.
        let _ = tokio::spawn(async move {
            loop {
                match store.list_projects().await {
                    Ok(projects) => {
                        tx.send_if_modified(|current| {
                            if *current == projects {
                                false
                            } else {
                                *current = projects;
                                true
                            }
                        });
                    }
                    Err(e) => warn!("Project watch poll failed: {}", e),
                }
                tokio::time::sleep(interval).await;
                if tx.is_closed() {
                    break;
                }
            }
            debug!("Project watcher stopped (no remaining subscribers)");
        });
        rx
    }
}

impl ProjectSource for RemoteStore {
    /// Ordered/limited query: `orderBy="createdAt"`, `limitToLast=1`.
    async fn latest_project(&self) -> Result<Option<Project>> {
        let value: Value = self
            .client
            .get(self.collection_url(PROJECTS))
            .query(&[("orderBy", "\"createdAt\""), ("limitToLast", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let map = match value {
            Value::Object(map) => map,
            _ => return Ok(None),
        };

        Ok(decode_projects(&map).into_iter().next())
    }
}
