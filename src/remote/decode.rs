//! Per-field coercion of remote wire JSON into typed values.
//!
//! The remote store tolerates multiple on-wire representations of the same
//! logical field: a budget may arrive as a JSON number or a numeric string,
//! a category id as a string or an integer. Each field is decoded by one
//! explicit coerce function that returns a typed default on any
//! unrecognized shape, so malformed fields never abort their record and
//! malformed records never abort their siblings.

use crate::errors::{Error, Result};
use crate::models::{Category, Project};
use serde_json::{Map, Value};
use tracing::warn;

/// Coerces a field to a string. Accepts a JSON string as-is and renders a
/// JSON number; anything else yields the empty string.
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Coerces a field to an `i64`. Accepts a JSON integer or a string that
/// parses as one; anything else yields 0.
pub fn coerce_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Coerces a progress field to a percentage in `[0, 100]`, clamping
/// out-of-range numbers. Unrecognized shapes yield 0.
pub fn coerce_progress(value: Option<&Value>) -> u8 {
    coerce_i64(value).clamp(0, 100) as u8
}

/// Decodes one `Projects` record keyed by `id`.
///
/// Field-level problems degrade to typed defaults; only a record that is
/// not a JSON object at all is an error, which callers log and skip.
///
/// # Errors
///
/// Returns `Error::Remote` if `value` is not a JSON object.
pub fn decode_project(id: &str, value: &Value) -> Result<Project> {
    let fields = value
        .as_object()
        .ok_or_else(|| Error::Remote(format!("project record '{id}' is not an object")))?;

    let budget = coerce_i64(fields.get("budget"));
    if budget < 0 {
        warn!("Project '{}' has negative budget {}; defaulting to 0", id, budget);
    }

    Ok(Project {
        id: id.to_string(),
        name: coerce_string(fields.get("name")),
        location: coerce_string(fields.get("location")),
        category_id: coerce_string(fields.get("categoryId")),
        description: coerce_string(fields.get("description")),
        budget: budget.max(0),
        progress: coerce_progress(fields.get("progress")),
        image_url: coerce_string(fields.get("imageUrl")),
        created_at: coerce_i64(fields.get("createdAt")),
    })
}

/// Decodes a whole `Projects` collection map, newest first.
///
/// Malformed records are logged and skipped; their siblings always survive.
#[must_use]
pub fn decode_projects(map: &Map<String, Value>) -> Vec<Project> {
    let mut projects: Vec<Project> = Vec::with_capacity(map.len());
    for (id, record) in map {
        match decode_project(id, record) {
            Ok(project) => projects.push(project),
            Err(e) => warn!("Skipping malformed project record: {}", e),
        }
    }
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    projects
}

/// Decodes one `Category` record keyed by `id`.
///
/// # Errors
///
/// Returns `Error::Remote` if `value` is not a JSON object.
pub fn decode_category(id: &str, value: &Value) -> Result<Category> {
    let fields = value
        .as_object()
        .ok_or_else(|| Error::Remote(format!("category record '{id}' is not an object")))?;

    Ok(Category {
        id: id.to_string(),
        title: coerce_string(fields.get("title")),
        image_url: coerce_string(fields.get("imageUrl")),
    })
}
