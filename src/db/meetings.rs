use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Meeting, NewMeeting};
use chrono::NaiveDateTime;
use rusqlite::{OptionalExtension, Row, params};
use tracing::{debug, info, instrument};

/// Display format used for meeting date/times, e.g. `07/03/2026 14:30`.
pub const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

fn meeting_from_row(row: &Row) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        title: row.get(1)?,
        date_time: row.get(2)?,
        municipality: row.get(3)?,
        specific_location: row.get(4)?,
        estimated_attendees: row.get(5)?,
    })
}

/// Validates the user-entered meeting fields before they touch the store.
///
/// Mirrors the create/update form rules: no empty text fields and a
/// date/time that parses in the fixed display format. The attendee count is
/// non-negative by type.
///
/// # Errors
///
/// Returns `Error::Validation` naming the offending field; nothing is
/// persisted on failure.
pub fn validate_meeting(meeting: &NewMeeting) -> Result<()> {
    if meeting.title.trim().is_empty() {
        return Err(Error::Validation("Meeting title must not be empty".to_string()));
    }
    if meeting.municipality.trim().is_empty() {
        return Err(Error::Validation("Municipality must not be empty".to_string()));
    }
    if meeting.specific_location.trim().is_empty() {
        return Err(Error::Validation(
            "Specific location must not be empty".to_string(),
        ));
    }
    NaiveDateTime::parse_from_str(&meeting.date_time, DATE_TIME_FORMAT).map_err(|_| {
        Error::Validation(format!(
            "Date/time '{}' does not match format dd/MM/yyyy HH:mm",
            meeting.date_time
        ))
    })?;
    Ok(())
}

/// Inserts a new meeting record and returns its generated id.
///
/// # Errors
///
/// Returns `Error::Validation` if the fields fail form validation, or
/// `Error::Database` on lock/statement failures.
#[instrument(skip(pool))]
pub async fn insert_meeting(pool: &DbPool, meeting: &NewMeeting) -> Result<i64> {
    validate_meeting(meeting)?;
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO meetings (title, date_time, municipality, specific_location, estimated_attendees)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let meeting_id = stmt.insert(params![
        meeting.title,
        meeting.date_time,
        meeting.municipality,
        meeting.specific_location,
        meeting.estimated_attendees,
    ])?;
    info!("Created meeting_id {}: '{}'", meeting_id, meeting.title);
    Ok(meeting_id)
}

/// Fetches a single meeting by id, or `None` if no such record exists.
///
/// # Errors
///
/// Returns `Error::Database` on lock/statement failures.
#[instrument(skip(pool))]
pub async fn get_meeting_by_id(pool: &DbPool, id: i64) -> Result<Option<Meeting>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, title, date_time, municipality, specific_location, estimated_attendees
         FROM meetings WHERE id = ?1",
    )?;
    let meeting = stmt
        .query_row(params![id], meeting_from_row)
        .optional()?;
    debug!("Fetched meeting {}: found={}", id, meeting.is_some());
    Ok(meeting)
}

/// Lists all meetings, newest first (descending id).
///
/// # Errors
///
/// Returns `Error::Database` on lock/statement failures.
#[instrument(skip(pool))]
pub async fn list_meetings(pool: &DbPool) -> Result<Vec<Meeting>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, title, date_time, municipality, specific_location, estimated_attendees
         FROM meetings ORDER BY id DESC",
    )?;
    let meetings = stmt
        .query_map([], meeting_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!("Listed {} meetings", meetings.len());
    Ok(meetings)
}

/// Updates an existing meeting in place.
///
/// # Errors
///
/// Returns `Error::Validation` on bad fields, `Error::NotFound` if `id`
/// does not exist, or `Error::Database` on lock/statement failures.
#[instrument(skip(pool))]
pub async fn update_meeting(pool: &DbPool, id: i64, meeting: &NewMeeting) -> Result<()> {
    validate_meeting(meeting)?;
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let changed = conn.execute(
        "UPDATE meetings
         SET title = ?1, date_time = ?2, municipality = ?3, specific_location = ?4,
             estimated_attendees = ?5
         WHERE id = ?6",
        params![
            meeting.title,
            meeting.date_time,
            meeting.municipality,
            meeting.specific_location,
            meeting.estimated_attendees,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("meeting {id}")));
    }
    info!("Updated meeting_id {}", id);
    Ok(())
}

/// Deletes a meeting by identity.
///
/// # Errors
///
/// Returns `Error::NotFound` if `id` does not exist, or `Error::Database`
/// on lock/statement failures.
#[instrument(skip(pool))]
pub async fn delete_meeting(pool: &DbPool, id: i64) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let changed = conn.execute("DELETE FROM meetings WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(Error::NotFound(format!("meeting {id}")));
    }
    info!("Deleted meeting_id {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, sample_new_meeting, setup_test_db};
    use crate::errors::Result;

    #[tokio::test]
    async fn test_insert_then_get_roundtrip() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let new_meeting = sample_new_meeting("Budget review");
        let id = insert_meeting(&db_pool, &new_meeting).await?;

        let fetched = get_meeting_by_id(&db_pool, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("meeting {id}")))?;

        assert_eq!(fetched.id, id);
        assert_eq!(fetched.title, new_meeting.title);
        assert_eq!(fetched.date_time, new_meeting.date_time);
        assert_eq!(fetched.municipality, new_meeting.municipality);
        assert_eq!(fetched.specific_location, new_meeting.specific_location);
        assert_eq!(fetched.estimated_attendees, new_meeting.estimated_attendees);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_is_newest_first() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let first = insert_meeting(&db_pool, &sample_new_meeting("First")).await?;
        let second = insert_meeting(&db_pool, &sample_new_meeting("Second")).await?;
        let third = insert_meeting(&db_pool, &sample_new_meeting("Third")).await?;

        let meetings = list_meetings(&db_pool).await?;
        let ids: Vec<i64> = meetings.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![third, second, first]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_changes_all_fields() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let id = insert_meeting(&db_pool, &sample_new_meeting("Original")).await?;
        let updated = NewMeeting {
            title: "Rescheduled".to_string(),
            date_time: "01/12/2026 09:00".to_string(),
            municipality: "San Isidro".to_string(),
            specific_location: "Auditorium".to_string(),
            estimated_attendees: 120,
        };
        update_meeting(&db_pool, id, &updated).await?;

        let fetched = get_meeting_by_id(&db_pool, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("meeting {id}")))?;
        assert_eq!(fetched.title, "Rescheduled");
        assert_eq!(fetched.date_time, "01/12/2026 09:00");
        assert_eq!(fetched.estimated_attendees, 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let id = insert_meeting(&db_pool, &sample_new_meeting("Ephemeral")).await?;
        delete_meeting(&db_pool, id).await?;

        assert!(get_meeting_by_id(&db_pool, id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let result = update_meeting(&db_pool, 9999, &sample_new_meeting("Ghost")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_date_format_is_rejected() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let mut bad = sample_new_meeting("Bad date");
        bad.date_time = "2026-12-01 09:00".to_string();

        let result = insert_meeting(&db_pool, &bad).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        // Nothing was persisted.
        assert!(list_meetings(&db_pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_title_is_rejected() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let mut bad = sample_new_meeting("  ");
        bad.title = "  ".to_string();

        let result = insert_meeting(&db_pool, &bad).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        Ok(())
    }
}
