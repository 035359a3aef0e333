use serde::Serialize;

/// A government project as stored in the remote "Projects" collection.
///
/// The record is keyed by a store-generated string id; `created_at` is the
/// sole ordering key for "latest". Reads go through per-field coercion
/// rather than derived deserialization because numeric fields tolerate
/// string encodings on the wire (see [`crate::remote::decode`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Store key, e.g. `"proj_1717171717171"`. Unique and stable.
    pub id: String,
    pub name: String,
    pub location: String,
    /// Foreign key into the "Category" collection. Not enforced remotely;
    /// a dangling reference renders as uncategorized.
    pub category_id: String,
    pub description: String,
    /// Budget in whole currency units, non-negative.
    pub budget: i64,
    /// Completion percentage in `[0, 100]`.
    pub progress: u8,
    pub image_url: String,
    /// Epoch milliseconds, set by the client at creation time.
    pub created_at: i64,
}

/// Fields supplied by the user when creating a project; the store key and
/// `created_at` are generated at write time. Serializes straight into the
/// wire record, so field names follow the collection's camelCase keys.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub location: String,
    pub category_id: String,
    pub description: String,
    pub budget: i64,
    pub progress: u8,
    pub image_url: String,
}

/// A project category from the remote "Category" collection. Decoded
/// per-field like [`Project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub image_url: String,
}

/// A user-created meeting record, owned exclusively by the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    /// Auto-incrementing primary key.
    pub id: i64,
    pub title: String,
    /// Display format `dd/MM/yyyy HH:mm`, validated on insert/update.
    pub date_time: String,
    /// Municipality (district) where the meeting takes place.
    pub municipality: String,
    /// Specific venue, e.g. a meeting room.
    pub specific_location: String,
    pub estimated_attendees: u32,
}

/// Meeting fields as entered in the create/update form, before an id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeeting {
    pub title: String,
    pub date_time: String,
    pub municipality: String,
    pub specific_location: String,
    pub estimated_attendees: u32,
}
