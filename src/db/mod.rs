pub mod app_state;
pub mod connection;
pub mod meetings;
pub(crate) mod schema;
#[cfg(test)]
pub(crate) mod test_utils;

pub use app_state::{get_state_flag, get_state_value, set_state_flag, set_state_value};
pub use connection::{DbPool, init_db};
pub use meetings::{
    DATE_TIME_FORMAT, delete_meeting, get_meeting_by_id, insert_meeting, list_meetings,
    update_meeting, validate_meeting,
};
