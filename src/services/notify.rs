use chrono::Utc;
use rusqlite::Result as SqlResult;

use crate::db::Database;
use crate::models::Notification;

/// Writes a notification record for the dashboards to pick up.
pub fn emit(
    db: &Database,
    user_id: &str,
    project_id: Option<&str>,
    kind: &str,
    message: String,
) -> SqlResult<Notification> {
    let notification = Notification {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        project_id: project_id.map(str::to_string),
        kind: kind.to_string(),
        message,
        read: false,
        created_at: Utc::now(),
    };
    db.insert_notification(&notification)?;
    Ok(notification)
}
