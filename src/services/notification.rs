use crate::db::operations::notification::{self, Notification};
use crate::db::DatabaseProxy;
use crate::services::{require_student, ServiceError};

const NOTIFICATION_PAGE_LIMIT: i64 = 50;

pub async fn mark_read(db: &DatabaseProxy, notification_id: Option<i64>) -> Result<(), ServiceError> {
    let notification_id =
        notification_id.ok_or_else(|| ServiceError::validation("Notification ID is required"))?;

    if !notification::mark_read(db.pool(), notification_id).await? {
        return Err(ServiceError::not_found("Notification does not exist"));
    }
    Ok(())
}

/// Newest notifications for the student, optionally only the unread ones.
pub async fn list_for_student(
    db: &DatabaseProxy,
    email: &str,
    unread_only: bool,
) -> Result<Vec<Notification>, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    Ok(notification::list_notifications(db.pool(), student.id, unread_only, NOTIFICATION_PAGE_LIMIT).await?)
}
