use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Assignment,
    Quiz,
    Course,
    General,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Quiz => "quiz",
            Self::Course => "course",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_date: DateTime<Utc>,
    pub related_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: &'a str,
    pub related_url: Option<&'a str>,
}

pub async fn insert_notification<'e, E>(
    executor: E,
    student_id: i64,
    notification: &NewNotification<'_>,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (student_id, title, message, notification_type, is_read, created_date, related_url)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(notification.title)
    .bind(notification.message)
    .bind(notification.kind.as_str())
    .bind(now)
    .bind(notification.related_url)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Returns `false` when no notification has that id.
pub async fn mark_read<'e, E>(executor: E, notification_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(notification_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_notifications<'e, E>(
    executor: E,
    student_id: i64,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, student_id, title, message, notification_type, is_read, created_date, related_url
        FROM notifications
        WHERE student_id = ? AND (? = 0 OR is_read = 0)
        ORDER BY created_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(student_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(executor)
    .await
}
