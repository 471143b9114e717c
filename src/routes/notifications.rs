use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::notification::Notification;
use crate::response::AppError;
use crate::routes::{optional_i64, EmailQuery, JsonPayload};
use crate::services::notification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    email: Option<String>,
    unread_only: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default, deserialize_with = "optional_i64")]
    notification_id: Option<i64>,
}

#[derive(Serialize)]
pub struct ListResponse {
    notifications: Vec<Notification>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    msg: &'static str,
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let unread_only = parse_flag(query.unread_only.as_deref());
    let email = EmailQuery { email: query.email };
    let notifications =
        notification::list_for_student(state.db(), email.require()?, unread_only).await?;
    Ok(Json(ListResponse { notifications }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<MarkReadRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    notification::mark_read(state.db(), payload.notification_id).await?;
    Ok(Json(MessageResponse {
        msg: "Notification marked as read",
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn unread_flag_parsing() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));
    }
}
