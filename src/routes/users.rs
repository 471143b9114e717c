use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::response::AppError;
use crate::routes::EmailQuery;
use crate::services::profile::{self, ScheduleItem, UserProfile, UserSettings};
use crate::services::require_student;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ScheduleResponse {
    schedule: Vec<ScheduleItem>,
}

pub async fn settings(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserSettings>, AppError> {
    let settings = profile::settings(state.db(), query.require()?).await?;
    Ok(Json(settings))
}

pub async fn profile(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = profile::profile(state.db(), query.require()?).await?;
    Ok(Json(profile))
}

pub async fn schedule(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let schedule = profile::schedule(state.db(), query.require()?).await?;
    Ok(Json(ScheduleResponse { schedule }))
}

pub async fn discussions(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<()>, AppError> {
    require_student(state.db().pool(), query.require()?).await?;
    Err(AppError::not_implemented("Discussions are not available yet"))
}
