use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::operations::analytics::DailyRollup;
use crate::response::AppError;
use crate::routes::{optional_i64, EmailQuery, JsonPayload};
use crate::services::analytics::{self, DashboardAnalytics, StudyTimeUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StudyTimeRequest {
    email: Option<String>,
    #[serde(default, deserialize_with = "optional_i64")]
    study_time: Option<i64>,
    #[serde(default, deserialize_with = "optional_i64")]
    courses_accessed: Option<i64>,
    #[serde(default, deserialize_with = "optional_i64")]
    quizzes_completed: Option<i64>,
    #[serde(default, deserialize_with = "optional_i64")]
    assignments_submitted: Option<i64>,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    analytics: DashboardAnalytics,
}

#[derive(Serialize)]
pub struct StudyTimeResponse {
    msg: &'static str,
    today: DailyRollup,
}

pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let today = Utc::now().date_naive();
    let analytics = analytics::dashboard(state.db(), query.require()?, today).await?;
    Ok(Json(AnalyticsResponse { analytics }))
}

pub async fn update_study_time(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<StudyTimeRequest>,
) -> Result<Json<StudyTimeResponse>, AppError> {
    let email = EmailQuery {
        email: payload.email,
    };
    let (Ok(email), Some(study_time)) = (email.require(), payload.study_time) else {
        return Err(AppError::validation("Email and study_time are required"));
    };

    let update = StudyTimeUpdate {
        study_time,
        courses_accessed: payload.courses_accessed.unwrap_or(0),
        quizzes_completed: payload.quizzes_completed.unwrap_or(0),
        assignments_submitted: payload.assignments_submitted.unwrap_or(0),
    };
    let today = analytics::record_study_time(state.db(), email, update, Utc::now().date_naive()).await?;

    Ok(Json(StudyTimeResponse {
        msg: "Study time updated",
        today,
    }))
}
