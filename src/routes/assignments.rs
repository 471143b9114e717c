use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::assignment::Submission;
use crate::response::AppError;
use crate::routes::{optional_i64, EmailQuery, JsonPayload};
use crate::services::assignments::{self, AssignmentSubmission, CourseAssignments};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    email: Option<String>,
    #[serde(default, deserialize_with = "optional_i64")]
    assignment_id: Option<i64>,
    submission_text: Option<String>,
    file_url: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    msg: &'static str,
    submission: Submission,
}

#[derive(Serialize)]
pub struct UserAssignmentsResponse {
    courses: Vec<CourseAssignments>,
}

pub async fn submit(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let request = AssignmentSubmission {
        email: payload.email,
        assignment_id: payload.assignment_id,
        submission_text: payload.submission_text,
        file_url: payload.file_url,
    };
    let submission = assignments::submit(state.db(), request).await?;

    Ok(Json(SubmitResponse {
        msg: "Assignment submitted successfully",
        submission,
    }))
}

pub async fn user_assignments(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserAssignmentsResponse>, AppError> {
    let courses = assignments::list_for_student(state.db(), query.require()?).await?;
    Ok(Json(UserAssignmentsResponse { courses }))
}
