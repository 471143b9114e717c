use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::course::{self, Course};
use crate::response::AppError;
use crate::routes::{optional_i64, EmailQuery, JsonPayload};
use crate::services::enrollment::{self, EnrollOutcome, EnrollmentSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    email: Option<String>,
    course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    email: Option<String>,
    course_id: Option<String>,
    #[serde(default, deserialize_with = "optional_i64")]
    progress: Option<i64>,
}

#[derive(Serialize)]
pub struct CourseSummary {
    id: String,
    title: String,
    description: String,
    duration: String,
    icon: String,
    difficulty_level: String,
    category: String,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            duration: course.duration,
            icon: course.icon,
            difficulty_level: course.difficulty_level,
            category: course.category,
        }
    }
}

#[derive(Serialize)]
pub struct CourseListResponse {
    courses: Vec<CourseSummary>,
}

#[derive(Serialize)]
pub struct CourseDetailResponse {
    course: Course,
}

#[derive(Serialize)]
pub struct MessageResponse {
    msg: &'static str,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    msg: &'static str,
    enrollment: EnrollmentSummary,
}

#[derive(Serialize)]
pub struct UserCoursesResponse {
    courses: Vec<EnrollmentSummary>,
}

fn required_field<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(message))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<CourseListResponse>, AppError> {
    let courses = course::list_courses(state.db().pool()).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseSummary::from).collect(),
    }))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetailResponse>, AppError> {
    let course = course::find_course(state.db().pool(), &course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course does not exist"))?;
    Ok(Json(CourseDetailResponse { course }))
}

pub async fn enroll(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<EnrollRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    const MISSING: &str = "Email and course_id are required";
    let email = required_field(&payload.email, MISSING)?;
    let course_id = required_field(&payload.course_id, MISSING)?;

    let msg = match enrollment::enroll(state.db(), email, course_id).await? {
        EnrollOutcome::Enrolled => "Enrolled successfully",
        EnrollOutcome::AlreadyEnrolled => "Already enrolled",
    };
    Ok(Json(MessageResponse { msg }))
}

pub async fn update_progress(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    const MISSING: &str = "Email, course_id and progress are required";
    let email = required_field(&payload.email, MISSING)?;
    let course_id = required_field(&payload.course_id, MISSING)?;
    let progress = payload.progress.ok_or_else(|| AppError::validation(MISSING))?;

    let enrollment = enrollment::update_progress(state.db(), email, course_id, progress).await?;
    Ok(Json(ProgressResponse {
        msg: "Progress updated",
        enrollment,
    }))
}

pub async fn user_courses(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserCoursesResponse>, AppError> {
    let courses = enrollment::list_for_student(state.db(), query.require()?).await?;
    Ok(Json(UserCoursesResponse { courses }))
}
