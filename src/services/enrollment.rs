use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::operations::course;
use crate::db::operations::enrollment::{self, Enrollment, QuizScoreEntry};
use crate::db::DatabaseProxy;
use crate::services::{require_student, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Enrolled,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enrolled => "Enrolled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Enrolled" => Some(Self::Enrolled),
            "In Progress" => Some(Self::InProgress),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Status after a quiz verdict. A pass completes the course.
    pub fn after_quiz(passed: bool) -> Self {
        if passed {
            Self::Completed
        } else {
            Self::InProgress
        }
    }
}

/// A validated manual progress change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: i64,
    pub status: EnrollmentStatus,
}

impl ProgressUpdate {
    pub fn new(progress: i64) -> Result<Self, ServiceError> {
        if !(0..=100).contains(&progress) {
            return Err(ServiceError::validation("Progress must be between 0 and 100"));
        }
        let status = if progress == 100 {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::InProgress
        };
        Ok(Self { progress, status })
    }

    pub fn completion_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.status == EnrollmentStatus::Completed).then_some(now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentSummary {
    pub course_id: String,
    #[serde(rename = "title")]
    pub course_title: String,
    pub status: EnrollmentStatus,
    pub progress: i64,
    pub enrolled_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub quiz_scores: Vec<QuizScoreEntry>,
    pub certificate_issued: bool,
    pub completion_date: Option<DateTime<Utc>>,
}

impl From<Enrollment> for EnrollmentSummary {
    fn from(row: Enrollment) -> Self {
        Self {
            status: EnrollmentStatus::parse(&row.status).unwrap_or(EnrollmentStatus::Enrolled),
            course_id: row.course_id,
            course_title: row.course_title,
            progress: row.progress,
            enrolled_date: row.enrolled_date,
            last_updated: row.last_updated,
            quiz_scores: row.quiz_scores.0,
            certificate_issued: row.certificate_issued,
            completion_date: row.completion_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    Enrolled,
    AlreadyEnrolled,
}

pub async fn enroll(
    db: &DatabaseProxy,
    email: &str,
    course_id: &str,
) -> Result<EnrollOutcome, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    let course = course::find_course(db.pool(), course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course does not exist"))?;

    let created = enrollment::enroll_if_missing(db.pool(), student.id, &course.id, Utc::now()).await?;
    if !created {
        return Ok(EnrollOutcome::AlreadyEnrolled);
    }

    tracing::info!(student_id = student.id, course_id = %course.id, "student enrolled");
    Ok(EnrollOutcome::Enrolled)
}

pub async fn update_progress(
    db: &DatabaseProxy,
    email: &str,
    course_id: &str,
    progress: i64,
) -> Result<EnrollmentSummary, ServiceError> {
    let update = ProgressUpdate::new(progress)?;
    let student = require_student(db.pool(), email).await?;
    course::find_course(db.pool(), course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course does not exist"))?;
    let current = enrollment::find_enrollment(db.pool(), student.id, course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Enrollment does not exist"))?;

    let now = Utc::now();
    enrollment::set_progress(
        db.pool(),
        current.id,
        update.progress,
        update.status.as_str(),
        update.completion_date(now),
        now,
    )
    .await?;

    tracing::info!(
        student_id = student.id,
        course_id,
        progress = update.progress,
        status = update.status.as_str(),
        "course progress updated"
    );

    let updated = enrollment::find_enrollment(db.pool(), student.id, course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Enrollment does not exist"))?;
    Ok(updated.into())
}

pub async fn list_for_student(
    db: &DatabaseProxy,
    email: &str,
) -> Result<Vec<EnrollmentSummary>, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    let rows = enrollment::list_enrollments(db.pool(), student.id).await?;
    Ok(rows.into_iter().map(EnrollmentSummary::from).collect())
}
