use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::operations::analytics::{self, DailyRollup, RollupDelta};
use crate::db::operations::assignment::{self, SubmissionEvent};
use crate::db::operations::enrollment::{self, CompletionEvent, Enrollment};
use crate::db::operations::notification::{self, Notification};
use crate::db::operations::quiz::{self, AttemptEvent};
use crate::db::DatabaseProxy;
use crate::services::enrollment::EnrollmentStatus;
use crate::services::{require_student, ServiceError};

const RECENT_ACTIVITY_LIMIT: usize = 5;
const ROLLUP_WINDOW_DAYS: i64 = 7;
const DASHBOARD_NOTIFICATION_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Quiz,
    Assignment,
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: String,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

impl From<AttemptEvent> for ActivityEvent {
    fn from(event: AttemptEvent) -> Self {
        Self {
            kind: ActivityKind::Quiz,
            action: format!("Completed quiz in {}", event.course_title),
            time: event.completed_date,
            score: Some(event.score),
        }
    }
}

impl From<SubmissionEvent> for ActivityEvent {
    fn from(event: SubmissionEvent) -> Self {
        Self {
            kind: ActivityKind::Assignment,
            action: format!("Submitted assignment for {}", event.course_title),
            time: event.submitted_date,
            score: event.score,
        }
    }
}

impl From<CompletionEvent> for ActivityEvent {
    fn from(event: CompletionEvent) -> Self {
        Self {
            kind: ActivityKind::Completion,
            action: format!("Completed {}", event.course_title),
            time: event.completion_date,
            score: None,
        }
    }
}

/// Newest-first merge of the activity sources, keeping at most five events.
/// Events with equal timestamps keep the order in which the sources were
/// given.
pub fn merge_recent_activity(sources: Vec<Vec<ActivityEvent>>) -> Vec<ActivityEvent> {
    let mut events: Vec<ActivityEvent> = sources.into_iter().flatten().collect();
    events.sort_by(|a, b| b.time.cmp(&a.time));
    events.truncate(RECENT_ACTIVITY_LIMIT);
    events
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrollmentStats {
    pub total_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub average_progress: f64,
}

impl EnrollmentStats {
    pub fn from_enrollments(enrollments: &[Enrollment]) -> Self {
        let count_status = |status: EnrollmentStatus| {
            enrollments
                .iter()
                .filter(|row| row.status == status.as_str())
                .count()
        };

        let average_progress = if enrollments.is_empty() {
            0.0
        } else {
            let sum: i64 = enrollments.iter().map(|row| row.progress).sum();
            round2(sum as f64 / enrollments.len() as f64)
        };

        Self {
            total_courses: enrollments.len(),
            completed_courses: count_status(EnrollmentStatus::Completed),
            in_progress_courses: count_status(EnrollmentStatus::InProgress),
            average_progress,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardNotification {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_date: DateTime<Utc>,
    pub related_url: Option<String>,
}

impl From<Notification> for DashboardNotification {
    fn from(row: Notification) -> Self {
        Self {
            id: row.id,
            title: row.title,
            message: row.message,
            kind: row.notification_type,
            created_date: row.created_date,
            related_url: row.related_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardAnalytics {
    #[serde(flatten)]
    pub stats: EnrollmentStats,
    pub recent_activity: Vec<ActivityEvent>,
    pub study_data: Vec<DailyRollup>,
    pub notifications: Vec<DashboardNotification>,
}

/// First day of the rollup window ending at `today`, inclusive.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(ROLLUP_WINDOW_DAYS - 1)
}

pub async fn dashboard(
    db: &DatabaseProxy,
    email: &str,
    today: NaiveDate,
) -> Result<DashboardAnalytics, ServiceError> {
    let pool = db.pool();
    let student = require_student(pool, email).await?;
    let limit = RECENT_ACTIVITY_LIMIT as i64;

    let enrollments = enrollment::list_enrollments(pool, student.id).await?;
    let attempts = quiz::recent_attempts(pool, student.id, limit).await?;
    let submissions = assignment::recent_submissions(pool, student.id, limit).await?;
    let completions = enrollment::recent_completions(pool, student.id, limit).await?;

    let recent_activity = merge_recent_activity(vec![
        attempts.into_iter().map(ActivityEvent::from).collect(),
        submissions.into_iter().map(ActivityEvent::from).collect(),
        completions.into_iter().map(ActivityEvent::from).collect(),
    ]);

    let study_data = analytics::rollups_between(pool, student.id, window_start(today), today).await?;
    let notifications = notification::list_notifications(
        pool,
        student.id,
        true,
        DASHBOARD_NOTIFICATION_LIMIT,
    )
    .await?
    .into_iter()
    .map(DashboardNotification::from)
    .collect();

    Ok(DashboardAnalytics {
        stats: EnrollmentStats::from_enrollments(&enrollments),
        recent_activity,
        study_data,
        notifications,
    })
}

/// Validated additive study-time update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyTimeUpdate {
    pub study_time: i64,
    pub courses_accessed: i64,
    pub quizzes_completed: i64,
    pub assignments_submitted: i64,
}

impl StudyTimeUpdate {
    pub fn validate(&self) -> Result<RollupDelta, ServiceError> {
        if self.study_time <= 0 {
            return Err(ServiceError::validation("study_time must be a positive integer"));
        }
        if self.courses_accessed < 0 || self.quizzes_completed < 0 || self.assignments_submitted < 0 {
            return Err(ServiceError::validation("Activity counters must not be negative"));
        }
        Ok(RollupDelta {
            study_time: self.study_time,
            courses_accessed: self.courses_accessed,
            quizzes_completed: self.quizzes_completed,
            assignments_submitted: self.assignments_submitted,
        })
    }
}

pub async fn record_study_time(
    db: &DatabaseProxy,
    email: &str,
    update: StudyTimeUpdate,
    today: NaiveDate,
) -> Result<DailyRollup, ServiceError> {
    let delta = update.validate()?;
    let student = require_student(db.pool(), email).await?;
    let rollup = analytics::add_to_rollup(db.pool(), student.id, today, delta).await?;

    tracing::debug!(
        student_id = student.id,
        date = %today,
        study_time = rollup.study_time,
        "study time recorded"
    );

    Ok(rollup)
}
