use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::operations::assignment;
use crate::db::operations::enrollment;
use crate::db::operations::quiz;
use crate::db::DatabaseProxy;
use crate::services::enrollment::EnrollmentStatus;
use crate::services::{require_student, ServiceError};

const SCHEDULE_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPreferences {
    pub email_notifications: bool,
    pub newsletter: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            newsletter: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSettings {
    pub email: String,
    pub username: String,
    pub notifications: NotificationPreferences,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub enrolled_courses: usize,
    pub completed_courses: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScheduleItem {
    Assignment {
        course: String,
        title: String,
        due_date: DateTime<Utc>,
    },
    Quiz {
        course: String,
        title: String,
        created_date: DateTime<Utc>,
    },
}

pub async fn settings(db: &DatabaseProxy, email: &str) -> Result<UserSettings, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    Ok(UserSettings {
        email: student.email,
        username: student.username,
        notifications: NotificationPreferences::default(),
    })
}

pub async fn profile(db: &DatabaseProxy, email: &str) -> Result<UserProfile, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    let enrollments = enrollment::list_enrollments(db.pool(), student.id).await?;
    let completed = enrollments
        .iter()
        .filter(|row| row.status == EnrollmentStatus::Completed.as_str())
        .count();

    Ok(UserProfile {
        username: student.username,
        email: student.email,
        bio: student.bio,
        profile_picture: student.profile_picture,
        date_joined: student.date_joined,
        enrolled_courses: enrollments.len(),
        completed_courses: completed,
    })
}

/// Upcoming assignments by due date, followed by active quizzes newest first.
pub async fn schedule(db: &DatabaseProxy, email: &str) -> Result<Vec<ScheduleItem>, ServiceError> {
    let student = require_student(db.pool(), email).await?;

    let assignments =
        assignment::upcoming_for_student(db.pool(), student.id, Utc::now(), SCHEDULE_LIMIT).await?;
    let quizzes = quiz::active_for_student(db.pool(), student.id, SCHEDULE_LIMIT).await?;

    let items = assignments
        .into_iter()
        .map(|a| ScheduleItem::Assignment {
            course: a.course_title,
            title: a.title,
            due_date: a.due_date,
        })
        .chain(quizzes.into_iter().map(|q| ScheduleItem::Quiz {
            course: q.course_title,
            title: q.title,
            created_date: q.created_date,
        }))
        .collect();

    Ok(items)
}
