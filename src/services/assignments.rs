use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::db::operations::assignment::{self, Assignment, Submission};
use crate::db::operations::notification::{self, NewNotification, NotificationKind};
use crate::db::DatabaseProxy;
use crate::services::{required, require_student, ServiceError};

#[derive(Debug, Clone, Default)]
pub struct AssignmentSubmission {
    pub email: Option<String>,
    pub assignment_id: Option<i64>,
    pub submission_text: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentStatus {
    pub assignment_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub max_score: i64,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAssignments {
    pub course_id: String,
    pub course_title: String,
    pub assignments: Vec<AssignmentStatus>,
}

pub async fn submit(
    db: &DatabaseProxy,
    request: AssignmentSubmission,
) -> Result<Submission, ServiceError> {
    let (Ok(email), Some(assignment_id), Ok(text)) = (
        required(request.email.as_deref(), "email"),
        request.assignment_id,
        required(request.submission_text.as_deref(), "submission_text"),
    ) else {
        return Err(ServiceError::validation(
            "Email, assignment_id and submission_text are required",
        ));
    };
    let file_url = request
        .file_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let student = require_student(db.pool(), email).await?;
    let assignment = assignment::find_assignment(db.pool(), assignment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Assignment does not exist"))?;

    let now = Utc::now();
    let mut tx = db.begin().await?;

    let submission =
        assignment::upsert_submission(&mut *tx, assignment.id, student.id, text, file_url, now).await?;

    let message = format!("Your submission for {} has been received.", assignment.title);
    notification::insert_notification(
        &mut *tx,
        student.id,
        &NewNotification {
            kind: NotificationKind::Assignment,
            title: "Assignment Submitted",
            message: &message,
            related_url: None,
        },
        now,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        student_id = student.id,
        assignment_id = assignment.id,
        submission_id = submission.id,
        "assignment submitted"
    );
    Ok(submission)
}

/// Groups active assignments by course, preserving catalog order, and marks
/// each one with the student's submission state.
pub fn group_by_course(
    assignments: Vec<Assignment>,
    submissions: Vec<Submission>,
) -> Vec<CourseAssignments> {
    let by_assignment: HashMap<i64, Submission> = submissions
        .into_iter()
        .map(|submission| (submission.assignment_id, submission))
        .collect();

    let mut courses: Vec<CourseAssignments> = Vec::new();
    for item in assignments {
        let submission = by_assignment.get(&item.id);
        let status = AssignmentStatus {
            assignment_id: item.id,
            title: item.title,
            description: item.description,
            due_date: item.due_date.format("%Y-%m-%d").to_string(),
            max_score: item.max_score,
            status: if submission.is_some() {
                "Submitted"
            } else {
                "Not Submitted"
            },
            score: submission.and_then(|s| s.score),
            feedback: submission.and_then(|s| s.feedback.clone()),
        };

        match courses.last_mut() {
            Some(group) if group.course_id == item.course_id => group.assignments.push(status),
            _ => courses.push(CourseAssignments {
                course_id: item.course_id,
                course_title: item.course_title,
                assignments: vec![status],
            }),
        }
    }
    courses
}

pub async fn list_for_student(
    db: &DatabaseProxy,
    email: &str,
) -> Result<Vec<CourseAssignments>, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    let assignments = assignment::list_active_assignments(db.pool()).await?;
    let submissions = assignment::list_submissions(db.pool(), student.id).await?;
    Ok(group_by_course(assignments, submissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assignment(id: i64, course_id: &str) -> Assignment {
        Assignment {
            id,
            course_id: course_id.to_string(),
            course_title: course_id.to_uppercase(),
            title: format!("Assignment {id}"),
            description: String::new(),
            instructions: String::new(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 0).unwrap(),
            max_score: 100,
            created_date: Utc::now(),
            is_active: true,
        }
    }

    fn graded_submission(assignment_id: i64) -> Submission {
        Submission {
            id: 1,
            assignment_id,
            student_id: 1,
            submission_text: "done".to_string(),
            file_url: None,
            submitted_date: Utc::now(),
            score: Some(88),
            feedback: Some("Nice".to_string()),
            graded_date: Some(Utc::now()),
        }
    }

    #[test]
    fn groups_consecutive_assignments_per_course() {
        let grouped = group_by_course(
            vec![assignment(1, "python"), assignment(2, "python"), assignment(3, "react")],
            vec![graded_submission(2)],
        );

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].course_id, "python");
        assert_eq!(grouped[0].assignments.len(), 2);
        assert_eq!(grouped[0].assignments[0].status, "Not Submitted");
        assert_eq!(grouped[0].assignments[1].status, "Submitted");
        assert_eq!(grouped[0].assignments[1].score, Some(88));
        assert_eq!(grouped[0].assignments[0].due_date, "2025-01-31");
        assert_eq!(grouped[1].course_title, "REACT");
    }
}
