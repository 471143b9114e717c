use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::db::operations::course;
use crate::db::operations::enrollment::{self, QuizScoreEntry};
use crate::db::operations::notification::{self, NewNotification, NotificationKind};
use crate::db::operations::quiz::{self, NewQuiz, QuizQuestion};
use crate::db::DatabaseProxy;
use crate::services::enrollment::EnrollmentStatus;
use crate::services::scoring::score_answers;
use crate::services::{require_student, ServiceError};

pub const SAMPLE_QUIZ_TITLE: &str = "Sample Quiz";

#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub email: String,
    pub quiz_id: i64,
    pub answers: BTreeMap<String, String>,
    pub time_taken: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub score: i64,
    pub passing_score: i64,
    pub passed: bool,
    pub attempt_id: i64,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub status: EnrollmentStatus,
    pub progress: i64,
}

/// Scores a submission, records the attempt and reconciles the enrollment.
///
/// Nothing is written unless the student, quiz and enrollment all exist and
/// the quiz has at least one question.
pub async fn submit_quiz(
    db: &DatabaseProxy,
    submission: QuizSubmission,
) -> Result<QuizResult, ServiceError> {
    if submission.answers.is_empty() {
        return Err(ServiceError::validation("answers are required"));
    }
    if submission.time_taken < 0 {
        return Err(ServiceError::validation("time_taken must not be negative"));
    }

    let student = require_student(db.pool(), &submission.email).await?;
    let quiz = quiz::find_quiz(db.pool(), submission.quiz_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quiz does not exist"))?;
    let current = enrollment::find_enrollment(db.pool(), student.id, &quiz.course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Enrollment does not exist"))?;

    let score = score_answers(&quiz.questions.0, &submission.answers)?;
    let passed = score.passes(quiz.passing_score);
    let status = EnrollmentStatus::after_quiz(passed);
    let now = Utc::now();

    let mut tx = db.begin().await?;

    let attempt_id = quiz::insert_attempt(
        &mut *tx,
        quiz.id,
        student.id,
        &submission.answers,
        score.percent,
        submission.time_taken,
        now,
    )
    .await?;

    let entry = QuizScoreEntry {
        quiz_id: quiz.id,
        score: score.percent,
        attempt_id,
        date: now,
    };
    let reconciled =
        enrollment::apply_quiz_result(&mut *tx, current.id, &entry, passed, status.as_str(), now)
            .await?
            .ok_or_else(|| ServiceError::not_found("Enrollment does not exist"))?;

    let message = format!("You scored {}% on {}", score.percent, quiz.title);
    notification::insert_notification(
        &mut *tx,
        student.id,
        &NewNotification {
            kind: NotificationKind::Quiz,
            title: "Quiz Completed",
            message: &message,
            related_url: None,
        },
        now,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        student_id = student.id,
        quiz_id = quiz.id,
        attempt_id,
        score = score.percent,
        passed,
        "quiz submitted"
    );

    Ok(QuizResult {
        score: score.percent,
        passing_score: quiz.passing_score,
        passed,
        attempt_id,
        correct_answers: score.correct,
        total_questions: score.total,
        status: EnrollmentStatus::parse(&reconciled.status).unwrap_or(status),
        progress: reconciled.progress,
    })
}

pub fn sample_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            id: "1".to_string(),
            question: "What is 2 + 2?".to_string(),
            options: vec!["3".into(), "4".into(), "5".into()],
            correct_answer: "4".to_string(),
        },
        QuizQuestion {
            id: "2".to_string(),
            question: "Select the primary language of Django.".to_string(),
            options: vec!["Java".into(), "Python".into(), "Ruby".into()],
            correct_answer: "Python".to_string(),
        },
    ]
}

/// Gives every catalog course a "Sample Quiz". Returns how many were created.
pub async fn ensure_sample_quizzes(db: &DatabaseProxy) -> Result<usize, ServiceError> {
    let course_ids = course::list_course_ids(db.pool()).await?;
    let now = Utc::now();
    let mut created = 0;

    for course_id in &course_ids {
        let new_quiz = NewQuiz {
            course_id: course_id.as_str(),
            title: SAMPLE_QUIZ_TITLE,
            description: "Auto-generated sample quiz",
            questions: sample_questions(),
            time_limit: 10,
            max_attempts: 3,
            passing_score: 60,
        };
        if quiz::insert_quiz_if_missing(db.pool(), &new_quiz, now)
            .await?
            .is_some()
        {
            created += 1;
        }
    }

    tracing::info!(created, courses = course_ids.len(), "sample quizzes ensured");
    Ok(created)
}
