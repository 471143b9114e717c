use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{Executor, Sqlite};

/// One entry of an enrollment's quiz-score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScoreEntry {
    pub quiz_id: i64,
    pub score: i64,
    pub attempt_id: i64,
    pub date: DateTime<Utc>,
}

/// Enrollment row joined with the course title.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: String,
    pub course_title: String,
    pub status: String,
    pub progress: i64,
    pub enrolled_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub quiz_scores: Json<Vec<QuizScoreEntry>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub certificate_issued: bool,
}

/// Result of applying a quiz verdict in place.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReconciledEnrollment {
    pub status: String,
    pub progress: i64,
    pub completion_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompletionEvent {
    pub course_title: String,
    pub completion_date: DateTime<Utc>,
}

const ENROLLMENT_SELECT: &str = r#"
    SELECT e.id, e.student_id, e.course_id, c.title AS course_title, e.status,
           e.progress, e.enrolled_date, e.last_updated, e.quiz_scores,
           e.completion_date, e.certificate_issued
    FROM enrollments e
    JOIN courses c ON c.id = e.course_id
"#;

/// Returns `true` when a new enrollment was created.
pub async fn enroll_if_missing<'e, E>(
    executor: E,
    student_id: i64,
    course_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (student_id, course_id, status, progress, enrolled_date, last_updated)
        VALUES (?, ?, 'Enrolled', 0, ?, ?)
        ON CONFLICT (student_id, course_id) DO NOTHING
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_enrollment<'e, E>(
    executor: E,
    student_id: i64,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ENROLLMENT_SELECT} WHERE e.student_id = ? AND e.course_id = ? LIMIT 1");
    sqlx::query_as::<_, Enrollment>(&sql)
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

pub async fn list_enrollments<'e, E>(
    executor: E,
    student_id: i64,
) -> Result<Vec<Enrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ENROLLMENT_SELECT} WHERE e.student_id = ? ORDER BY e.enrolled_date, e.id");
    sqlx::query_as::<_, Enrollment>(&sql)
        .bind(student_id)
        .fetch_all(executor)
        .await
}

/// Overwrites progress and status. `completion_date` is `None` unless the
/// course is complete.
pub async fn set_progress<'e, E>(
    executor: E,
    enrollment_id: i64,
    progress: i64,
    status: &str,
    completion_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET progress = ?, status = ?, completion_date = ?, last_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(progress)
    .bind(status)
    .bind(completion_date)
    .bind(now)
    .bind(enrollment_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Appends a score to the history and reconciles status/progress in one
/// statement. A pass forces progress to 100; a fail keeps the best of the
/// current progress and the new score.
pub async fn apply_quiz_result<'e, E>(
    executor: E,
    enrollment_id: i64,
    entry: &QuizScoreEntry,
    passed: bool,
    status: &str,
    now: DateTime<Utc>,
) -> Result<Option<ReconciledEnrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ReconciledEnrollment>(
        r#"
        UPDATE enrollments
        SET quiz_scores = json_insert(quiz_scores, '$[#]', json(?)),
            status = ?,
            progress = CASE WHEN ? THEN 100 ELSE MAX(progress, ?) END,
            completion_date = CASE WHEN ? THEN ? ELSE NULL END,
            last_updated = ?
        WHERE id = ?
        RETURNING status, progress, completion_date
        "#,
    )
    .bind(Json(entry))
    .bind(status)
    .bind(passed)
    .bind(entry.score.clamp(0, 100))
    .bind(passed)
    .bind(now)
    .bind(now)
    .bind(enrollment_id)
    .fetch_optional(executor)
    .await
}

/// Flags the certificate as issued. Returns `false` if it already was.
pub async fn mark_certificate_issued<'e, E>(
    executor: E,
    enrollment_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET certificate_issued = 1, completion_date = ?, last_updated = ?
        WHERE id = ? AND certificate_issued = 0
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(enrollment_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn recent_completions<'e, E>(
    executor: E,
    student_id: i64,
    limit: i64,
) -> Result<Vec<CompletionEvent>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, CompletionEvent>(
        r#"
        SELECT c.title AS course_title, e.completion_date
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE e.student_id = ? AND e.status = 'Completed' AND e.completion_date IS NOT NULL
        ORDER BY e.completion_date DESC, e.id DESC
        LIMIT ?
        "#,
    )
    .bind(student_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}
