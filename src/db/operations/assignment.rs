use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: i64,
    pub course_id: String,
    pub course_title: String,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub due_date: DateTime<Utc>,
    pub max_score: i64,
    pub created_date: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewAssignment<'a> {
    pub course_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub instructions: &'a str,
    pub due_date: DateTime<Utc>,
    pub max_score: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub submission_text: String,
    pub file_url: Option<String>,
    pub submitted_date: DateTime<Utc>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub graded_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionEvent {
    pub course_title: String,
    pub assignment_title: String,
    pub submitted_date: DateTime<Utc>,
    pub score: Option<i64>,
}

const ASSIGNMENT_SELECT: &str = r#"
    SELECT a.id, a.course_id, c.title AS course_title, a.title, a.description,
           a.instructions, a.due_date, a.max_score, a.created_date, a.is_active
    FROM assignments a
    JOIN courses c ON c.id = a.course_id
"#;

pub async fn find_assignment<'e, E>(
    executor: E,
    assignment_id: i64,
) -> Result<Option<Assignment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ASSIGNMENT_SELECT} WHERE a.id = ? LIMIT 1");
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(assignment_id)
        .fetch_optional(executor)
        .await
}

/// Active assignments in catalog order, then by due date.
pub async fn list_active_assignments<'e, E>(executor: E) -> Result<Vec<Assignment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ASSIGNMENT_SELECT} WHERE a.is_active = 1 ORDER BY c.title, c.id, a.due_date, a.id");
    sqlx::query_as::<_, Assignment>(&sql).fetch_all(executor).await
}

/// Active assignments of the student's enrolled courses that are still due.
pub async fn upcoming_for_student<'e, E>(
    executor: E,
    student_id: i64,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Assignment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"{ASSIGNMENT_SELECT}
        JOIN enrollments e ON e.course_id = a.course_id AND e.student_id = ?
        WHERE a.is_active = 1 AND a.due_date >= ?
        ORDER BY a.due_date, a.id
        LIMIT ?"#
    );
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(student_id)
        .bind(now)
        .bind(limit)
        .fetch_all(executor)
        .await
}

pub async fn insert_assignment_if_missing<'e, E>(
    executor: E,
    assignment: &NewAssignment<'_>,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO assignments (course_id, title, description, instructions, due_date, max_score, created_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (course_id, title) DO NOTHING
        "#,
    )
    .bind(assignment.course_id)
    .bind(assignment.title)
    .bind(assignment.description)
    .bind(assignment.instructions)
    .bind(assignment.due_date)
    .bind(assignment.max_score)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Resubmission replaces text, file url and timestamp but keeps grading.
pub async fn upsert_submission<'e, E>(
    executor: E,
    assignment_id: i64,
    student_id: i64,
    submission_text: &str,
    file_url: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Submission, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO assignment_submissions (assignment_id, student_id, submission_text, file_url, submitted_date)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (assignment_id, student_id) DO UPDATE SET
            submission_text = EXCLUDED.submission_text,
            file_url = EXCLUDED.file_url,
            submitted_date = EXCLUDED.submitted_date
        RETURNING id, assignment_id, student_id, submission_text, file_url,
                  submitted_date, score, feedback, graded_date
        "#,
    )
    .bind(assignment_id)
    .bind(student_id)
    .bind(submission_text)
    .bind(file_url)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn list_submissions<'e, E>(
    executor: E,
    student_id: i64,
) -> Result<Vec<Submission>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, assignment_id, student_id, submission_text, file_url,
               submitted_date, score, feedback, graded_date
        FROM assignment_submissions
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .fetch_all(executor)
    .await
}

pub async fn recent_submissions<'e, E>(
    executor: E,
    student_id: i64,
    limit: i64,
) -> Result<Vec<SubmissionEvent>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, SubmissionEvent>(
        r#"
        SELECT c.title AS course_title, a.title AS assignment_title, s.submitted_date, s.score
        FROM assignment_submissions s
        JOIN assignments a ON a.id = s.assignment_id
        JOIN courses c ON c.id = a.course_id
        WHERE s.student_id = ?
        ORDER BY s.submitted_date DESC, s.id DESC
        LIMIT ?
        "#,
    )
    .bind(student_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}
