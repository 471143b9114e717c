use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(deserialize_with = "deserialize_question_id")]
    pub id: String,
    #[serde(alias = "prompt")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

fn deserialize_question_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(value) => value.to_string(),
        RawId::Float(value) => value.to_string(),
        RawId::Text(value) => value,
    })
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Quiz {
    pub id: i64,
    pub course_id: String,
    pub course_title: String,
    pub title: String,
    pub description: String,
    pub questions: Json<Vec<QuizQuestion>>,
    pub time_limit: i64,
    pub max_attempts: i64,
    pub passing_score: i64,
    pub created_date: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewQuiz<'a> {
    pub course_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub questions: Vec<QuizQuestion>,
    pub time_limit: i64,
    pub max_attempts: i64,
    pub passing_score: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptEvent {
    pub course_title: String,
    pub quiz_title: String,
    pub score: i64,
    pub completed_date: DateTime<Utc>,
}

const QUIZ_SELECT: &str = r#"
    SELECT q.id, q.course_id, c.title AS course_title, q.title, q.description,
           q.questions, q.time_limit, q.max_attempts, q.passing_score,
           q.created_date, q.is_active
    FROM quizzes q
    JOIN courses c ON c.id = q.course_id
"#;

pub async fn find_quiz<'e, E>(executor: E, quiz_id: i64) -> Result<Option<Quiz>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{QUIZ_SELECT} WHERE q.id = ? LIMIT 1");
    sqlx::query_as::<_, Quiz>(&sql)
        .bind(quiz_id)
        .fetch_optional(executor)
        .await
}

/// Active quizzes of the student's enrolled courses, newest first.
pub async fn active_for_student<'e, E>(
    executor: E,
    student_id: i64,
    limit: i64,
) -> Result<Vec<Quiz>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"{QUIZ_SELECT}
        JOIN enrollments e ON e.course_id = q.course_id AND e.student_id = ?
        WHERE q.is_active = 1
        ORDER BY q.created_date DESC, q.id DESC
        LIMIT ?"#
    );
    sqlx::query_as::<_, Quiz>(&sql)
        .bind(student_id)
        .bind(limit)
        .fetch_all(executor)
        .await
}

/// Returns the new quiz id, or `None` when the course already has a quiz
/// with that title.
pub async fn insert_quiz_if_missing<'e, E>(
    executor: E,
    quiz: &NewQuiz<'_>,
    now: DateTime<Utc>,
) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (course_id, title, description, questions, time_limit, max_attempts, passing_score, created_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (course_id, title) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(quiz.course_id)
    .bind(quiz.title)
    .bind(quiz.description)
    .bind(Json(&quiz.questions))
    .bind(quiz.time_limit)
    .bind(quiz.max_attempts)
    .bind(quiz.passing_score)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub async fn insert_attempt<'e, E>(
    executor: E,
    quiz_id: i64,
    student_id: i64,
    answers: &BTreeMap<String, String>,
    score: i64,
    time_taken: i64,
    completed_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO quiz_attempts (quiz_id, student_id, answers, score, completed_date, time_taken)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(quiz_id)
    .bind(student_id)
    .bind(Json(answers))
    .bind(score)
    .bind(completed_at)
    .bind(time_taken)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn recent_attempts<'e, E>(
    executor: E,
    student_id: i64,
    limit: i64,
) -> Result<Vec<AttemptEvent>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AttemptEvent>(
        r#"
        SELECT c.title AS course_title, q.title AS quiz_title, a.score, a.completed_date
        FROM quiz_attempts a
        JOIN quizzes q ON q.id = a.quiz_id
        JOIN courses c ON c.id = q.course_id
        WHERE a.student_id = ?
        ORDER BY a.completed_date DESC, a.id DESC
        LIMIT ?
        "#,
    )
    .bind(student_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}
