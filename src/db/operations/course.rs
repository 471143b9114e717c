use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub icon: String,
    pub difficulty_level: String,
    pub category: String,
    pub prerequisites: Option<String>,
    pub learning_outcomes: Json<Vec<String>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Static catalog entry used by the seeder.
#[derive(Debug, Clone)]
pub struct NewCourse<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub duration: &'a str,
    pub icon: &'a str,
    pub difficulty_level: &'a str,
    pub category: &'a str,
    pub prerequisites: Option<&'a str>,
    pub learning_outcomes: &'a [&'a str],
}

const COURSE_COLUMNS: &str = r#"
    id, title, description, duration, icon, difficulty_level, category,
    prerequisites, learning_outcomes, created_date, updated_date
"#;

pub async fn list_courses<'e, E>(executor: E) -> Result<Vec<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY title, id");
    sqlx::query_as::<_, Course>(&sql).fetch_all(executor).await
}

pub async fn find_course<'e, E>(executor: E, course_id: &str) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ? LIMIT 1");
    sqlx::query_as::<_, Course>(&sql)
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

/// Returns `true` when the course row was created by this call.
pub async fn insert_course_if_missing<'e, E>(
    executor: E,
    course: &NewCourse<'_>,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let outcomes: Vec<String> = course
        .learning_outcomes
        .iter()
        .map(|outcome| outcome.to_string())
        .collect();

    let result = sqlx::query(
        r#"
        INSERT INTO courses (
            id, title, description, duration, icon, difficulty_level, category,
            prerequisites, learning_outcomes, created_date, updated_date
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(course.id)
    .bind(course.title)
    .bind(course.description)
    .bind(course.duration)
    .bind(course.icon)
    .bind(course.difficulty_level)
    .bind(course.category)
    .bind(course.prerequisites)
    .bind(Json(outcomes))
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_course_ids<'e, E>(executor: E) -> Result<Vec<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT id FROM courses ORDER BY title, id")
        .fetch_all(executor)
        .await
}
