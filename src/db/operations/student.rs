use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub reset_token_hash: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

const STUDENT_COLUMNS: &str = r#"
    id, username, email, password_hash, reset_token_hash, reset_token_expiry,
    profile_picture, bio, date_joined, last_login
"#;

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Student>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = ? LIMIT 1");
    sqlx::query_as::<_, Student>(&sql)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E>(executor: E, student_id: i64) -> Result<Option<Student>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ? LIMIT 1");
    sqlx::query_as::<_, Student>(&sql)
        .bind(student_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_reset_token_hash<'e, E>(
    executor: E,
    token_hash: &str,
) -> Result<Option<Student>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE reset_token_hash = ? LIMIT 1");
    sqlx::query_as::<_, Student>(&sql)
        .bind(token_hash)
        .fetch_optional(executor)
        .await
}

/// Inserts a student and returns the new row id. A duplicate email surfaces
/// as a unique-violation database error.
pub async fn insert_student<'e, E>(
    executor: E,
    username: &str,
    email: &str,
    password_hash: &str,
    joined_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO students (username, email, password_hash, date_joined)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(joined_at)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn record_login<'e, E>(
    executor: E,
    student_id: i64,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE students SET last_login = ? WHERE id = ?")
        .bind(at)
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_reset_token<'e, E>(
    executor: E,
    student_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE students SET reset_token_hash = ?, reset_token_expiry = ? WHERE id = ?")
        .bind(token_hash)
        .bind(expires_at)
        .bind(student_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Replaces the password hash and consumes any outstanding reset token.
pub async fn update_password<'e, E>(
    executor: E,
    student_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE students
        SET password_hash = ?, reset_token_hash = NULL, reset_token_expiry = NULL
        WHERE id = ?
        "#,
    )
    .bind(password_hash)
    .bind(student_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}
