use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: i64,
    pub student_id: i64,
    pub course_id: String,
    pub certificate_id: String,
    pub issued_date: DateTime<Utc>,
    pub verification_url: Option<String>,
}

/// Certificate joined with the names a verifier needs to see.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CertificateDetails {
    pub certificate_id: String,
    pub student_name: String,
    pub course_id: String,
    pub course_title: String,
    pub issued_date: DateTime<Utc>,
    pub verification_url: Option<String>,
}

/// Returns the stored certificate, or `None` if one already existed for the
/// (student, course) pair.
pub async fn insert_certificate_if_missing<'e, E>(
    executor: E,
    student_id: i64,
    course_id: &str,
    certificate_id: &str,
    verification_url: &str,
    issued_at: DateTime<Utc>,
) -> Result<Option<Certificate>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Certificate>(
        r#"
        INSERT INTO certificates (student_id, course_id, certificate_id, issued_date, verification_url)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (student_id, course_id) DO NOTHING
        RETURNING id, student_id, course_id, certificate_id, issued_date, verification_url
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(certificate_id)
    .bind(issued_at)
    .bind(verification_url)
    .fetch_optional(executor)
    .await
}

pub async fn find_certificate<'e, E>(
    executor: E,
    certificate_id: &str,
) -> Result<Option<CertificateDetails>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, CertificateDetails>(
        r#"
        SELECT ce.certificate_id, s.username AS student_name, ce.course_id,
               c.title AS course_title, ce.issued_date, ce.verification_url
        FROM certificates ce
        JOIN students s ON s.id = ce.student_id
        JOIN courses c ON c.id = ce.course_id
        WHERE ce.certificate_id = ?
        LIMIT 1
        "#,
    )
    .bind(certificate_id)
    .fetch_optional(executor)
    .await
}
