pub mod account;
pub mod analytics;
pub mod assessment;
pub mod assignments;
pub mod certificate;
pub mod email_provider;
pub mod enrollment;
pub mod notification;
pub mod profile;
pub mod scoring;

use sqlx::{Executor, Sqlite};
use thiserror::Error;

use crate::db::operations::student::{self, Student};
use crate::services::email_provider::EmailError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotImplemented(String),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Emails are compared trimmed and lower-cased everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects a missing or blank required field.
pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ServiceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

pub async fn require_student<'e, E>(executor: E, email: &str) -> Result<Student, ServiceError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ServiceError::validation("email is required"));
    }
    student::find_by_email(executor, &email)
        .await?
        .ok_or_else(|| ServiceError::not_found("User does not exist"))
}
