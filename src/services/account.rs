use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::{self, AuthError};
use crate::config::Config;
use crate::db::operations::student::{self, Student};
use crate::db::DatabaseProxy;
use crate::services::email_provider::{EmailMessage, EmailService};
use crate::services::{normalize_email, required, require_student, ServiceError};

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginSession {
    pub student: Student,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ServiceError::Unauthorized("Invalid or expired token".to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

pub async fn register(
    db: &DatabaseProxy,
    config: &Config,
    email_service: &EmailService,
    registration: Registration,
) -> Result<Student, ServiceError> {
    let (Some(username), Some(email), Some(password)) = (
        registration.username.as_deref().map(str::trim).filter(|v| !v.is_empty()),
        registration.email.as_deref().map(normalize_email).filter(|v| !v.is_empty()),
        registration.password.as_deref().filter(|v| !v.is_empty()),
    ) else {
        return Err(ServiceError::validation("Username, email and password are required"));
    };

    if !is_valid_email(&email) {
        return Err(ServiceError::validation("Invalid email address"));
    }

    let password_hash = auth::hash_password(password, config.bcrypt_cost)?;

    let student_id =
        match student::insert_student(db.pool(), username, &email, &password_hash, Utc::now()).await {
            Ok(id) => id,
            Err(err) if student::is_unique_violation(&err) => {
                return Err(ServiceError::Conflict("Email already exists".to_string()));
            }
            Err(err) => return Err(err.into()),
        };

    tracing::info!(student_id, "student registered");

    let welcome = EmailMessage {
        to: email.clone(),
        subject: "Welcome to Our Platform!".to_string(),
        body: format!(
            "Hi {username},\n\nThank you for registering with us! Your account has been successfully created.\n\nBest regards,\nThe Team"
        ),
    };
    if let Err(err) = email_service.send(welcome).await {
        tracing::warn!(student_id, error = %err, "welcome email failed");
    }

    student::find_by_id(db.pool(), student_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("registered student vanished".to_string()))
}

pub async fn login(
    db: &DatabaseProxy,
    config: &Config,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<LoginSession, ServiceError> {
    let (Ok(email), Some(password)) = (required(email, "email"), password.filter(|v| !v.is_empty()))
    else {
        return Err(ServiceError::validation("Email and password are required"));
    };

    let student = require_student(db.pool(), email).await?;
    if !auth::verify_password(password, &student.password_hash) {
        tracing::debug!(student_id = student.id, "login rejected");
        return Err(ServiceError::Unauthorized("Invalid Password".to_string()));
    }

    student::record_login(db.pool(), student.id, Utc::now()).await?;

    let (token, expires_at) = match config.jwt_secret.as_deref() {
        Some(secret) => {
            let (token, exp) =
                auth::sign_session_token(secret, student.id, &student.email, &config.jwt_expires_in)?;
            (Some(token), Some(exp))
        }
        None => (None, None),
    };

    tracing::info!(student_id = student.id, "student logged in");
    Ok(LoginSession {
        student,
        token,
        expires_at,
    })
}

/// Resolves the student behind a signed session token.
pub async fn authenticate(db: &DatabaseProxy, secret: &str, token: &str) -> Result<Student, ServiceError> {
    let claims = auth::verify_session_token(token, secret)?;
    let student = student::find_by_id(db.pool(), claims.sub)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

    if student.email != claims.email {
        return Err(ServiceError::Unauthorized("Invalid or expired token".to_string()));
    }
    Ok(student)
}

pub async fn request_password_reset(
    db: &DatabaseProxy,
    config: &Config,
    email_service: &EmailService,
    email: Option<&str>,
) -> Result<(), ServiceError> {
    let email = required(email, "Email")?;
    let student = require_student(db.pool(), email).await?;

    let raw_token = Uuid::new_v4().to_string();
    let ttl = config.reset_token_ttl_minutes.max(1);
    let expires_at = Utc::now() + Duration::minutes(ttl);
    student::set_reset_token(db.pool(), student.id, &auth::hash_token(&raw_token), expires_at).await?;

    let reset_link = config.frontend_link(&format!("reset-password?token={raw_token}"));
    let message = EmailMessage {
        to: student.email.clone(),
        subject: "Password Reset Request".to_string(),
        body: format!(
            "Hi {},\n\nPlease use the following link to reset your password. This link is valid for {ttl} minutes.\n\n{reset_link}\n\nIf you did not request this, please ignore this email.",
            student.username
        ),
    };
    email_service.send(message).await?;

    tracing::info!(student_id = student.id, "password reset requested");
    Ok(())
}

pub async fn reset_password(
    db: &DatabaseProxy,
    config: &Config,
    token: Option<&str>,
    new_password: Option<&str>,
) -> Result<(), ServiceError> {
    let (Ok(token), Some(new_password)) =
        (required(token, "token"), new_password.filter(|v| !v.is_empty()))
    else {
        return Err(ServiceError::validation("Token and new password are required"));
    };

    let student = student::find_by_reset_token_hash(db.pool(), &auth::hash_token(token))
        .await?
        .ok_or_else(|| ServiceError::validation("Invalid token"))?;

    if student
        .reset_token_expiry
        .is_some_and(|expiry| expiry < Utc::now())
    {
        return Err(ServiceError::validation("Token expired"));
    }

    let password_hash = auth::hash_password(new_password, config.bcrypt_cost)?;
    student::update_password(db.pool(), student.id, &password_hash).await?;

    tracing::info!(student_id = student.id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada@.com"));
    }

    #[test]
    fn invalid_tokens_become_unauthorized() {
        let err: ServiceError = AuthError::InvalidToken.into();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err: ServiceError = AuthError::InvalidExpiresIn.into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
