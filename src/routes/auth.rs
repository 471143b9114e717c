use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::routes::JsonPayload;
use crate::services::account::{self, Registration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    token: Option<String>,
    new_password: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    msg: &'static str,
}

#[derive(Serialize)]
pub struct LoginResponse {
    succ: &'static str,
    name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    id: i64,
    name: String,
    email: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let registration = Registration {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };
    account::register(state.db(), state.config(), &state.email_service(), registration).await?;

    Ok(Json(MessageResponse {
        msg: "Registration Successful",
    }))
}

pub async fn login(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = account::login(
        state.db(),
        state.config(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    )
    .await?;

    Ok(Json(LoginResponse {
        succ: "Login Successful",
        name: session.student.username,
        email: session.student.email,
        token: session.token,
        expires_at: session.expires_at.map(|at| at.to_rfc3339()),
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AppError> {
    let Some(secret) = state.config().jwt_secret.as_deref() else {
        return Err(AppError::service_unavailable("Session tokens are not enabled"));
    };
    let token = crate::auth::extract_token(&headers)
        .ok_or_else(|| AppError::unauthorized("Missing token"))?;

    let student = account::authenticate(state.db(), secret, &token).await?;

    Ok(Json(VerifyResponse {
        id: student.id,
        name: student.username,
        email: student.email,
    }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    account::request_password_reset(
        state.db(),
        state.config(),
        &state.email_service(),
        payload.email.as_deref(),
    )
    .await?;

    Ok(Json(MessageResponse {
        msg: "Password reset email sent",
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    account::reset_password(
        state.db(),
        state.config(),
        payload.token.as_deref(),
        payload.new_password.as_deref(),
    )
    .await?;

    Ok(Json(MessageResponse {
        msg: "Password reset successful",
    }))
}
