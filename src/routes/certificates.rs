use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::certificate::{Certificate, CertificateDetails};
use crate::response::AppError;
use crate::routes::{EmailQuery, JsonPayload};
use crate::services::certificate::{self, IssueOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    email: Option<String>,
    course_id: Option<String>,
}

#[derive(Serialize)]
pub struct IssueResponse {
    msg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<Certificate>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    valid: bool,
    certificate: CertificateDetails,
}

pub async fn issue(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<IssueRequest>,
) -> Result<Json<IssueResponse>, AppError> {
    let email = EmailQuery {
        email: payload.email,
    };
    let course_id = payload
        .course_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let (Ok(email), Some(course_id)) = (email.require(), course_id) else {
        return Err(AppError::validation("Email and course_id are required"));
    };

    let response = match certificate::issue(state.db(), state.config(), email, course_id).await? {
        IssueOutcome::Issued(certificate) => IssueResponse {
            msg: "Certificate issued successfully",
            certificate: Some(certificate),
        },
        IssueOutcome::AlreadyIssued => IssueResponse {
            msg: "Certificate already issued",
            certificate: None,
        },
    };
    Ok(Json(response))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> Result<Json<VerifyResponse>, AppError> {
    let certificate = certificate::verify(state.db(), &certificate_id).await?;
    Ok(Json(VerifyResponse {
        valid: true,
        certificate,
    }))
}
