use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

use crate::response::AppError;
use crate::routes::{optional_i64, EmailQuery, JsonPayload};
use crate::services::assessment::{self, QuizResult, QuizSubmission};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    email: Option<String>,
    #[serde(default, deserialize_with = "optional_i64")]
    quiz_id: Option<i64>,
    #[serde(default, deserialize_with = "answer_map")]
    answers: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "optional_i64")]
    time_taken: Option<i64>,
}

#[derive(Serialize)]
pub struct SubmitQuizResponse {
    msg: &'static str,
    #[serde(flatten)]
    result: QuizResult,
}

#[derive(Serialize)]
pub struct SampleQuizzesResponse {
    msg: &'static str,
    created: usize,
}

/// Answers keyed by question id. Answers must be JSON strings; a null answer
/// counts as unanswered.
fn answer_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|text| (key, text)))
        .collect())
}

pub async fn submit(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<SubmitQuizRequest>,
) -> Result<Json<SubmitQuizResponse>, AppError> {
    let email = EmailQuery {
        email: payload.email,
    };
    let (Ok(email), Some(quiz_id), Some(time_taken)) =
        (email.require(), payload.quiz_id, payload.time_taken)
    else {
        return Err(AppError::validation(
            "Email, quiz_id, answers and time_taken are required",
        ));
    };

    let submission = QuizSubmission {
        email: email.to_string(),
        quiz_id,
        answers: payload.answers,
        time_taken,
    };
    let result = assessment::submit_quiz(state.db(), submission).await?;

    Ok(Json(SubmitQuizResponse {
        msg: "Quiz submitted successfully",
        result,
    }))
}

pub async fn create_samples(
    State(state): State<AppState>,
) -> Result<Json<SampleQuizzesResponse>, AppError> {
    let created = assessment::ensure_sample_quizzes(state.db()).await?;
    Ok(Json(SampleQuizzesResponse {
        msg: "Sample quizzes ensured",
        created,
    }))
}
