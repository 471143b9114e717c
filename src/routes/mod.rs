mod assignments;
mod auth;
mod certificates;
mod courses;
mod dashboard;
mod health;
mod notifications;
mod quizzes;
mod users;

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use bytes::Bytes;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .api_route("/register", post(auth::register).fallback(method_not_allowed))
        .api_route("/login", post(auth::login).fallback(method_not_allowed))
        .api_route("/auth/verify", get(auth::verify).fallback(method_not_allowed))
        .api_route(
            "/forgot-password",
            post(auth::forgot_password).fallback(method_not_allowed),
        )
        .api_route(
            "/reset-password",
            post(auth::reset_password).fallback(method_not_allowed),
        )
        .api_route("/courses", get(courses::list).fallback(method_not_allowed))
        .api_route(
            "/courses/enroll",
            post(courses::enroll).fallback(method_not_allowed),
        )
        .api_route(
            "/courses/progress",
            post(courses::update_progress)
                .put(courses::update_progress)
                .fallback(method_not_allowed),
        )
        .api_route(
            "/courses/:course_id",
            get(courses::detail).fallback(method_not_allowed),
        )
        .api_route(
            "/user/courses",
            get(courses::user_courses).fallback(method_not_allowed),
        )
        .api_route(
            "/dashboard/analytics",
            get(dashboard::analytics).fallback(method_not_allowed),
        )
        .api_route(
            "/study-time/update",
            post(dashboard::update_study_time).fallback(method_not_allowed),
        )
        .api_route(
            "/assignments/submit",
            post(assignments::submit).fallback(method_not_allowed),
        )
        .api_route(
            "/user/assignments",
            get(assignments::user_assignments).fallback(method_not_allowed),
        )
        .api_route(
            "/quizzes/submit",
            post(quizzes::submit).fallback(method_not_allowed),
        )
        .api_route("/submit_quiz", post(quizzes::submit).fallback(method_not_allowed))
        .api_route(
            "/quizzes/create-sample",
            post(quizzes::create_samples)
                .get(quizzes::create_samples)
                .fallback(method_not_allowed),
        )
        .api_route(
            "/notifications",
            get(notifications::list).fallback(method_not_allowed),
        )
        .api_route(
            "/notifications/read",
            post(notifications::mark_read).fallback(method_not_allowed),
        )
        .api_route(
            "/certificate/issue",
            post(certificates::issue).fallback(method_not_allowed),
        )
        .api_route(
            "/certificate/verify/:certificate_id",
            get(certificates::verify).fallback(method_not_allowed),
        )
        .api_route("/user/settings", get(users::settings).fallback(method_not_allowed))
        .api_route("/user/profile", get(users::profile).fallback(method_not_allowed))
        .api_route("/user/schedule", get(users::schedule).fallback(method_not_allowed))
        .api_route(
            "/user/discussions",
            get(users::discussions).fallback(method_not_allowed),
        );

    Router::new()
        .nest("/api", api)
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

trait ApiRoutes {
    fn api_route(self, path: &str, method_router: MethodRouter<AppState>) -> Self;
}

impl ApiRoutes for Router<AppState> {
    /// Registers `path` both with and without a trailing slash.
    fn api_route(self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.route(path, method_router.clone())
            .route(&format!("{path}/"), method_router)
    }
}

/// JSON body extractor whose rejections use the API error shape.
pub struct JsonPayload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::validation(err.body_text()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::validation("Request body is required"));
        }

        serde_json::from_slice(&body)
            .map(JsonPayload)
            .map_err(|err| AppError::validation(format!("Invalid JSON payload: {err}")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    pub fn require(&self) -> Result<&str, AppError> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::validation("Email is required"))
    }
}

/// Accepts integers given as JSON numbers or numeric strings.
pub fn optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(value)) => Ok(Some(value)),
        Some(Raw::Float(value)) if value.fract() == 0.0 => Ok(Some(value as i64)),
        Some(Raw::Float(value)) => Err(D::Error::custom(format!(
            "expected an integer, got {value}"
        ))),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got {text:?}"))),
    }
}

async fn method_not_allowed() -> Response {
    AppError::method_not_allowed().into_response()
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found").into_response()
}
