#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use lms_backend::config::Config;
use lms_backend::db::config::DbConfig;
use lms_backend::db::DatabaseProxy;
use lms_backend::routes;
use lms_backend::seed;
use lms_backend::services::email_provider::EmailService;
use lms_backend::state::AppState;

pub const PASSWORD: &str = "Sup3r-secret";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseProxy,
    pub email: EmailService,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_level: "warn".to_string(),
        database_url: format!("sqlite://{}", dir.path().join("lms.db").display()),
        db_max_connections: 4,
        db_busy_timeout: Duration::from_secs(5),
        frontend_url: "http://frontend.test".to_string(),
        reset_token_ttl_minutes: 60,
        bcrypt_cost: 4,
        jwt_secret: None,
        jwt_expires_in: "1h".to_string(),
        certificate_requires_completion: false,
        seed_catalog: true,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    customize(&mut config);

    let db = DatabaseProxy::connect_and_migrate(DbConfig::from_config(&config))
        .await
        .unwrap();
    seed::seed_catalog(&db).await.unwrap();

    let email = EmailService::mock();
    let state = AppState::new(config, db.clone(), email.clone());

    TestApp {
        router: routes::router(state),
        db,
        email,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn register(&self, username: &str, email: &str) {
        let (status, body) = self
            .post(
                "/api/register",
                json!({"username": username, "email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub async fn enroll(&self, email: &str, course_id: &str) {
        let (status, body) = self
            .post("/api/courses/enroll", json!({"email": email, "course_id": course_id}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub async fn quiz_id(&self, course_id: &str, title: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM quizzes WHERE course_id = ? AND title = ?")
            .bind(course_id)
            .bind(title)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn assignment_id(&self, course_id: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM assignments WHERE course_id = ? ORDER BY id LIMIT 1")
            .bind(course_id)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(self.db.pool()).await.unwrap()
    }
}
