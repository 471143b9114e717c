use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::json;
use tower::ServiceExt;

use lms_backend::db::operations::quiz::{self, NewQuiz};
use lms_backend::services::email_provider::EmailService;

mod common;

use common::{spawn_app, spawn_app_with, PASSWORD};

const ADA: &str = "ada@example.com";

#[tokio::test]
async fn test_health_reports_connected_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = common::test_config(&dir);
    config.seed_catalog = false;
    let app = lms_backend::create_app_with(config, EmailService::mock())
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = app.get("/api/register").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["err"], "Invalid Method");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = spawn_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_catalog_is_seeded() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/courses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_array().unwrap().len(), 10);

    let (status, body) = app.get("/api/courses/python").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["title"], "Python");

    let (status, body) = app.get("/api/courses/cobol").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["err"], "Course does not exist");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;

    let (status, body) = app
        .post(
            "/api/register",
            json!({"username": "ada2", "email": " ADA@example.com ", "password": "other"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["err"], "Email already exists");
    assert_eq!(app.count("SELECT COUNT(*) FROM students").await, 1);

    let welcome = app.email.sent_messages();
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0].subject, "Welcome to Our Platform!");
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;

    let (status, body) = app
        .post("/api/login", json!({"email": ADA, "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succ"], "Login Successful");
    assert_eq!(body["name"], "ada");
    assert!(body.get("token").is_none());

    let (status, body) = app
        .post("/api/login", json!({"email": ADA, "password": "wrong"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err"], "Invalid Password");

    let (status, _) = app
        .post("/api/login", json!({"email": "ghost@example.com", "password": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_token_round_trip() {
    let app = spawn_app_with(|config| config.jwt_secret = Some("test-secret".to_string())).await;
    app.register("ada", ADA).await;

    let (status, body) = app
        .post("/api/login", json!({"email": ADA, "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/auth/verify")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADA);

    let request = Request::builder()
        .uri("/api/auth/verify")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_through_emailed_link() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;

    let (status, body) = app.post("/api/forgot-password", json!({"email": ADA})).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let messages = app.email.sent_messages();
    let reset = messages
        .iter()
        .find(|m| m.subject == "Password Reset Request")
        .unwrap();
    let token = reset
        .body
        .split("token=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap()
        .to_string();

    let (status, body) = app
        .post("/api/reset-password", json!({"token": "bogus", "new_password": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "Invalid token");

    let (status, _) = app
        .post("/api/reset-password", json!({"token": token, "new_password": "n3w-pass"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/login", json!({"email": ADA, "password": "n3w-pass"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    // tokens are single use
    let (status, _) = app
        .post("/api/reset-password", json!({"token": token, "new_password": "again"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enrollment_and_progress() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;

    let (_, body) = app
        .post("/api/courses/enroll", json!({"email": ADA, "course_id": "python"}))
        .await;
    assert_eq!(body["msg"], "Enrolled successfully");
    let (_, body) = app
        .post("/api/courses/enroll", json!({"email": ADA, "course_id": "python"}))
        .await;
    assert_eq!(body["msg"], "Already enrolled");

    let (status, _) = app
        .post("/api/courses/progress", json!({"email": ADA, "course_id": "python", "progress": 101}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/courses/progress",
            Some(json!({"email": ADA, "course_id": "python", "progress": 100})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["status"], "Completed");
    assert!(body["enrollment"]["completion_date"].is_string());

    let (_, body) = app
        .post("/api/courses/progress", json!({"email": ADA, "course_id": "python", "progress": "40"}))
        .await;
    assert_eq!(body["enrollment"]["status"], "In Progress");
    assert!(body["enrollment"]["completion_date"].is_null());

    let (_, body) = app.get(&format!("/api/user/courses?email={ADA}")).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Python");
    assert_eq!(courses[0]["progress"], 40);
}

#[tokio::test]
async fn test_quiz_failure_keeps_best_progress_then_pass_completes() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "python").await;
    let quiz_id = app.quiz_id("python", "Python Basics").await;

    app.post("/api/courses/progress", json!({"email": ADA, "course_id": "python", "progress": 70}))
        .await;

    let (status, body) = app
        .post(
            "/api/quizzes/submit",
            json!({"email": ADA, "quiz_id": quiz_id, "answers": {"q1": ".py", "q2": "func"}, "time_taken": 4}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["score"], 50);
    assert_eq!(body["passing_score"], 80);
    assert_eq!(body["passed"], false);
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["progress"], 70);

    let (status, body) = app
        .post(
            "/api/submit_quiz",
            json!({"email": ADA, "quiz_id": quiz_id.to_string(), "answers": {"q1": ".py", "q2": "def"}, "time_taken": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["score"], 100);
    assert_eq!(body["passed"], true);
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["progress"], 100);

    let (_, body) = app.get(&format!("/api/user/courses?email={ADA}")).await;
    let history = body["courses"][0]["quiz_scores"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["score"], 50);
    assert_eq!(history[1]["score"], 100);
    assert_eq!(app.count("SELECT COUNT(*) FROM quiz_attempts").await, 2);

    let (_, body) = app.get(&format!("/api/notifications?email={ADA}&unread_only=true")).await;
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["title"], "Quiz Completed");
}

#[tokio::test]
async fn test_quiz_requires_enrollment_and_questions() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    let quiz_id = app.quiz_id("python", "Python Basics").await;

    let (status, body) = app
        .post("/api/quizzes/submit", json!({"email": ADA, "quiz_id": quiz_id, "answers": {"q1": ".py"}, "time_taken": 1}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["err"], "Enrollment does not exist");
    assert_eq!(app.count("SELECT COUNT(*) FROM quiz_attempts").await, 0);

    app.enroll(ADA, "java").await;
    let empty = NewQuiz {
        course_id: "java",
        title: "Empty",
        description: "",
        questions: Vec::new(),
        time_limit: 5,
        max_attempts: 1,
        passing_score: 50,
    };
    let empty_id = quiz::insert_quiz_if_missing(app.db.pool(), &empty, Utc::now())
        .await
        .unwrap()
        .unwrap();

    let (status, body) = app
        .post("/api/quizzes/submit", json!({"email": ADA, "quiz_id": empty_id, "answers": {"1": "a"}, "time_taken": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "Quiz has no questions");
    assert_eq!(app.count("SELECT COUNT(*) FROM quiz_attempts").await, 0);
}

#[tokio::test]
async fn test_quiz_submission_requires_time_taken() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "python").await;
    let quiz_id = app.quiz_id("python", "Python Basics").await;

    let (status, body) = app
        .post(
            "/api/quizzes/submit",
            json!({"email": ADA, "quiz_id": quiz_id, "answers": {"q1": ".py", "q2": "def"}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err"], "Email, quiz_id, answers and time_taken are required");

    let (status, _) = app
        .post(
            "/api/quizzes/submit",
            json!({"email": ADA, "quiz_id": quiz_id, "answers": {"q1": 1}, "time_taken": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM quiz_attempts").await, 0);
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/register/",
            json!({"username": "ada", "email": ADA, "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app.get("/api/courses/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_array().unwrap().len(), 10);

    let (status, body) = app
        .post("/api/login/", json!({"email": ADA, "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succ"], "Login Successful");

    let (status, body) = app.get("/api/login/").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["err"], "Invalid Method");
}

#[tokio::test]
async fn test_sample_quizzes_are_idempotent() {
    let app = spawn_app().await;

    let (status, body) = app.post("/api/quizzes/create-sample", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 0);
    assert_eq!(
        app.count("SELECT COUNT(*) FROM quizzes WHERE title = 'Sample Quiz'").await,
        10
    );
}

#[tokio::test]
async fn test_assignment_resubmission_overwrites() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "webdev").await;
    let assignment_id = app.assignment_id("webdev").await;

    for text in ["first draft", "final version"] {
        let (status, body) = app
            .post(
                "/api/assignments/submit",
                json!({"email": ADA, "assignment_id": assignment_id, "submission_text": text}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["msg"], "Assignment submitted successfully");
    }
    assert_eq!(app.count("SELECT COUNT(*) FROM assignment_submissions").await, 1);

    let (_, body) = app.get(&format!("/api/user/assignments?email={ADA}")).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 3);
    let webdev = courses.iter().find(|c| c["course_id"] == "webdev").unwrap();
    assert_eq!(webdev["assignments"][0]["status"], "Submitted");
    let python = courses.iter().find(|c| c["course_id"] == "python").unwrap();
    assert_eq!(python["assignments"][0]["status"], "Not Submitted");

    let (status, _) = app
        .post("/api/assignments/submit", json!({"email": ADA, "assignment_id": assignment_id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_certificate_issued_once() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "aws").await;

    let (status, body) = app
        .post("/api/certificate/issue", json!({"email": ADA, "course_id": "aws"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["msg"], "Certificate issued successfully");
    let certificate_id = body["certificate"]["certificate_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post("/api/certificate/issue", json!({"email": ADA, "course_id": "aws"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Certificate already issued");
    assert_eq!(app.count("SELECT COUNT(*) FROM certificates").await, 1);

    let (status, body) = app
        .get(&format!("/api/certificate/verify/{certificate_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certificate"]["student_name"], "ada");
    assert_eq!(body["certificate"]["course_title"], "AWS");

    let (status, _) = app.get("/api/certificate/verify/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_certificate_policy_requires_completion_when_enabled() {
    let app = spawn_app_with(|config| config.certificate_requires_completion = true).await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "aws").await;

    let (status, _) = app
        .post("/api/certificate/issue", json!({"email": ADA, "course_id": "aws"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("SELECT COUNT(*) FROM certificates").await, 0);
}

#[tokio::test]
async fn test_study_time_accumulates_per_day() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;

    for minutes in [10, 15] {
        let (status, _) = app
            .post("/api/study-time/update", json!({"email": ADA, "study_time": minutes}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = app
        .post("/api/study-time/update", json!({"email": ADA, "study_time": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/dashboard/analytics?email={ADA}")).await;
    let study_data = body["analytics"]["study_data"].as_array().unwrap();
    assert_eq!(study_data.len(), 1);
    assert_eq!(study_data[0]["study_time"], 25);
}

#[tokio::test]
async fn test_dashboard_recent_activity_is_capped_and_sorted() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    for course in ["webdev", "reactjs", "python"] {
        app.enroll(ADA, course).await;
    }

    let quiz_id = app.quiz_id("webdev", "Sample Quiz").await;
    for _ in 0..3 {
        app.post(
            "/api/quizzes/submit",
            json!({"email": ADA, "quiz_id": quiz_id, "answers": {"1": "3"}, "time_taken": 1}),
        )
        .await;
    }
    for course in ["webdev", "reactjs", "python"] {
        let assignment_id = app.assignment_id(course).await;
        app.post(
            "/api/assignments/submit",
            json!({"email": ADA, "assignment_id": assignment_id, "submission_text": "done"}),
        )
        .await;
    }

    let (status, body) = app.get(&format!("/api/dashboard/analytics?email={ADA}")).await;
    assert_eq!(status, StatusCode::OK);
    let analytics = &body["analytics"];
    assert_eq!(analytics["total_courses"], 3);

    let activity = analytics["recent_activity"].as_array().unwrap();
    assert_eq!(activity.len(), 5);
    let times: Vec<DateTime<Utc>> = activity
        .iter()
        .map(|event| event["time"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] >= pair[1]));

    assert!(analytics["notifications"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
async fn test_user_pages() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "python").await;

    let (status, body) = app.get(&format!("/api/user/profile?email={ADA}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["email"], ADA);
    assert_eq!(body["enrolled_courses"], 1);
    assert_eq!(body["completed_courses"], 0);

    let (status, body) = app.get(&format!("/api/user/settings?email={ADA}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADA);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["notifications"]["email_notifications"], true);
    assert_eq!(body["notifications"]["newsletter"], false);

    let (status, body) = app.get(&format!("/api/user/schedule?email={ADA}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["schedule"].as_array().unwrap().is_empty());

    let (status, _) = app.get("/api/user/schedule").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get(&format!("/api/user/discussions?email={ADA}")).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_mark_notification_read() {
    let app = spawn_app().await;
    app.register("ada", ADA).await;
    app.enroll(ADA, "webdev").await;
    let assignment_id = app.assignment_id("webdev").await;
    app.post(
        "/api/assignments/submit",
        json!({"email": ADA, "assignment_id": assignment_id, "submission_text": "done"}),
    )
    .await;

    let (_, body) = app.get(&format!("/api/notifications?email={ADA}")).await;
    let id = body["notifications"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .post("/api/notifications/read", json!({"notification_id": id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Notification marked as read");

    let (_, body) = app.get(&format!("/api/notifications?email={ADA}&unread_only=1")).await;
    assert!(body["notifications"].as_array().unwrap().is_empty());

    let (status, _) = app.post("/api/notifications/read", json!({"notification_id": 9999})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/api/notifications/read", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
