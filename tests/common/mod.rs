#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cuaderno::cuaderno_config::{
    BrokerConfig, CorsConfig, EmailConfig, JwtConfig, RateLimitConfig,
};
use cuaderno::cuaderno_core::password::hash_password_with_cost;
use cuaderno::messaging::{NotificationBus, NotificationWorker};
use cuaderno::modules::users::model::{UserId, UserRole};
use cuaderno::router::init_router;
use cuaderno::state::AppState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// App with rate limiting off and an in-memory broker whose worker persists
/// notifications into `pool`.
pub async fn setup_test_app(pool: SqlitePool) -> Router {
    setup_test_app_with_rate_limit(pool, RateLimitConfig::disabled()).await
}

pub async fn setup_test_app_with_rate_limit(
    pool: SqlitePool,
    rate_limit_config: RateLimitConfig,
) -> Router {
    let mut bus = NotificationBus::connect(&BrokerConfig::default())
        .await
        .unwrap();
    bus.spawn_worker(NotificationWorker::new(pool.clone(), EmailConfig::disabled()));

    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::disabled(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config,
        notifier: bus.publisher(),
    };
    init_router(state)
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub async fn create_test_user(pool: &SqlitePool, role: UserRole) -> TestUser {
    let email = generate_unique_email();
    // low cost keeps the suite fast, verification accepts any cost
    let hashed = hash_password_with_cost(TEST_PASSWORD, 4).unwrap();

    let id: UserId = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, email, password, role)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind("Test")
    .bind(format!("{role}"))
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        password: TEST_PASSWORD.to_string(),
        role,
    }
}

/// Logs in through the API and returns the access token.
pub async fn get_auth_token(app: &Router, user: &TestUser) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": user.password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Sends one request and returns the status plus the JSON body (`Null` when
/// the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub async fn create_test_subject(pool: &SqlitePool, code: &str, year: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO subjects (code, name, year) VALUES (?, ?, ?) RETURNING id")
        .bind(code)
        .bind(format!("Materia {code}"))
        .bind(year)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_commission(pool: &SqlitePool, subject_id: i64, name: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO commissions (subject_id, name, year, shift) VALUES (?, ?, 2025, 'morning') RETURNING id",
    )
    .bind(subject_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn enroll(pool: &SqlitePool, commission_id: i64, student_id: UserId) {
    sqlx::query("INSERT INTO commission_students (commission_id, student_id) VALUES (?, ?)")
        .bind(commission_id)
        .bind(student_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Polls until `user_id` has at least `expected` notifications or two
/// seconds pass. Returns the final count.
pub async fn wait_for_notifications(pool: &SqlitePool, user_id: UserId, expected: i64) -> i64 {
    let mut count = 0;
    for _ in 0..40 {
        count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap();
        if count >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    count
}
