mod common;

use axum::http::StatusCode;
use common::{create_test_user, generate_unique_email, get_auth_token, send, setup_test_app};
use cuaderno::modules::users::model::UserRole;
use serde_json::json;
use sqlx::SqlitePool;

#[sqlx::test(migrations = "./migrations")]
async fn test_get_profile(pool: SqlitePool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &user).await;

    let (status, body) = send(&app, "GET", "/api/users/profile", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.into_inner());
    assert_eq!(body["email"], user.email);
    assert_eq!(body["email_notifications"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_profile(pool: SqlitePool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &user).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/users/profile",
        Some(&token),
        Some(json!({ "first_name": "Camila", "email_notifications": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Camila");
    assert_eq!(body["last_name"], "student");
    assert_eq!(body["email_notifications"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password(pool: SqlitePool) {
    let mut user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &user).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "current_password": user.password, "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    user.password = "brandnew123".to_string();
    get_auth_token(&app, &user).await;
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_wrong_current(pool: SqlitePool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &user).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/profile/change-password",
        Some(&token),
        Some(json!({ "current_password": "wrong-password", "new_password": "brandnew123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_lists_users_by_role(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    create_test_user(&pool, UserRole::Professor).await;
    create_test_user(&pool, UserRole::Professor).await;
    create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, body) = send(&app, "GET", "/api/users?role=professor", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    let users = body["data"].as_array().unwrap();
    assert!(users.iter().all(|u| u["role"] == "professor"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_admin_cannot_manage_users(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, _) = send(&app, "GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({
            "first_name": "Nuevo",
            "last_name": "Admin",
            "email": generate_unique_email(),
            "password": "password123",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_creates_and_updates_user(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/users",
        Some(&token),
        Some(json!({
            "first_name": "Mariano",
            "last_name": "Gómez",
            "email": generate_unique_email(),
            "password": "password123",
            "role": "professor"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "professor");

    let id = created["id"].as_i64().unwrap();
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(&token),
        Some(json!({ "role": "admin", "last_name": "Gómez Paz" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");
    assert_eq!(updated["last_name"], "Gómez Paz");
    assert_eq!(updated["first_name"], "Mariano");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_missing_user(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, body) = send(&app, "GET", "/api/users/99999", Some(&token), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_cannot_delete_self(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", admin.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", student.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/users/{}", student.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
