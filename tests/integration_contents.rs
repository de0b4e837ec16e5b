mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{
    create_test_commission, create_test_subject, create_test_user, enroll, get_auth_token, send,
    setup_test_app, wait_for_notifications,
};
use cuaderno::modules::users::model::UserRole;
use serde_json::{Value, json};
use sqlx::SqlitePool;

async fn publish(
    app: &Router,
    token: &str,
    subject_id: i64,
    week_number: i64,
    title: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/contents",
        Some(token),
        Some(json!({
            "subject_id": subject_id,
            "week_number": week_number,
            "title": title,
            "body": "Leer el capítulo y resolver la guía",
            "resource_url": "https://campus.example.com/guia.pdf"
        })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_professor_publishes_content(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, body) = publish(&app, &token, subject_id, 2, "Estequiometría").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Estequiometría");
    assert_eq!(body["week_number"], 2);
    assert_eq!(body["author_id"], professor.id.into_inner());
    assert_eq!(body["subject_name"], "Materia QG");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_content_validation(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, _) = publish(&app, &token, subject_id, 53, "Fuera de rango").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = publish(&app, &token, 4242, 1, "Sin materia").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_publish(pool: SqlitePool) {
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &student).await;

    let (status, _) = publish(&app, &token, subject_id, 1, "Apuntes").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_author_or_admin_modifies(pool: SqlitePool) {
    let author = create_test_user(&pool, UserRole::Professor).await;
    let other = create_test_user(&pool, UserRole::Professor).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let author_token = get_auth_token(&app, &author).await;

    let (_, created) = publish(&app, &author_token, subject_id, 1, "Introducción").await;
    let uri = format!("/api/contents/{}", created["id"]);

    let other_token = get_auth_token(&app, &other).await;
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&other_token),
        Some(json!({ "title": "Cambiado" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only modify content you authored");

    let (status, _) = send(&app, "DELETE", &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&author_token),
        Some(json!({ "week_number": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["week_number"], 3);
    assert_eq!(body["title"], "Introducción");

    let admin_token = get_auth_token(&app, &admin).await;
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_weekly_contents(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let other_subject = create_test_subject(&pool, "FIS", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    publish(&app, &token, subject_id, 3, "Soluciones").await;
    publish(&app, &token, subject_id, 1, "Materia y energía").await;
    publish(&app, &token, subject_id, 3, "Ácidos y bases").await;
    publish(&app, &token, other_subject, 1, "Cinemática").await;

    let student_token = get_auth_token(&app, &student).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/subjects/{subject_id}/contents/weekly"),
        Some(&student_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let weeks = body.as_array().unwrap();
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0]["week_number"], 1);
    assert_eq!(weeks[1]["week_number"], 3);
    assert_eq!(weeks[1]["contents"].as_array().unwrap().len(), 2);
    assert_eq!(weeks[1]["contents"][0]["title"], "Soluciones");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_contents_filters(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    publish(&app, &token, subject_id, 1, "Tabla periódica").await;
    publish(&app, &token, subject_id, 2, "Enlaces químicos").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/contents?subject_id={subject_id}&week_number=2"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Enlaces químicos");

    let (_, body) = send(&app, "GET", "/api/contents?search=tabla", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_content_notifies_enrolled_students(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let commission_id = create_test_commission(&pool, subject_id, "K1011").await;
    enroll(&pool, commission_id, student.id).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, _) = publish(&app, &token, subject_id, 4, "Gases ideales").await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(wait_for_notifications(&pool, student.id, 1).await, 1);

    let (kind, message): (String, String) =
        sqlx::query_as("SELECT kind, message FROM notifications WHERE user_id = ?")
            .bind(student.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(kind, "content");
    assert_eq!(message, "Semana 4: Gases ideales");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_search_treats_wildcards_literally(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    publish(&app, &token, subject_id, 1, "Rendimiento al 100%").await;
    publish(&app, &token, subject_id, 2, "Rendimiento teórico").await;
    publish(&app, &token, subject_id, 3, "Masa_molar").await;
    publish(&app, &token, subject_id, 4, "Masa molar").await;

    let (status, body) = send(&app, "GET", "/api/contents?search=%25", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Rendimiento al 100%");

    let (_, body) = send(&app, "GET", "/api/contents?search=masa_", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Masa_molar");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_content_clears_resource_url(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "QG", 1).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, created) = publish(&app, &token, subject_id, 1, "Introducción").await;
    assert!(created["resource_url"].is_string());
    let uri = format!("/api/contents/{}", created["id"]);

    let (status, body) =
        send(&app, "PUT", &uri, Some(&token), Some(json!({ "resource_url": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["resource_url"].is_null());
    assert_eq!(body["title"], "Introducción");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "resource_url": "no es una url" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
