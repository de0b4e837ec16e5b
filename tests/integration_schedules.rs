mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{
    create_test_commission, create_test_subject, create_test_user, enroll, get_auth_token, send,
    setup_test_app, wait_for_notifications,
};
use cuaderno::modules::users::model::{UserId, UserRole};
use serde_json::{Value, json};
use sqlx::SqlitePool;

async fn create_session(
    app: &Router,
    token: &str,
    subject_id: i64,
    commission_id: i64,
    professor_id: UserId,
    day: i64,
    start: &str,
    end: &str,
    classroom: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/schedules",
        Some(token),
        Some(json!({
            "subject_id": subject_id,
            "commission_id": commission_id,
            "professor_id": professor_id.into_inner(),
            "day_of_week": day,
            "start_time": start,
            "end_time": end,
            "classroom": classroom
        })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_schedule(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, body) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 1, "08:00", "10:00", "Aula 101",
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["day_of_week"], 1);
    assert_eq!(body["start_time"], "08:00");
    assert_eq!(body["end_time"], "10:00");
    assert_eq!(body["commission_name"], "K3051");
    assert_eq!(body["professor_name"], "Test professor");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedule_inverted_range(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, _) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 1, "10:00", "08:00", "Aula 101",
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedule_requires_professor(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, _) = create_session(
        &app, &token, subject_id, commission_id, student.id, 1, "08:00", "10:00", "Aula 101",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedule_commission_of_other_subject(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let other_subject = create_test_subject(&pool, "BD", 3).await;
    let commission_id = create_test_commission(&pool, other_subject, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, _) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 1, "08:00", "10:00", "Aula 101",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedule_conflicts(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let other_professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_a = create_test_commission(&pool, subject_id, "K3051").await;
    let commission_b = create_test_commission(&pool, subject_id, "K3052").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, first) = create_session(
        &app, &token, subject_id, commission_a, professor.id, 2, "08:00", "10:00", "Aula 101",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first_id = first["id"].as_i64().unwrap();

    // same professor, overlapping time
    let (status, body) = create_session(
        &app, &token, subject_id, commission_b, professor.id, 2, "09:00", "11:00", "Aula 202",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        format!("Schedule conflicts with existing session {first_id}")
    );

    // same classroom, different case
    let (status, _) = create_session(
        &app, &token, subject_id, commission_b, other_professor.id, 2, "09:30", "10:30", "aula 101",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // same commission
    let (status, _) = create_session(
        &app, &token, subject_id, commission_a, other_professor.id, 2, "07:00", "08:30", "Aula 303",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // back to back is fine
    let (status, _) = create_session(
        &app, &token, subject_id, commission_b, professor.id, 2, "10:00", "12:00", "Aula 101",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // another day is fine
    let (status, _) = create_session(
        &app, &token, subject_id, commission_b, professor.id, 3, "08:00", "10:00", "Aula 101",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_schedule_ignores_itself(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (_, created) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 4, "14:00", "16:00", "Lab 1",
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/schedules/{id}"),
        Some(&token),
        Some(json!({ "end_time": "17:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_time"], "14:00");
    assert_eq!(body["end_time"], "17:00");

    // merged range ends before it starts
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/schedules/{id}"),
        Some(&token),
        Some(json!({ "start_time": "18:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_schedule_clears_classroom(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (_, created) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 2, "08:00", "10:00", "A101",
    )
    .await;
    let uri = format!("/api/schedules/{}", created["id"]);

    // absent keeps the stored value
    let (status, body) =
        send(&app, "PUT", &uri, Some(&token), Some(json!({ "day_of_week": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classroom"], "A101");

    let (status, body) =
        send(&app, "PUT", &uri, Some(&token), Some(json!({ "classroom": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["classroom"].is_null());
    assert_eq!(body["day_of_week"], 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_weekly_schedule_grouped_by_day(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    for (day, start, end) in [(3, "10:00", "12:00"), (1, "18:00", "20:00"), (3, "08:00", "10:00")] {
        let (status, _) = create_session(
            &app, &token, subject_id, commission_id, professor.id, day, start, end, "Aula 1",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/schedules/weekly", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let days = body.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day_of_week"], 1);
    assert_eq!(days[0]["day_name"], "Monday");
    assert_eq!(days[1]["day_of_week"], 3);
    assert_eq!(days[1]["sessions"][0]["start_time"], "08:00");
    assert_eq!(days[1]["sessions"][1]["start_time"], "10:00");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_my_schedule_per_role(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let other_professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_a = create_test_commission(&pool, subject_id, "K3051").await;
    let commission_b = create_test_commission(&pool, subject_id, "K3052").await;
    enroll(&pool, commission_a, student.id).await;
    let app = setup_test_app(pool.clone()).await;
    let admin_token = get_auth_token(&app, &admin).await;

    create_session(
        &app, &admin_token, subject_id, commission_a, professor.id, 1, "08:00", "10:00", "Aula 1",
    )
    .await;
    create_session(
        &app, &admin_token, subject_id, commission_b, other_professor.id, 1, "08:00", "10:00", "Aula 2",
    )
    .await;

    let student_token = get_auth_token(&app, &student).await;
    let (status, body) = send(&app, "GET", "/api/schedules/me", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let days = body.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(days[0]["sessions"][0]["commission_id"], commission_a);

    let professor_token = get_auth_token(&app, &other_professor).await;
    let (_, body) = send(&app, "GET", "/api/schedules/me", Some(&professor_token), None).await;
    assert_eq!(body[0]["sessions"][0]["commission_id"], commission_b);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedule_notifies_enrolled_students(pool: SqlitePool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let outsider = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    enroll(&pool, commission_id, student.id).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &admin).await;

    let (status, _) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 5, "18:00", "22:00", "Aula 5",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(wait_for_notifications(&pool, student.id, 1).await, 1);
    assert_eq!(wait_for_notifications(&pool, professor.id, 1).await, 1);

    let kind: String = sqlx::query_scalar("SELECT kind FROM notifications WHERE user_id = ?")
        .bind(student.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kind, "schedule");

    let outsider_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
            .bind(outsider.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(outsider_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_admin_manages_schedules(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "SO", 3).await;
    let commission_id = create_test_commission(&pool, subject_id, "K3051").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, _) = create_session(
        &app, &token, subject_id, commission_id, professor.id, 1, "08:00", "10:00", "Aula 1",
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
