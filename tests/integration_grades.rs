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

async fn create_evaluation(
    app: &Router,
    token: &str,
    subject_id: i64,
    commission_id: Option<i64>,
    title: &str,
    max_score: f64,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/evaluations",
        Some(token),
        Some(json!({
            "subject_id": subject_id,
            "commission_id": commission_id,
            "title": title,
            "kind": "exam",
            "scheduled_for": "2025-06-20",
            "max_score": max_score
        })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_evaluation(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, body) = create_evaluation(&app, &token, subject_id, None, "Primer parcial", 10.0).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Primer parcial");
    assert_eq!(body["kind"], "exam");
    assert_eq!(body["scheduled_for"], "2025-06-20");
    assert_eq!(body["max_score"], 10.0);
    assert_eq!(body["created_by"], professor.id.into_inner());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_evaluation_validation(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let other_subject = create_test_subject(&pool, "FIS2", 2).await;
    let foreign_commission = create_test_commission(&pool, other_subject, "K2001").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, _) = create_evaluation(&app, &token, subject_id, None, "Parcial", 0.0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) =
        create_evaluation(&app, &token, subject_id, Some(foreign_commission), "Parcial", 10.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_evaluation(&app, &token, 4242, None, "Parcial", 10.0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_create_evaluation(pool: SqlitePool) {
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &student).await;

    let (status, _) = create_evaluation(&app, &token, subject_id, None, "Parcial", 10.0).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_record_and_update_grades(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let first = create_test_user(&pool, UserRole::Student).await;
    let second = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, evaluation) = create_evaluation(&app, &token, subject_id, None, "Parcial", 10.0).await;
    let uri = format!("/api/evaluations/{}/grades", evaluation["id"]);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({
            "grades": [
                { "student_id": first.id.into_inner(), "score": 7.5, "feedback": "Bien" },
                { "student_id": second.id.into_inner(), "score": 4.0 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded"], 2);
    assert_eq!(body["grades"].as_array().unwrap().len(), 2);

    // recording again replaces the previous score
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "grades": [{ "student_id": second.id.into_inner(), "score": 6.0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, grades) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let grades = grades.as_array().unwrap();
    assert_eq!(grades.len(), 2);
    let second_grade = grades
        .iter()
        .find(|g| g["student_id"] == second.id.into_inner())
        .unwrap();
    assert_eq!(second_grade["score"], 6.0);
    assert_eq!(second_grade["graded_by"], professor.id.into_inner());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_record_grades_rejects_invalid_batch(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, evaluation) = create_evaluation(&app, &token, subject_id, None, "TP", 10.0).await;
    let uri = format!("/api/evaluations/{}/grades", evaluation["id"]);
    let student_id = student.id.into_inner();

    let cases = [
        json!({ "grades": [
            { "student_id": student_id, "score": 5.0 },
            { "student_id": student_id, "score": 6.0 }
        ]}),
        json!({ "grades": [{ "student_id": student_id, "score": 11.0 }] }),
        json!({ "grades": [{ "student_id": professor.id.into_inner(), "score": 8.0 }] }),
    ];
    for payload in cases {
        let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "grades": [{ "student_id": student_id, "score": -1.0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "grades": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_max_score_cannot_drop_below_recorded_grade(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, evaluation) = create_evaluation(&app, &token, subject_id, None, "Final", 100.0).await;
    let id = evaluation["id"].as_i64().unwrap();
    send(
        &app,
        "PUT",
        &format!("/api/evaluations/{id}/grades"),
        Some(&token),
        Some(json!({ "grades": [{ "student_id": student.id.into_inner(), "score": 80.0 }] })),
    )
    .await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/evaluations/{id}"),
        Some(&token),
        Some(json!({ "max_score": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/evaluations/{id}"),
        Some(&token),
        Some(json!({ "max_score": 80.0, "title": "Final integrador" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_score"], 80.0);
    assert_eq!(body["title"], "Final integrador");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_grades_and_summary(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let calculus = create_test_subject(&pool, "AM2", 2).await;
    let physics = create_test_subject(&pool, "FIS2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;
    let student_id = student.id.into_inner();

    for (subject_id, max_score, score) in [(calculus, 10.0, 8.0), (calculus, 100.0, 60.0), (physics, 10.0, 9.0)] {
        let (_, evaluation) =
            create_evaluation(&app, &token, subject_id, None, "Parcial", max_score).await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/evaluations/{}/grades", evaluation["id"]),
            Some(&token),
            Some(json!({ "grades": [{ "student_id": student_id, "score": score }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let student_token = get_auth_token(&app, &student).await;
    let (status, grades) = send(&app, "GET", "/api/grades/me", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grades.as_array().unwrap().len(), 3);

    let (_, grades) = send(
        &app,
        "GET",
        &format!("/api/grades/me?subject_id={physics}"),
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(grades.as_array().unwrap().len(), 1);
    assert_eq!(grades[0]["score"], 9.0);

    let (status, summary) =
        send(&app, "GET", "/api/grades/me/summary", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = summary.as_array().unwrap();
    assert_eq!(summary.len(), 2);
    let calculus_summary = summary
        .iter()
        .find(|s| s["subject_id"] == calculus)
        .unwrap();
    assert_eq!(calculus_summary["evaluations_graded"], 2);
    assert_eq!(calculus_summary["average_score"], 7.0);

    // professors have no grades of their own
    let (status, _) = send(&app, "GET", "/api/grades/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_grade(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, evaluation) = create_evaluation(&app, &token, subject_id, None, "Parcial", 10.0).await;
    let (_, recorded) = send(
        &app,
        "PUT",
        &format!("/api/evaluations/{}/grades", evaluation["id"]),
        Some(&token),
        Some(json!({ "grades": [{ "student_id": student.id.into_inner(), "score": 5.0 }] })),
    )
    .await;
    let uri = format!("/api/grades/{}", recorded["grades"][0]["id"]);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_evaluation_and_grade_notifications(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let other_student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let commission_id = create_test_commission(&pool, subject_id, "K2051").await;
    let other_commission = create_test_commission(&pool, subject_id, "K2052").await;
    enroll(&pool, commission_id, student.id).await;
    enroll(&pool, other_commission, other_student.id).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (status, evaluation) =
        create_evaluation(&app, &token, subject_id, Some(commission_id), "Recuperatorio", 10.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wait_for_notifications(&pool, student.id, 1).await, 1);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/evaluations/{}/grades", evaluation["id"]),
        Some(&token),
        Some(json!({ "grades": [{ "student_id": student.id.into_inner(), "score": 9.5 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wait_for_notifications(&pool, student.id, 2).await, 2);

    let kinds: Vec<String> =
        sqlx::query_scalar("SELECT kind FROM notifications WHERE user_id = ? ORDER BY id")
            .bind(student.id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(kinds, vec!["evaluation", "grade"]);

    // only the evaluation's commission is notified
    let other_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
            .bind(other_student.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(other_count, 0);
}

async fn schedule_evaluation(
    app: &Router,
    token: &str,
    payload: Value,
) -> i64 {
    let (status, body) = send(app, "POST", "/api/evaluations", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_evaluations_filters(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let commission_id = create_test_commission(&pool, subject_id, "K2001").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let first_exam = schedule_evaluation(
        &app,
        &token,
        json!({ "subject_id": subject_id, "commission_id": commission_id, "title": "Primer parcial",
                "kind": "exam", "scheduled_for": "2025-04-10" }),
    )
    .await;
    let quiz = schedule_evaluation(
        &app,
        &token,
        json!({ "subject_id": subject_id, "title": "Cuestionario", "kind": "quiz",
                "scheduled_for": "2025-05-15" }),
    )
    .await;
    let second_exam = schedule_evaluation(
        &app,
        &token,
        json!({ "subject_id": subject_id, "title": "Segundo parcial", "kind": "exam",
                "scheduled_for": "2025-06-20" }),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/evaluations?kind=exam", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["data"][0]["id"], first_exam);
    assert_eq!(body["data"][1]["id"], second_exam);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/evaluations?commission_id={commission_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], first_exam);

    let (_, body) = send(
        &app,
        "GET",
        "/api/evaluations?from=2025-05-01&to=2025-06-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], quiz);

    // bounds are inclusive
    let (_, body) = send(
        &app,
        "GET",
        "/api/evaluations?from=2025-04-10&to=2025-06-20",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["meta"]["total"], 3);

    let (_, body) = send(&app, "GET", "/api/evaluations?limit=2", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["has_more"], true);

    let (_, body) = send(&app, "GET", "/api/evaluations?limit=2&page=2", Some(&token), None).await;
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["page"], 2);
    assert_eq!(body["meta"]["has_more"], false);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], second_exam);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_evaluation(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let other_subject = create_test_subject(&pool, "FIS2", 2).await;
    let commission_id = create_test_commission(&pool, subject_id, "K2001").await;
    let foreign_commission = create_test_commission(&pool, other_subject, "K2002").await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, created) =
        create_evaluation(&app, &token, subject_id, Some(commission_id), "Parcial", 10.0).await;
    let uri = format!("/api/evaluations/{}", created["id"]);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "title": "Recuperatorio", "kind": "project", "description": "Temas 1 a 4" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Recuperatorio");
    assert_eq!(body["kind"], "project");
    assert_eq!(body["description"], "Temas 1 a 4");
    assert_eq!(body["commission_id"], commission_id);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "commission_id": foreign_commission })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, "PUT", &uri, Some(&token), Some(json!({ "commission_id": 4242 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // explicit null opens it to the whole subject
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "commission_id": null, "description": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["commission_id"].is_null());
    assert!(body["description"].is_null());
    assert_eq!(body["title"], "Recuperatorio");

    let student_token = get_auth_token(&app, &student).await;
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&student_token),
        Some(json!({ "title": "Aprobado" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_evaluation_removes_grades(pool: SqlitePool) {
    let professor = create_test_user(&pool, UserRole::Professor).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let subject_id = create_test_subject(&pool, "AM2", 2).await;
    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app, &professor).await;

    let (_, kept) = create_evaluation(&app, &token, subject_id, None, "TP 1", 10.0).await;
    let (_, removed) = create_evaluation(&app, &token, subject_id, None, "TP 2", 10.0).await;
    for evaluation in [&kept, &removed] {
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/evaluations/{}/grades", evaluation["id"]),
            Some(&token),
            Some(json!({ "grades": [{ "student_id": student.id.into_inner(), "score": 8.0 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let uri = format!("/api/evaluations/{}", removed["id"]);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grades WHERE evaluation_id = ?")
        .bind(removed["id"].as_i64().unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphaned, 0);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
