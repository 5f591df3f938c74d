use crate::repositories::enrollments::EnrollmentFilter;
use crate::test_support;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn enrollment_respects_prerequisites() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, student) = test_support::student_token(&ctx, "S001", "Ana Perez").await;
    let (_, professor) = test_support::seed_professor(store, "P001", "Ada Lovelace").await;
    let calc1 =
        test_support::seed_subject(store, "MAT101", "Calculus I", Some(&professor), &[]).await;
    let calc2 =
        test_support::seed_subject(store, "MAT102", "Calculus II", Some(&professor), &[&calc1])
            .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/me/enrollments",
            Some(&token),
            Some(json!({"subject_ids": [calc2.id], "period": "2025-1"})),
        ))
        .await
        .expect("enroll");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["errors"], json!(["Prerequisite Calculus I not met for Calculus II"]));

    test_support::seed_grade(store, &student, &calc1, "2024-2", 3.8).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/me/enrollments",
            Some(&token),
            Some(json!({"subject_ids": [calc2.id], "period": "2025-1"})),
        ))
        .await
        .expect("enroll");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created[0]["subject_id"], calc2.id.as_str());
    assert_eq!(created[0]["status"], "active");
    assert_eq!(created[0]["professor_id"], professor.id.as_str());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students/me/enrollments",
            Some(&token),
            None,
        ))
        .await
        .expect("list");
    let all = test_support::read_json(response).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn enrollment_request_edge_cases() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, _) = test_support::student_token(&ctx, "S001", "Ana Perez").await;
    let (_, professor) = test_support::seed_professor(store, "P001", "Ada Lovelace").await;
    let calc1 =
        test_support::seed_subject(store, "MAT101", "Calculus I", Some(&professor), &[]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/me/enrollments",
            Some(&token),
            Some(json!({"subject_ids": [], "period": "2025-1"})),
        ))
        .await
        .expect("enroll");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["detail"], "No subject IDs provided");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/me/enrollments",
            Some(&token),
            Some(json!({"subject_ids": [calc1.id, "ghost"], "period": "2025-1"})),
        ))
        .await
        .expect("enroll");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["errors"], json!(["Subject with ID ghost does not exist"]));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students/me/subjects",
            Some(&token),
            None,
        ))
        .await
        .expect("subjects");
    let active = test_support::read_json(response).await;
    assert_eq!(active, json!([]));
}

#[tokio::test]
async fn enrollment_without_period_is_a_bad_request() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, student) = test_support::student_token(&ctx, "S001", "Ana Perez").await;
    let (_, professor) = test_support::seed_professor(store, "P001", "Ada Lovelace").await;
    let calc1 =
        test_support::seed_subject(store, "MAT101", "Calculus I", Some(&professor), &[]).await;

    let payloads = [
        json!({"subject_ids": [calc1.id]}),
        json!({"subject_ids": [calc1.id], "period": "   "}),
    ];
    for payload in payloads {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/students/me/enrollments",
                Some(&token),
                Some(payload.clone()),
            ))
            .await
            .expect("enroll");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {payload}");
        let body = test_support::read_json(response).await;
        assert_eq!(body["status"], 400);
        assert!(body["detail"].as_str().expect("detail").contains("period"), "body: {body}");
    }

    let enrollments =
        store.list_student_enrollments(&student.id, EnrollmentFilter::All).await.unwrap();
    assert!(enrollments.is_empty());
}

#[tokio::test]
async fn approved_and_failed_views() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, student) = test_support::student_token(&ctx, "S001", "Ana Perez").await;
    let (_, professor) = test_support::seed_professor(store, "P001", "Ada Lovelace").await;
    let algebra =
        test_support::seed_subject(store, "A100", "Algebra", Some(&professor), &[]).await;
    let biology =
        test_support::seed_subject(store, "B100", "Biology", Some(&professor), &[]).await;
    test_support::seed_grade(store, &student, &algebra, "2024-2", 4.25).await;
    test_support::seed_grade(store, &student, &biology, "2024-2", 2.0).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students/me/approved",
            Some(&token),
            None,
        ))
        .await
        .expect("approved");
    assert_eq!(response.status(), StatusCode::OK);
    let approved = test_support::read_json(response).await;
    assert_eq!(approved["subjects"].as_array().map(Vec::len), Some(1));
    assert_eq!(approved["subjects"][0]["subject_id"], algebra.id.as_str());
    assert_eq!(approved["average"], 3.13);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students/me/failed",
            Some(&token),
            None,
        ))
        .await
        .expect("failed");
    let failed = test_support::read_json(response).await;
    assert_eq!(failed.as_array().map(Vec::len), Some(1));
    assert_eq!(failed[0]["subject_id"], biology.id.as_str());
    assert_eq!(failed[0]["is_approved"], false);
}

#[tokio::test]
async fn professor_has_no_student_views() {
    let ctx = test_support::setup_test_context().await;
    let (token, _) = test_support::professor_token(&ctx, "P001", "Ada Lovelace").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students/me/approved",
            Some(&token),
            None,
        ))
        .await
        .expect("approved");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["detail"], "Student profile not found");
}
