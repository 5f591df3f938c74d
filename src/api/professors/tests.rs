use crate::test_support;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn professor_grades_roster_and_reads_sheet() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, professor) = test_support::professor_token(&ctx, "P001", "Ada Lovelace").await;
    let (_, student) = test_support::seed_student(store, "S001", "Ana Perez").await;
    let subject =
        test_support::seed_subject(store, "MAT101", "Calculus I", Some(&professor), &[]).await;
    crate::services::enrollment::enroll(
        store,
        &student,
        &[subject.id.clone()],
        "2025-1",
        test_support::test_now(),
    )
    .await
    .expect("enroll");

    let roster_uri = format!("/api/v1/professors/me/subjects/{}/students", subject.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &roster_uri, Some(&token), None))
        .await
        .expect("roster");
    assert_eq!(response.status(), StatusCode::OK);
    let roster = test_support::read_json(response).await;
    assert_eq!(
        roster,
        json!([{"student_id": "S001", "name": "Ana Perez", "grade": null, "status": "active"}])
    );

    let grades_uri = format!("/api/v1/professors/me/subjects/{}/grades", subject.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &grades_uri,
            Some(&token),
            Some(json!({"grades": [{"student_id": "S001", "grade": 4.2}]})),
        ))
        .await
        .expect("grade");
    let status = response.status();
    let graded = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {graded}");
    assert_eq!(graded[0]["grade"], 4.2);
    assert_eq!(graded[0]["status"], "completed");
    assert_eq!(graded[0]["is_completed"], true);
    assert!(graded[0]["date_completed"].is_string());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &grades_uri, Some(&token), None))
        .await
        .expect("sheet");
    let sheet = test_support::read_json(response).await;
    assert_eq!(sheet[0]["student_id"], "S001");
    assert_eq!(sheet[0]["grade"], 4.2);
    assert!(sheet[0]["date_completed"].is_string());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &roster_uri, Some(&token), None))
        .await
        .expect("roster");
    let roster = test_support::read_json(response).await;
    assert_eq!(roster, json!([]));
}

#[tokio::test]
async fn grading_errors_are_collected() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, professor) = test_support::professor_token(&ctx, "P001", "Ada Lovelace").await;
    let subject =
        test_support::seed_subject(store, "MAT101", "Calculus I", Some(&professor), &[]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/professors/me/subjects/{}/grades", subject.id),
            Some(&token),
            Some(json!({"grades": [{"student_id": "S999", "grade": 3.0}, {"grade": 2.0}]})),
        ))
        .await
        .expect("grade");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(
        body["errors"],
        json!(["Student S999 not found in this subject", "Invalid grade data format"])
    );

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/professors/me/subjects/{}/grades", subject.id),
            Some(&token),
            Some(json!({"grades": []})),
        ))
        .await
        .expect("empty grade submission");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test_support::read_json(response).await, json!([]));
}

#[tokio::test]
async fn foreign_subject_is_forbidden_and_unknown_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let store = ctx.state.store();
    let (token, _) = test_support::professor_token(&ctx, "P001", "Ada Lovelace").await;
    let (_, owner) = test_support::seed_professor(store, "P002", "Alan Turing").await;
    let subject =
        test_support::seed_subject(store, "CS101", "Computability", Some(&owner), &[]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/professors/me/subjects/{}/grades", subject.id),
            Some(&token),
            Some(json!({"grades": [{"student_id": "S001", "grade": 5.0}]})),
        ))
        .await
        .expect("grade");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = test_support::read_json(response).await;
    assert_eq!(body["detail"], "You are not authorized to grade this subject");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/professors/me/subjects/missing/students",
            Some(&token),
            None,
        ))
        .await
        .expect("roster");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/professors/me/subjects",
            Some(&token),
            None,
        ))
        .await
        .expect("subjects");
    let subjects = test_support::read_json(response).await;
    assert_eq!(subjects, json!([]));
}
