use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use time::{Date, Month, PrimitiveDateTime, Time};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState};
use crate::db::models::{Account, AccountProfile, Enrollment, Professor, Student, Subject};
use crate::repositories::accounts::{NewAccount, NewProfile};
use crate::repositories::enrollments::{EnrollmentCompletion, NewEnrollment};
use crate::repositories::professors::NewProfessor;
use crate::repositories::students::NewStudent;
use crate::repositories::subjects::{NewSubject, SubjectChanges};
use crate::services::store::{MemoryStore, Store};

const TEST_SECRET_KEY: &str = "test-secret";
pub(crate) const TEST_ADMIN_EMAIL: &str = "registrar@campus.test";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("CAMPUS_ENV", "test");
    std::env::set_var("CAMPUS_STRICT_CONFIG", "0");
    std::env::set_var("CAMPUS_STORE_BACKEND", "memory");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("ALGORITHM", "HS256");
    std::env::set_var("FIRST_ADMIN_EMAIL", TEST_ADMIN_EMAIL);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("API_V1_STR");
}

/// Settings for tests that do not need a router. Hold the guard while the
/// settings are in use.
pub(crate) async fn test_settings() -> (Settings, OwnedMutexGuard<()>) {
    let guard = env_lock().await;
    set_test_env();
    (Settings::load().expect("settings"), guard)
}

pub(crate) async fn setup_test_context() -> TestContext {
    setup_test_context_with(&[]).await
}

pub(crate) async fn setup_test_context_with(overrides: &[(&str, &str)]) -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    for (key, value) in overrides {
        std::env::set_var(key, value);
    }

    let settings = Settings::load().expect("settings");
    let state = AppState::new(settings, Arc::new(MemoryStore::new()));
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

pub(crate) fn test_now() -> PrimitiveDateTime {
    let date = Date::from_calendar_date(2025, Month::March, 3).expect("date");
    PrimitiveDateTime::new(date, Time::from_hms(9, 30, 0).expect("time"))
}

fn new_account(email: &str, full_name: &str, is_admin: bool) -> NewAccount {
    NewAccount {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        full_name: full_name.to_string(),
        is_active: true,
        is_admin,
        date_joined: test_now(),
    }
}

pub(crate) async fn seed_admin(store: &dyn Store, email: &str) -> Account {
    let (account, _) =
        store.create_account(new_account(email, "Registrar", true), None).await.expect("admin");
    account
}

pub(crate) async fn seed_student(
    store: &dyn Store,
    code: &str,
    full_name: &str,
) -> (Account, Student) {
    let account = new_account(&format!("{}@campus.test", code.to_lowercase()), full_name, false);
    let profile = NewProfile::Student(NewStudent {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        student_code: code.to_string(),
        career: "Systems Engineering".to_string(),
        semester: 3,
    });

    match store.create_account(account, Some(profile)).await.expect("student") {
        (account, Some(AccountProfile::Student(student))) => (account, student),
        other => panic!("expected student profile, got {other:?}"),
    }
}

pub(crate) async fn seed_professor(
    store: &dyn Store,
    code: &str,
    full_name: &str,
) -> (Account, Professor) {
    let account = new_account(&format!("{}@campus.test", code.to_lowercase()), full_name, false);
    let profile = NewProfile::Professor(NewProfessor {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        professor_code: code.to_string(),
        department: "Mathematics".to_string(),
        title: "PhD".to_string(),
        specialization: "Analysis".to_string(),
    });

    match store.create_account(account, Some(profile)).await.expect("professor") {
        (account, Some(AccountProfile::Professor(professor))) => (account, professor),
        other => panic!("expected professor profile, got {other:?}"),
    }
}

pub(crate) async fn seed_subject(
    store: &dyn Store,
    code: &str,
    name: &str,
    professor: Option<&Professor>,
    prerequisites: &[&Subject],
) -> Subject {
    store
        .create_subject(NewSubject {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            credits: 4,
            professor_id: professor.map(|professor| professor.id.clone()),
            department: Some("Mathematics".to_string()),
            semester_number: Some(1),
            is_active: true,
            prerequisite_ids: prerequisites.iter().map(|subject| subject.id.clone()).collect(),
            created_at: test_now(),
        })
        .await
        .expect("subject")
}

/// Records a completed enrollment with `grade`, bypassing the workflows.
pub(crate) async fn seed_grade(
    store: &dyn Store,
    student: &Student,
    subject: &Subject,
    period: &str,
    grade: f64,
) -> Enrollment {
    let professor_id = subject.professor_id.clone().expect("subject professor");
    let created = store
        .create_enrollments(vec![NewEnrollment {
            id: Uuid::new_v4().to_string(),
            student_id: student.id.clone(),
            subject_id: subject.id.clone(),
            professor_id,
            period: period.to_string(),
            date_enrolled: test_now(),
        }])
        .await
        .expect("enrollment");

    let completion = EnrollmentCompletion {
        enrollment_id: created[0].id.clone(),
        grade,
        completed_at: test_now(),
    };
    store.complete_enrollments(vec![completion]).await.expect("completion").remove(0)
}

pub(crate) fn no_subject_changes() -> SubjectChanges {
    SubjectChanges {
        name: None,
        description: None,
        credits: None,
        professor_id: None,
        department: None,
        semester_number: None,
        is_active: None,
        prerequisite_ids: None,
        updated_at: test_now(),
    }
}

pub(crate) fn bearer_token(account_id: &str, settings: &Settings) -> String {
    security::create_access_token(account_id, settings, None).expect("token")
}

pub(crate) async fn admin_token(ctx: &TestContext) -> (String, Account) {
    let admin = seed_admin(ctx.state.store(), TEST_ADMIN_EMAIL).await;
    (bearer_token(&admin.id, ctx.state.settings()), admin)
}

pub(crate) async fn student_token(ctx: &TestContext, code: &str, name: &str) -> (String, Student) {
    let (account, student) = seed_student(ctx.state.store(), code, name).await;
    (bearer_token(&account.id, ctx.state.settings()), student)
}

pub(crate) async fn professor_token(
    ctx: &TestContext,
    code: &str,
    name: &str,
) -> (String, Professor) {
    let (account, professor) = seed_professor(ctx.state.store(), code, name).await;
    (bearer_token(&account.id, ctx.state.settings()), professor)
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
