use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{validate_payload, validate_prerequisites};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::subjects::{NewSubject, SubjectChanges, SubjectFilter};
use crate::schemas::subject::{SubjectCreate, SubjectListQuery, SubjectResponse, SubjectUpdate};
use crate::services::store::{Store, StoreError};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route("/:subject_id", get(get_subject).patch(update_subject).delete(delete_subject))
}

fn write_error(err: StoreError, context: &str) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::Conflict("Subject code already exists".to_string()),
        StoreError::MissingReference(constraint) if constraint.contains("professor") => {
            ApiError::BadRequest("Professor not found".to_string())
        }
        StoreError::MissingReference(_) => {
            ApiError::BadRequest("Prerequisite subject not found".to_string())
        }
        other => ApiError::internal(other, context),
    }
}

/// Rejects an unknown professor before the write reaches the foreign key.
async fn ensure_professor_exists(
    store: &dyn Store,
    professor_id: Option<&str>,
) -> Result<(), ApiError> {
    let Some(professor_id) = professor_id else {
        return Ok(());
    };
    store
        .find_professor(professor_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch professor"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Professor not found".to_string()))
}

async fn list_subjects(
    Query(params): Query<SubjectListQuery>,
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let filter = SubjectFilter { professor_id: params.professor_id, is_active: params.is_active };
    let subjects = state
        .store()
        .list_subjects(filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}

async fn get_subject(
    Path(subject_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<SubjectResponse>, ApiError> {
    let store = state.store();
    let subject = store
        .find_subject(&subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;
    let prerequisites = store
        .list_prerequisites(&subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prerequisites"))?;

    Ok(Json(SubjectResponse::from_db(subject).with_prerequisites(prerequisites)))
}

async fn create_subject(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    validate_payload(&payload)?;
    let store = state.store();
    ensure_professor_exists(store, payload.professor_id.as_deref()).await?;

    let params = NewSubject {
        id: uuid::Uuid::new_v4().to_string(),
        code: payload.code.trim().to_string(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        credits: payload.credits,
        professor_id: payload.professor_id,
        department: payload.department,
        semester_number: payload.semester_number,
        is_active: payload.is_active,
        prerequisite_ids: payload.prerequisite_ids,
        created_at: primitive_now_utc(),
    };

    let subject =
        store.create_subject(params).await.map_err(|e| write_error(e, "Failed to create subject"))?;
    let prerequisites = store
        .list_prerequisites(&subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prerequisites"))?;

    tracing::info!(
        admin_id = %admin.id,
        subject_id = %subject.id,
        code = %subject.code,
        action = "subject_create",
        "Subject created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubjectResponse::from_db(subject).with_prerequisites(prerequisites)),
    ))
}

async fn update_subject(
    Path(subject_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    validate_payload(&payload)?;
    if let Some(prerequisite_ids) = payload.prerequisite_ids.as_deref() {
        validate_prerequisites(Some(&subject_id), prerequisite_ids)?;
    }
    let store = state.store();
    ensure_professor_exists(store, payload.professor_id.as_deref()).await?;

    let changes = SubjectChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        description: payload.description,
        credits: payload.credits,
        professor_id: payload.professor_id,
        department: payload.department,
        semester_number: payload.semester_number,
        is_active: payload.is_active,
        prerequisite_ids: payload.prerequisite_ids,
        updated_at: primitive_now_utc(),
    };

    let subject = store
        .update_subject(&subject_id, changes)
        .await
        .map_err(|e| write_error(e, "Failed to update subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;
    let prerequisites = store
        .list_prerequisites(&subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch prerequisites"))?;

    tracing::info!(
        admin_id = %admin.id,
        subject_id = %subject.id,
        action = "subject_update",
        "Subject updated"
    );

    Ok(Json(SubjectResponse::from_db(subject).with_prerequisites(prerequisites)))
}

async fn delete_subject(
    Path(subject_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store()
        .delete_subject(&subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete subject"))?;

    if !deleted {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        subject_id = %subject_id,
        action = "subject_delete",
        "Subject deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
