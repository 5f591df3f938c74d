use axum::{http::StatusCode, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::enrollments::EnrollmentFilter;
use crate::schemas::enrollment::{
    ApprovedSubjectsResponse, EnrollmentRequest, EnrollmentResponse,
};
use crate::services::{enrollment, reporting};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/me/enrollments", get(list_enrollments).post(enroll))
        .route("/me/subjects", get(my_subjects))
        .route("/me/approved", get(approved_subjects))
        .route("/me/failed", get(failed_subjects))
}

async fn list_enrollments(
    caller: CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = state
        .store()
        .list_student_enrollments(&caller.student.id, EnrollmentFilter::All)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(EnrollmentResponse::from_many(enrollments)))
}

async fn enroll(
    caller: CurrentStudent,
    state: axum::extract::State<AppState>,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<(StatusCode, Json<Vec<EnrollmentResponse>>), ApiError> {
    validate_payload(&payload)?;

    let period = payload.period.trim();
    if period.is_empty() {
        return Err(ApiError::BadRequest("period must not be blank".to_string()));
    }
    let created = enrollment::enroll(
        state.store(),
        &caller.student,
        &payload.subject_ids,
        period,
        primitive_now_utc(),
    )
    .await
    .inspect_err(|err| {
        tracing::info!(
            account_id = %caller.account.id,
            period = %period,
            error = %err,
            "Enrollment request rejected"
        );
    })?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_many(created))))
}

async fn my_subjects(
    caller: CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = reporting::my_subjects(state.store(), &caller.student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(EnrollmentResponse::from_many(enrollments)))
}

async fn approved_subjects(
    caller: CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<Json<ApprovedSubjectsResponse>, ApiError> {
    let report = reporting::approved_subjects(state.store(), &caller.student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list approved subjects"))?;

    Ok(Json(ApprovedSubjectsResponse {
        subjects: EnrollmentResponse::from_many(report.enrollments),
        average: report.average,
    }))
}

async fn failed_subjects(
    caller: CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = reporting::failed_subjects(state.store(), &caller.student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list failed subjects"))?;

    Ok(Json(EnrollmentResponse::from_many(enrollments)))
}

#[cfg(test)]
mod tests;
