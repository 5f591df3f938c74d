use axum::{extract::Path, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentProfessor;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::schemas::enrollment::{
    EnrollmentResponse, GradeSheetEntryResponse, GradeSubmission, RosterEntryResponse,
};
use crate::schemas::subject::SubjectResponse;
use crate::services::{grading, reporting};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/me/subjects", get(my_subjects))
        .route("/me/subjects/:subject_id/students", get(student_list))
        .route("/me/subjects/:subject_id/grades", get(student_grades).post(grade_students))
}

async fn my_subjects(
    caller: CurrentProfessor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let subjects = reporting::professor_subjects(state.store(), &caller.professor)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    Ok(Json(subjects.into_iter().map(SubjectResponse::from_db).collect()))
}

async fn student_list(
    Path(subject_id): Path<String>,
    caller: CurrentProfessor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<RosterEntryResponse>>, ApiError> {
    let roster = reporting::roster_for(state.store(), &subject_id, &caller.professor).await?;
    Ok(Json(roster.into_iter().map(RosterEntryResponse::from_db).collect()))
}

async fn student_grades(
    Path(subject_id): Path<String>,
    caller: CurrentProfessor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<GradeSheetEntryResponse>>, ApiError> {
    let sheet = reporting::grades_for(state.store(), &subject_id, &caller.professor).await?;
    Ok(Json(sheet.into_iter().map(GradeSheetEntryResponse::from_db).collect()))
}

async fn grade_students(
    Path(subject_id): Path<String>,
    caller: CurrentProfessor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<GradeSubmission>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let items = payload.items();
    let updated = grading::grade_subject(
        state.store(),
        &caller.professor,
        &subject_id,
        &items,
        primitive_now_utc(),
    )
    .await
    .inspect_err(|err| {
        tracing::info!(
            account_id = %caller.account.id,
            subject_id = %subject_id,
            error = %err,
            "Grade submission rejected"
        );
    })?;

    Ok(Json(EnrollmentResponse::from_many(updated)))
}

#[cfg(test)]
mod tests;
