use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{normalize_email, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Account, AccountProfile};
use crate::repositories::accounts::{AccountChanges, NewAccount, NewProfile};
use crate::repositories::professors::NewProfessor;
use crate::repositories::students::NewStudent;
use crate::schemas::account::{AccountCreate, AccountResponse, AccountUpdate};
use crate::services::store::StoreError;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_account))
        .route("/me", get(me))
        .route("/:account_id", get(get_account).patch(update_account))
}

pub(crate) async fn load_profile(
    state: &AppState,
    account: &Account,
) -> Result<Option<AccountProfile>, ApiError> {
    let store = state.store();
    if let Some(student) = store
        .find_student_by_account(&account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student profile"))?
    {
        return Ok(Some(AccountProfile::Student(student)));
    }

    let professor = store
        .find_professor_by_account(&account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load professor profile"))?;
    Ok(professor.map(AccountProfile::Professor))
}

async fn me(
    CurrentUser(account): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let profile = load_profile(&state, &account).await?;
    Ok(Json(AccountResponse::from_db(account, profile)))
}

async fn create_account(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AccountCreate>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    validate_payload(&payload)?;

    let account_id = uuid::Uuid::new_v4().to_string();
    let profile = match (payload.student, payload.professor) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "An account owns either a student or a professor profile, not both".to_string(),
            ))
        }
        (Some(student), None) => Some(NewProfile::Student(NewStudent {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.clone(),
            student_code: student.student_code.trim().to_string(),
            career: student.career,
            semester: student.semester,
        })),
        (None, Some(professor)) => Some(NewProfile::Professor(NewProfessor {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.clone(),
            professor_code: professor.professor_code.trim().to_string(),
            department: professor.department,
            title: professor.title,
            specialization: professor.specialization,
        })),
        (None, None) if payload.is_admin => None,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "A student or professor profile is required".to_string(),
            ))
        }
    };

    let new_account = NewAccount {
        id: account_id,
        email: normalize_email(&payload.email),
        full_name: payload.full_name.trim().to_string(),
        is_active: true,
        is_admin: payload.is_admin,
        date_joined: primitive_now_utc(),
    };

    let (account, profile) =
        state.store().create_account(new_account, profile).await.map_err(|err| match err {
            StoreError::Conflict(constraint) => ApiError::Conflict(conflict_message(&constraint)),
            other => ApiError::internal(other, "Failed to create account"),
        })?;

    tracing::info!(
        admin_id = %admin.id,
        account_id = %account.id,
        action = "account_create",
        "Account created"
    );

    Ok((StatusCode::CREATED, Json(AccountResponse::from_db(account, profile))))
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "students_student_code_key" => "Student code already registered",
        "professors_professor_code_key" => "Professor code already registered",
        _ => "Email already registered",
    }
    .to_string()
}

async fn get_account(
    Path(account_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store()
        .find_account(&account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch account"))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let profile = load_profile(&state, &account).await?;
    Ok(Json(AccountResponse::from_db(account, profile)))
}

async fn update_account(
    Path(account_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountResponse>, ApiError> {
    validate_payload(&payload)?;

    let changes = AccountChanges {
        full_name: payload.full_name.map(|name| name.trim().to_string()),
        is_active: payload.is_active,
        updated_at: primitive_now_utc(),
    };

    let account = state
        .store()
        .update_account(&account_id, changes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update account"))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        account_id = %account.id,
        action = "account_update",
        "Account updated"
    );

    let profile = load_profile(&state, &account).await?;
    Ok(Json(AccountResponse::from_db(account, profile)))
}
