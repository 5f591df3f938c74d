use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Account, Professor, Student};

pub(crate) struct CurrentUser(pub(crate) Account);
pub(crate) struct CurrentAdmin(pub(crate) Account);

/// Caller owning a student profile.
pub(crate) struct CurrentStudent {
    pub(crate) account: Account,
    pub(crate) student: Student,
}

/// Caller owning a professor profile.
pub(crate) struct CurrentProfessor {
    pub(crate) account: Account,
    pub(crate) professor: Professor,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let account = app_state
            .store()
            .find_account(&claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load account"))?;

        let Some(account) = account else {
            return Err(ApiError::Unauthorized("Account not found"));
        };

        if !account.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(account))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        if account.is_admin {
            Ok(CurrentAdmin(account))
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        let student = state
            .store()
            .find_student_by_account(&account.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student profile"))?
            .ok_or_else(|| ApiError::NotFound("Student profile not found".to_string()))?;

        Ok(CurrentStudent { account, student })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentProfessor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        let professor = state
            .store()
            .find_professor_by_account(&account.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load professor profile"))?
            .ok_or_else(|| ApiError::NotFound("Professor profile not found".to_string()))?;

        Ok(CurrentProfessor { account, professor })
    }
}
