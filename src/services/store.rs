//! Storage collaborator of the enrollment workflows.
//!
//! Workflows and handlers only talk to [`Store`]; the Postgres backend is
//! used in deployments and the in-memory backend for local runs and tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{
    Account, AccountProfile, Enrollment, Professor, RosterEntry, Student, Subject,
};
use crate::repositories::accounts::{AccountChanges, NewAccount, NewProfile};
use crate::repositories::enrollments::{EnrollmentCompletion, EnrollmentFilter, NewEnrollment};
use crate::repositories::subjects::{NewSubject, SubjectChanges, SubjectFilter};

pub(crate) use memory::MemoryStore;
pub(crate) use postgres::PgStore;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let constraint =
            crate::db::constraint_name(&error).unwrap_or_else(|| "unknown".to_string());
        if crate::db::is_unique_violation(&error) {
            Self::Conflict(constraint)
        } else if crate::db::is_foreign_key_violation(&error) {
            Self::MissingReference(constraint)
        } else {
            Self::Database(error)
        }
    }
}

/// Failure of an atomic batch write. Nothing of the batch was persisted.
#[derive(Debug, Error)]
#[error("batch write failed: {source}")]
pub(crate) struct BatchWriteError {
    /// Position of the offending item, when the failure is tied to one.
    pub(crate) index: Option<usize>,
    #[source]
    pub(crate) source: StoreError,
}

impl BatchWriteError {
    pub(crate) fn at(index: usize, source: StoreError) -> Self {
        Self { index: Some(index), source }
    }
}

impl From<StoreError> for BatchWriteError {
    fn from(source: StoreError) -> Self {
        Self { index: None, source }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoreHealth {
    pub(crate) backend: &'static str,
    pub(crate) schema_version: Option<i64>,
}

#[async_trait]
pub(crate) trait Store: Send + Sync {
    async fn health(&self) -> Result<StoreHealth, StoreError>;

    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn create_account(
        &self,
        account: NewAccount,
        profile: Option<NewProfile>,
    ) -> Result<(Account, Option<AccountProfile>), StoreError>;
    async fn update_account(
        &self,
        id: &str,
        changes: AccountChanges,
    ) -> Result<Option<Account>, StoreError>;

    async fn find_student_by_account(&self, account_id: &str)
        -> Result<Option<Student>, StoreError>;
    async fn find_professor(&self, id: &str) -> Result<Option<Professor>, StoreError>;
    async fn find_professor_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Professor>, StoreError>;

    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StoreError>;
    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, StoreError>;
    async fn list_subjects(&self, filter: SubjectFilter) -> Result<Vec<Subject>, StoreError>;
    async fn update_subject(
        &self,
        id: &str,
        changes: SubjectChanges,
    ) -> Result<Option<Subject>, StoreError>;
    async fn delete_subject(&self, id: &str) -> Result<bool, StoreError>;
    async fn list_prerequisites(&self, subject_id: &str) -> Result<Vec<Subject>, StoreError>;

    /// Whether the student completed the subject with a passing grade in any period.
    async fn has_passed(&self, student_id: &str, subject_id: &str) -> Result<bool, StoreError>;
    async fn is_enrolled_in_period(
        &self,
        student_id: &str,
        subject_id: &str,
        period: &str,
    ) -> Result<bool, StoreError>;
    async fn create_enrollments(
        &self,
        batch: Vec<NewEnrollment>,
    ) -> Result<Vec<Enrollment>, BatchWriteError>;
    async fn find_active_enrollment(
        &self,
        subject_id: &str,
        student_code: &str,
    ) -> Result<Option<Enrollment>, StoreError>;
    async fn complete_enrollments(
        &self,
        batch: Vec<EnrollmentCompletion>,
    ) -> Result<Vec<Enrollment>, BatchWriteError>;
    async fn list_student_enrollments(
        &self,
        student_id: &str,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError>;
    async fn list_subject_roster(
        &self,
        subject_id: &str,
        active_only: bool,
    ) -> Result<Vec<RosterEntry>, StoreError>;
}
