use async_trait::async_trait;
use sqlx::PgPool;

use super::{BatchWriteError, Store, StoreError, StoreHealth};
use crate::db::models::{
    Account, AccountProfile, Enrollment, Professor, RosterEntry, Student, Subject,
};
use crate::repositories::accounts::{AccountChanges, NewAccount, NewProfile};
use crate::repositories::enrollments::{
    EnrollmentCompletion, EnrollmentFilter, EnrollmentWriteError, NewEnrollment,
};
use crate::repositories::subjects::{NewSubject, SubjectChanges, SubjectFilter};
use crate::repositories::{accounts, enrollments, health, professors, students, subjects};

#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<EnrollmentWriteError> for BatchWriteError {
    fn from(error: EnrollmentWriteError) -> Self {
        match error {
            EnrollmentWriteError::Item { index, source } => {
                BatchWriteError::at(index, StoreError::from(source))
            }
            EnrollmentWriteError::NotActive { index } => BatchWriteError::at(
                index,
                StoreError::Conflict("enrollment is no longer active".to_string()),
            ),
            EnrollmentWriteError::Database(source) => StoreError::from(source).into(),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health(&self) -> Result<StoreHealth, StoreError> {
        health::ping(&self.pool).await?;
        let schema_version = health::schema_version(&self.pool).await?;
        Ok(StoreHealth { backend: "postgres", schema_version })
    }

    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(accounts::find_by_id(&self.pool, id).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(accounts::find_by_email(&self.pool, email).await?)
    }

    async fn create_account(
        &self,
        account: NewAccount,
        profile: Option<NewProfile>,
    ) -> Result<(Account, Option<AccountProfile>), StoreError> {
        Ok(accounts::create_with_profile(&self.pool, &account, profile.as_ref()).await?)
    }

    async fn update_account(
        &self,
        id: &str,
        changes: AccountChanges,
    ) -> Result<Option<Account>, StoreError> {
        Ok(accounts::update(&self.pool, id, &changes).await?)
    }

    async fn find_student_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Student>, StoreError> {
        Ok(students::find_by_account(&self.pool, account_id).await?)
    }

    async fn find_professor(&self, id: &str) -> Result<Option<Professor>, StoreError> {
        Ok(professors::find_by_id(&self.pool, id).await?)
    }

    async fn find_professor_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Professor>, StoreError> {
        Ok(professors::find_by_account(&self.pool, account_id).await?)
    }

    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StoreError> {
        Ok(subjects::create(&self.pool, &subject).await?)
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, StoreError> {
        Ok(subjects::find_by_id(&self.pool, id).await?)
    }

    async fn list_subjects(&self, filter: SubjectFilter) -> Result<Vec<Subject>, StoreError> {
        Ok(subjects::list(&self.pool, &filter).await?)
    }

    async fn update_subject(
        &self,
        id: &str,
        changes: SubjectChanges,
    ) -> Result<Option<Subject>, StoreError> {
        Ok(subjects::update(&self.pool, id, &changes).await?)
    }

    async fn delete_subject(&self, id: &str) -> Result<bool, StoreError> {
        Ok(subjects::delete(&self.pool, id).await?)
    }

    async fn list_prerequisites(&self, subject_id: &str) -> Result<Vec<Subject>, StoreError> {
        Ok(subjects::list_prerequisites(&self.pool, subject_id).await?)
    }

    async fn has_passed(&self, student_id: &str, subject_id: &str) -> Result<bool, StoreError> {
        Ok(enrollments::has_passed(&self.pool, student_id, subject_id).await?)
    }

    async fn is_enrolled_in_period(
        &self,
        student_id: &str,
        subject_id: &str,
        period: &str,
    ) -> Result<bool, StoreError> {
        Ok(enrollments::exists_in_period(&self.pool, student_id, subject_id, period).await?)
    }

    async fn create_enrollments(
        &self,
        batch: Vec<NewEnrollment>,
    ) -> Result<Vec<Enrollment>, BatchWriteError> {
        Ok(enrollments::create_batch(&self.pool, &batch).await?)
    }

    async fn find_active_enrollment(
        &self,
        subject_id: &str,
        student_code: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        Ok(enrollments::find_active_by_student_code(&self.pool, subject_id, student_code).await?)
    }

    async fn complete_enrollments(
        &self,
        batch: Vec<EnrollmentCompletion>,
    ) -> Result<Vec<Enrollment>, BatchWriteError> {
        Ok(enrollments::complete_batch(&self.pool, &batch).await?)
    }

    async fn list_student_enrollments(
        &self,
        student_id: &str,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Ok(enrollments::list_for_student(&self.pool, student_id, filter).await?)
    }

    async fn list_subject_roster(
        &self,
        subject_id: &str,
        active_only: bool,
    ) -> Result<Vec<RosterEntry>, StoreError> {
        Ok(enrollments::roster_for_subject(&self.pool, subject_id, active_only).await?)
    }
}
