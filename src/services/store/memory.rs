use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BatchWriteError, Store, StoreError, StoreHealth};
use crate::db::models::{
    Account, AccountProfile, Enrollment, Professor, RosterEntry, Student, Subject,
};
use crate::db::types::EnrollmentStatus;
use crate::repositories::accounts::{AccountChanges, NewAccount, NewProfile};
use crate::repositories::enrollments::{EnrollmentCompletion, EnrollmentFilter, NewEnrollment};
use crate::repositories::subjects::{NewSubject, SubjectChanges, SubjectFilter};

/// Process-local store with the same uniqueness and referential rules as the
/// Postgres schema. Batches are checked in full before any row is applied.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    students: Vec<Student>,
    professors: Vec<Professor>,
    subjects: Vec<Subject>,
    // (subject_id, prerequisite_id)
    prerequisites: Vec<(String, String)>,
    enrollments: Vec<Enrollment>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id == id)
    }

    fn has_professor(&self, id: &str) -> bool {
        self.professors.iter().any(|professor| professor.id == id)
    }

    fn check_prerequisites(&self, subject_id: &str, ids: &[String]) -> Result<(), StoreError> {
        for prerequisite_id in ids {
            if prerequisite_id == subject_id {
                return Err(StoreError::Conflict("ck_subject_prerequisites_not_self".into()));
            }
            if self.subject(prerequisite_id).is_none() {
                return Err(StoreError::MissingReference(
                    "subject_prerequisites_prerequisite_id_fkey".into(),
                ));
            }
        }
        Ok(())
    }

    fn replace_prerequisites(&mut self, subject_id: &str, ids: &[String]) {
        self.prerequisites.retain(|(owner, _)| owner != subject_id);
        for prerequisite_id in ids {
            let edge = (subject_id.to_string(), prerequisite_id.clone());
            if !self.prerequisites.contains(&edge) {
                self.prerequisites.push(edge);
            }
        }
    }

    fn check_new_enrollment(
        &self,
        params: &NewEnrollment,
        pending: &[Enrollment],
    ) -> Result<(), StoreError> {
        if self.student(&params.student_id).is_none() {
            return Err(StoreError::MissingReference("enrollments_student_id_fkey".into()));
        }
        if self.subject(&params.subject_id).is_none() {
            return Err(StoreError::MissingReference("enrollments_subject_id_fkey".into()));
        }
        if !self.has_professor(&params.professor_id) {
            return Err(StoreError::MissingReference("enrollments_professor_id_fkey".into()));
        }
        let duplicate = self.enrollments.iter().chain(pending.iter()).any(|existing| {
            existing.student_id == params.student_id
                && existing.subject_id == params.subject_id
                && existing.period == params.period
        });
        if duplicate {
            return Err(StoreError::Conflict("uq_enrollments_student_subject_period".into()));
        }
        Ok(())
    }
}

fn matches_filter(enrollment: &Enrollment, filter: EnrollmentFilter) -> bool {
    match filter {
        EnrollmentFilter::All => true,
        EnrollmentFilter::Active => enrollment.status == EnrollmentStatus::Active,
        EnrollmentFilter::Completed => enrollment.is_completed && enrollment.grade.is_some(),
        EnrollmentFilter::Approved => enrollment.is_completed && enrollment.is_approved(),
        EnrollmentFilter::Failed => enrollment.is_failed(),
    }
}

/// Mirrors `ORDER BY semester_number NULLS LAST, name`.
fn by_semester_then_name(subjects: &mut [Subject]) {
    subjects.sort_by(|a, b| {
        let semester = |s: &Subject| s.semester_number.unwrap_or(i32::MAX);
        semester(a).cmp(&semester(b)).then_with(|| a.name.cmp(&b.name))
    });
}

fn newest_first(rows: &mut [Enrollment]) {
    rows.sort_by(|a, b| b.date_enrolled.cmp(&a.date_enrolled));
}

#[async_trait]
impl Store for MemoryStore {
    async fn health(&self) -> Result<StoreHealth, StoreError> {
        Ok(StoreHealth { backend: "memory", schema_version: None })
    }

    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().await.account(id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_account(
        &self,
        account: NewAccount,
        profile: Option<NewProfile>,
    ) -> Result<(Account, Option<AccountProfile>), StoreError> {
        let mut tables = self.tables.write().await;

        let email_taken = tables
            .accounts
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&account.email));
        if email_taken {
            return Err(StoreError::Conflict("accounts_email_key".into()));
        }
        match profile.as_ref() {
            Some(NewProfile::Student(student))
                if tables.students.iter().any(|s| s.student_code == student.student_code) =>
            {
                return Err(StoreError::Conflict("students_student_code_key".into()));
            }
            Some(NewProfile::Professor(professor))
                if tables
                    .professors
                    .iter()
                    .any(|p| p.professor_code == professor.professor_code) =>
            {
                return Err(StoreError::Conflict("professors_professor_code_key".into()));
            }
            _ => {}
        }

        let created = Account {
            id: account.id,
            email: account.email,
            full_name: account.full_name,
            is_active: account.is_active,
            is_admin: account.is_admin,
            date_joined: account.date_joined,
            updated_at: account.date_joined,
        };
        let profile = profile.map(|profile| match profile {
            NewProfile::Student(params) => AccountProfile::Student(Student {
                id: params.id,
                account_id: created.id.clone(),
                student_code: params.student_code,
                career: params.career,
                semester: params.semester,
            }),
            NewProfile::Professor(params) => AccountProfile::Professor(Professor {
                id: params.id,
                account_id: created.id.clone(),
                professor_code: params.professor_code,
                department: params.department,
                title: params.title,
                specialization: params.specialization,
            }),
        });

        tables.accounts.push(created.clone());
        match profile.clone() {
            Some(AccountProfile::Student(student)) => tables.students.push(student),
            Some(AccountProfile::Professor(professor)) => tables.professors.push(professor),
            None => {}
        }
        Ok((created, profile))
    }

    async fn update_account(
        &self,
        id: &str,
        changes: AccountChanges,
    ) -> Result<Option<Account>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(account) = tables.accounts.iter_mut().find(|account| account.id == id) else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            account.full_name = full_name;
        }
        if let Some(is_active) = changes.is_active {
            account.is_active = is_active;
        }
        account.updated_at = changes.updated_at;
        Ok(Some(account.clone()))
    }

    async fn find_student_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Student>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.students.iter().find(|student| student.account_id == account_id).cloned())
    }

    async fn find_professor(&self, id: &str) -> Result<Option<Professor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.professors.iter().find(|professor| professor.id == id).cloned())
    }

    async fn find_professor_by_account(
        &self,
        account_id: &str,
    ) -> Result<Option<Professor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.professors.iter().find(|professor| professor.account_id == account_id).cloned())
    }

    async fn create_subject(&self, subject: NewSubject) -> Result<Subject, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.subjects.iter().any(|existing| existing.code == subject.code) {
            return Err(StoreError::Conflict("subjects_code_key".into()));
        }
        if let Some(professor_id) = subject.professor_id.as_deref() {
            if !tables.has_professor(professor_id) {
                return Err(StoreError::MissingReference("subjects_professor_id_fkey".into()));
            }
        }
        tables.check_prerequisites(&subject.id, &subject.prerequisite_ids)?;

        let created = Subject {
            id: subject.id,
            code: subject.code,
            name: subject.name,
            description: subject.description,
            credits: subject.credits,
            professor_id: subject.professor_id,
            department: subject.department,
            semester_number: subject.semester_number,
            is_active: subject.is_active,
            created_at: subject.created_at,
            updated_at: subject.created_at,
        };
        tables.replace_prerequisites(&created.id, &subject.prerequisite_ids);
        tables.subjects.push(created.clone());
        Ok(created)
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, StoreError> {
        Ok(self.tables.read().await.subject(id).cloned())
    }

    async fn list_subjects(&self, filter: SubjectFilter) -> Result<Vec<Subject>, StoreError> {
        let tables = self.tables.read().await;
        let mut subjects: Vec<Subject> = tables
            .subjects
            .iter()
            .filter(|subject| {
                filter
                    .professor_id
                    .as_deref()
                    .map_or(true, |id| subject.professor_id.as_deref() == Some(id))
            })
            .filter(|subject| filter.is_active.map_or(true, |active| subject.is_active == active))
            .cloned()
            .collect();
        by_semester_then_name(&mut subjects);
        Ok(subjects)
    }

    async fn update_subject(
        &self,
        id: &str,
        changes: SubjectChanges,
    ) -> Result<Option<Subject>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.subject(id).is_none() {
            return Ok(None);
        }
        if let Some(professor_id) = changes.professor_id.as_deref() {
            if !tables.has_professor(professor_id) {
                return Err(StoreError::MissingReference("subjects_professor_id_fkey".into()));
            }
        }
        if let Some(prerequisite_ids) = changes.prerequisite_ids.as_deref() {
            tables.check_prerequisites(id, prerequisite_ids)?;
            tables.replace_prerequisites(id, prerequisite_ids);
        }

        let Some(subject) = tables.subjects.iter_mut().find(|subject| subject.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            subject.name = name;
        }
        if changes.description.is_some() {
            subject.description = changes.description;
        }
        if let Some(credits) = changes.credits {
            subject.credits = credits;
        }
        if changes.professor_id.is_some() {
            subject.professor_id = changes.professor_id;
        }
        if changes.department.is_some() {
            subject.department = changes.department;
        }
        if changes.semester_number.is_some() {
            subject.semester_number = changes.semester_number;
        }
        if let Some(is_active) = changes.is_active {
            subject.is_active = is_active;
        }
        subject.updated_at = changes.updated_at;
        Ok(Some(subject.clone()))
    }

    async fn delete_subject(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.subjects.len();
        tables.subjects.retain(|subject| subject.id != id);
        if tables.subjects.len() == before {
            return Ok(false);
        }
        tables.prerequisites.retain(|(owner, prerequisite)| owner != id && prerequisite != id);
        tables.enrollments.retain(|enrollment| enrollment.subject_id != id);
        Ok(true)
    }

    async fn list_prerequisites(&self, subject_id: &str) -> Result<Vec<Subject>, StoreError> {
        let tables = self.tables.read().await;
        let mut prerequisites: Vec<Subject> = tables
            .prerequisites
            .iter()
            .filter(|(owner, _)| owner == subject_id)
            .filter_map(|(_, prerequisite_id)| tables.subject(prerequisite_id).cloned())
            .collect();
        by_semester_then_name(&mut prerequisites);
        Ok(prerequisites)
    }

    async fn has_passed(&self, student_id: &str, subject_id: &str) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.iter().any(|enrollment| {
            enrollment.student_id == student_id
                && enrollment.subject_id == subject_id
                && matches_filter(enrollment, EnrollmentFilter::Approved)
        }))
    }

    async fn is_enrolled_in_period(
        &self,
        student_id: &str,
        subject_id: &str,
        period: &str,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.iter().any(|enrollment| {
            enrollment.student_id == student_id
                && enrollment.subject_id == subject_id
                && enrollment.period == period
        }))
    }

    async fn create_enrollments(
        &self,
        batch: Vec<NewEnrollment>,
    ) -> Result<Vec<Enrollment>, BatchWriteError> {
        let mut tables = self.tables.write().await;
        let mut created: Vec<Enrollment> = Vec::with_capacity(batch.len());

        for (index, params) in batch.into_iter().enumerate() {
            tables
                .check_new_enrollment(&params, &created)
                .map_err(|source| BatchWriteError::at(index, source))?;
            created.push(Enrollment {
                id: params.id,
                student_id: params.student_id,
                subject_id: params.subject_id,
                professor_id: params.professor_id,
                status: EnrollmentStatus::Active,
                grade: None,
                attendance: 0.0,
                date_enrolled: params.date_enrolled,
                date_completed: None,
                is_completed: false,
                period: params.period,
                notes: String::new(),
            });
        }

        tables.enrollments.extend(created.iter().cloned());
        Ok(created)
    }

    async fn find_active_enrollment(
        &self,
        subject_id: &str,
        student_code: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let tables = self.tables.read().await;
        let Some(student) = tables.students.iter().find(|s| s.student_code == student_code) else {
            return Ok(None);
        };
        let mut candidates: Vec<Enrollment> = tables
            .enrollments
            .iter()
            .filter(|enrollment| {
                enrollment.subject_id == subject_id
                    && enrollment.student_id == student.id
                    && enrollment.status == EnrollmentStatus::Active
            })
            .cloned()
            .collect();
        newest_first(&mut candidates);
        Ok(candidates.into_iter().next())
    }

    async fn complete_enrollments(
        &self,
        batch: Vec<EnrollmentCompletion>,
    ) -> Result<Vec<Enrollment>, BatchWriteError> {
        let mut tables = self.tables.write().await;

        let mut positions = Vec::with_capacity(batch.len());
        for (index, params) in batch.iter().enumerate() {
            let position = tables.enrollments.iter().position(|enrollment| {
                enrollment.id == params.enrollment_id
                    && enrollment.status == EnrollmentStatus::Active
            });
            match position {
                Some(position) if !positions.contains(&position) => positions.push(position),
                _ => {
                    return Err(BatchWriteError::at(
                        index,
                        StoreError::Conflict("enrollment is no longer active".into()),
                    ))
                }
            }
        }

        let mut updated = Vec::with_capacity(batch.len());
        for (params, position) in batch.iter().zip(positions) {
            let enrollment = &mut tables.enrollments[position];
            enrollment.grade = Some(params.grade);
            enrollment.is_completed = true;
            enrollment.status = EnrollmentStatus::Completed;
            enrollment.date_completed.get_or_insert(params.completed_at);
            updated.push(enrollment.clone());
        }
        Ok(updated)
    }

    async fn list_student_enrollments(
        &self,
        student_id: &str,
        filter: EnrollmentFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Enrollment> = tables
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.student_id == student_id)
            .filter(|enrollment| matches_filter(enrollment, filter))
            .cloned()
            .collect();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn list_subject_roster(
        &self,
        subject_id: &str,
        active_only: bool,
    ) -> Result<Vec<RosterEntry>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Enrollment> = tables
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.subject_id == subject_id)
            .filter(|enrollment| !active_only || enrollment.status == EnrollmentStatus::Active)
            .cloned()
            .collect();
        newest_first(&mut rows);

        Ok(rows
            .into_iter()
            .filter_map(|enrollment| {
                let student = tables.student(&enrollment.student_id)?;
                let account = tables.account(&student.account_id)?;
                Some(RosterEntry {
                    enrollment_id: enrollment.id,
                    student_code: student.student_code.clone(),
                    full_name: account.full_name.clone(),
                    grade: enrollment.grade,
                    status: enrollment.status,
                    date_completed: enrollment.date_completed,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        no_subject_changes, seed_grade, seed_professor, seed_student, seed_subject, test_now,
    };

    fn new_enrollment(student_id: &str, subject_id: &str, professor_id: &str) -> NewEnrollment {
        NewEnrollment {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            professor_id: professor_id.to_string(),
            period: "2025-1".to_string(),
            date_enrolled: test_now(),
        }
    }

    #[tokio::test]
    async fn failing_batch_item_leaves_store_untouched() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let algebra = seed_subject(&store, "A100", "Algebra", Some(&professor), &[]).await;

        let batch = vec![
            new_enrollment(&student.id, &algebra.id, &professor.id),
            new_enrollment(&student.id, "missing-subject", &professor.id),
        ];
        let error = store.create_enrollments(batch).await.expect_err("missing subject");

        assert_eq!(error.index, Some(1));
        assert!(matches!(error.source, StoreError::MissingReference(_)));
        assert!(!store.is_enrolled_in_period(&student.id, &algebra.id, "2025-1").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_subject_cascades_to_prerequisites_and_enrollments() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let calc1 = seed_subject(&store, "MAT101", "Calculus I", Some(&professor), &[]).await;
        let calc2 =
            seed_subject(&store, "MAT102", "Calculus II", Some(&professor), &[&calc1]).await;
        seed_grade(&store, &student, &calc1, "2024-2", 4.0).await;

        assert!(store.delete_subject(&calc1.id).await.unwrap());

        assert!(store.list_prerequisites(&calc2.id).await.unwrap().is_empty());
        let remaining =
            store.list_student_enrollments(&student.id, EnrollmentFilter::All).await.unwrap();
        assert!(remaining.is_empty());
        assert!(!store.delete_subject(&calc1.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_regardless_of_case() {
        let store = MemoryStore::new();
        seed_student(&store, "S001", "Ana Perez").await;

        let account = NewAccount {
            id: uuid::Uuid::new_v4().to_string(),
            email: "S001@CAMPUS.TEST".to_string(),
            full_name: "Someone Else".to_string(),
            is_active: true,
            is_admin: false,
            date_joined: test_now(),
        };
        let error = store.create_account(account, None).await.expect_err("duplicate email");

        assert!(matches!(error, StoreError::Conflict(ref name) if name == "accounts_email_key"));
    }

    #[tokio::test]
    async fn prerequisites_are_ordered_by_semester_then_name() {
        let store = MemoryStore::new();
        let zoology = seed_subject(&store, "Z100", "Zoology", None, &[]).await;
        let botany = seed_subject(&store, "B100", "Botany", None, &[]).await;
        let anatomy = seed_subject(&store, "A100", "Anatomy", None, &[]).await;
        let mut later = no_subject_changes();
        later.semester_number = Some(3);
        store.update_subject(&anatomy.id, later).await.unwrap();
        let thesis =
            seed_subject(&store, "T900", "Thesis", None, &[&anatomy, &zoology, &botany]).await;

        let names: Vec<String> = store
            .list_prerequisites(&thesis.id)
            .await
            .unwrap()
            .into_iter()
            .map(|subject| subject.name)
            .collect();

        assert_eq!(names, vec!["Botany", "Zoology", "Anatomy"]);
    }
}
