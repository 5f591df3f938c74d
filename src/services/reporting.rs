use crate::db::models::{Enrollment, Professor, RosterEntry, Student, Subject};
use crate::repositories::enrollments::EnrollmentFilter;
use crate::repositories::subjects::SubjectFilter;
use crate::services::store::{Store, StoreError};
use crate::services::WorkflowError;

#[derive(Debug, Clone)]
pub(crate) struct ApprovedReport {
    pub(crate) enrollments: Vec<Enrollment>,
    /// Mean over every completed enrollment, passed or not, to two decimals.
    pub(crate) average: f64,
}

/// Mean grade over completed enrollments; `0.0` when there are none.
pub(crate) fn average_grade(enrollments: &[Enrollment]) -> f64 {
    let grades: Vec<f64> = enrollments
        .iter()
        .filter(|enrollment| enrollment.is_completed)
        .filter_map(|enrollment| enrollment.grade)
        .collect();

    if grades.is_empty() {
        return 0.0;
    }
    grades.iter().sum::<f64>() / grades.len() as f64
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) async fn my_subjects(
    store: &dyn Store,
    student: &Student,
) -> Result<Vec<Enrollment>, StoreError> {
    store.list_student_enrollments(&student.id, EnrollmentFilter::Active).await
}

pub(crate) async fn approved_subjects(
    store: &dyn Store,
    student: &Student,
) -> Result<ApprovedReport, StoreError> {
    let completed = store.list_student_enrollments(&student.id, EnrollmentFilter::Completed).await?;
    let enrollments =
        store.list_student_enrollments(&student.id, EnrollmentFilter::Approved).await?;
    Ok(ApprovedReport { enrollments, average: round2(average_grade(&completed)) })
}

pub(crate) async fn failed_subjects(
    store: &dyn Store,
    student: &Student,
) -> Result<Vec<Enrollment>, StoreError> {
    store.list_student_enrollments(&student.id, EnrollmentFilter::Failed).await
}

pub(crate) async fn professor_subjects(
    store: &dyn Store,
    professor: &Professor,
) -> Result<Vec<Subject>, StoreError> {
    store
        .list_subjects(SubjectFilter { professor_id: Some(professor.id.clone()), is_active: None })
        .await
}

/// Active enrollments of a subject the professor teaches.
pub(crate) async fn roster_for(
    store: &dyn Store,
    subject_id: &str,
    professor: &Professor,
) -> Result<Vec<RosterEntry>, WorkflowError> {
    let subject = owned_subject(store, subject_id, professor, "students").await?;
    Ok(store.list_subject_roster(&subject.id, true).await?)
}

/// Every enrollment of a subject the professor teaches, whatever its status.
pub(crate) async fn grades_for(
    store: &dyn Store,
    subject_id: &str,
    professor: &Professor,
) -> Result<Vec<RosterEntry>, WorkflowError> {
    let subject = owned_subject(store, subject_id, professor, "grades").await?;
    Ok(store.list_subject_roster(&subject.id, false).await?)
}

async fn owned_subject(
    store: &dyn Store,
    subject_id: &str,
    professor: &Professor,
    view: &str,
) -> Result<Subject, WorkflowError> {
    let subject = store
        .find_subject(subject_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Subject not found".to_string()))?;

    if !subject.is_taught_by(professor) {
        return Err(WorkflowError::Forbidden(format!(
            "You are not authorized to view this subject's {view}"
        )));
    }
    Ok(subject)
}
