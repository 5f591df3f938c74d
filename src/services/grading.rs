use std::collections::HashSet;

use time::PrimitiveDateTime;

use crate::db::models::{Enrollment, Professor, MAX_GRADE, MIN_GRADE};
use crate::repositories::enrollments::EnrollmentCompletion;
use crate::services::store::{BatchWriteError, Store};
use crate::services::{ItemError, WorkflowError};

/// One entry of a grade submission, already parsed at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GradeItem {
    Entry { student_id: String, grade: f64 },
    Malformed,
}

/// Grades the active enrollments of a subject and marks them completed.
///
/// Only the subject's professor may grade. Items are validated in full before
/// anything is written; the completions are applied atomically.
pub(crate) async fn grade_subject(
    store: &dyn Store,
    professor: &Professor,
    subject_id: &str,
    items: &[GradeItem],
    now: PrimitiveDateTime,
) -> Result<Vec<Enrollment>, WorkflowError> {
    let subject = store
        .find_subject(subject_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Subject not found".to_string()))?;

    if !subject.is_taught_by(professor) {
        tracing::warn!(
            professor_id = %professor.id,
            subject_id = %subject.id,
            "Grading attempt by a professor not assigned to the subject"
        );
        return Err(WorkflowError::Forbidden(
            "You are not authorized to grade this subject".to_string(),
        ));
    }

    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut errors = Vec::new();
    let mut batch = Vec::new();
    let mut graded_students = Vec::new();
    let mut seen = HashSet::new();

    for item in items {
        let GradeItem::Entry { student_id, grade } = item else {
            errors.push(ItemError::Validation("Invalid grade data format".to_string()));
            continue;
        };

        if !seen.insert(student_id.as_str()) {
            errors.push(ItemError::Validation(format!(
                "Duplicate grade entry for student {student_id}"
            )));
            continue;
        }

        if !(MIN_GRADE..=MAX_GRADE).contains(grade) {
            errors.push(ItemError::Validation(format!(
                "Grade {grade} for student {student_id} must be between 0.0 and 5.0"
            )));
            continue;
        }

        let Some(enrollment) = store.find_active_enrollment(&subject.id, student_id).await? else {
            errors.push(ItemError::NotFound(format!(
                "Student {student_id} not found in this subject"
            )));
            continue;
        };

        batch.push(EnrollmentCompletion {
            enrollment_id: enrollment.id,
            grade: *grade,
            completed_at: now,
        });
        graded_students.push(student_id.clone());
    }

    if !errors.is_empty() {
        metrics::counter!("grading_requests_total", "outcome" => "rejected").increment(1);
        return Err(WorkflowError::Rejected(errors));
    }

    let updated = store.complete_enrollments(batch).await.map_err(|error| {
        metrics::counter!("grading_requests_total", "outcome" => "conflict").increment(1);
        write_failure(error, &graded_students)
    })?;

    metrics::counter!("grading_requests_total", "outcome" => "graded").increment(1);
    metrics::counter!("enrollments_completed_total").increment(updated.len() as u64);
    tracing::info!(
        professor_id = %professor.id,
        subject_id = %subject.id,
        graded = updated.len(),
        action = "grade_subject",
        "Subject graded"
    );

    Ok(updated)
}

fn write_failure(error: BatchWriteError, graded_students: &[String]) -> WorkflowError {
    match error.index.and_then(|index| graded_students.get(index)) {
        Some(student_id) => WorkflowError::Rejected(vec![ItemError::Conflict(format!(
            "Enrollment for student {student_id} is no longer active"
        ))]),
        None => WorkflowError::Store(error.source),
    }
}
