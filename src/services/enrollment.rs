use std::collections::HashSet;

use time::PrimitiveDateTime;

use crate::db::models::{Enrollment, Student, Subject};
use crate::repositories::enrollments::NewEnrollment;
use crate::services::eligibility::{already_enrolled, can_enroll};
use crate::services::store::{BatchWriteError, Store, StoreError};
use crate::services::{ItemError, WorkflowError};

/// Enrolls `student` in every subject of `subject_ids` for `period`.
///
/// Every id is evaluated and all problems are collected. The batch is written
/// only when no item failed; otherwise nothing is persisted and the collected
/// errors are returned in request order.
pub(crate) async fn enroll(
    store: &dyn Store,
    student: &Student,
    subject_ids: &[String],
    period: &str,
    now: PrimitiveDateTime,
) -> Result<Vec<Enrollment>, WorkflowError> {
    if subject_ids.is_empty() {
        return Err(WorkflowError::InvalidRequest("No subject IDs provided".to_string()));
    }

    let mut errors = Vec::new();
    let mut accepted: Vec<Subject> = Vec::new();
    let mut batch = Vec::new();
    let mut seen = HashSet::new();

    for subject_id in subject_ids {
        let Some(subject) = store.find_subject(subject_id).await? else {
            let message = format!("Subject with ID {subject_id} does not exist");
            errors.push(ItemError::NotFound(message));
            continue;
        };

        let mut reasons = can_enroll(store, student, &subject, period).await?.reasons;
        let duplicate = already_enrolled(&subject);
        if !seen.insert(subject.id.clone()) && !reasons.contains(&duplicate) {
            reasons.push(duplicate);
        }

        let Some(professor_id) = subject.professor_id.clone() else {
            reasons.push(ItemError::Validation(format!(
                "Subject {} has no assigned professor",
                subject.name
            )));
            errors.extend(reasons);
            continue;
        };

        if !reasons.is_empty() {
            errors.extend(reasons);
            continue;
        }

        batch.push(NewEnrollment {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student.id.clone(),
            subject_id: subject.id.clone(),
            professor_id,
            period: period.to_string(),
            date_enrolled: now,
        });
        accepted.push(subject);
    }

    if !errors.is_empty() {
        metrics::counter!("enrollment_requests_total", "outcome" => "rejected").increment(1);
        return Err(WorkflowError::Rejected(errors));
    }

    let created = store.create_enrollments(batch).await.map_err(|error| {
        metrics::counter!("enrollment_requests_total", "outcome" => "conflict").increment(1);
        write_failure(error, &accepted)
    })?;

    metrics::counter!("enrollment_requests_total", "outcome" => "created").increment(1);
    metrics::counter!("enrollments_created_total").increment(created.len() as u64);
    tracing::info!(
        student_id = %student.id,
        period = %period,
        created = created.len(),
        action = "enroll",
        "Student enrolled"
    );

    Ok(created)
}

fn write_failure(error: BatchWriteError, accepted: &[Subject]) -> WorkflowError {
    let subject = error.index.and_then(|index| accepted.get(index));
    match (subject, error.source) {
        (Some(subject), StoreError::Conflict(_)) => {
            WorkflowError::Rejected(vec![already_enrolled(subject)])
        }
        (Some(subject), StoreError::MissingReference(_)) => WorkflowError::Rejected(vec![
            ItemError::NotFound(format!("Subject with ID {} does not exist", subject.id)),
        ]),
        (_, source) => WorkflowError::Store(source),
    }
}
