use crate::db::models::{Student, Subject};
use crate::services::store::{Store, StoreError};
use crate::services::ItemError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Eligibility {
    pub(crate) reasons: Vec<ItemError>,
}

impl Eligibility {
    pub(crate) fn is_eligible(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Collects every reason the student may not enroll in `subject` for `period`.
///
/// Only direct prerequisites are inspected, so cycles in the prerequisite
/// data cannot cause unbounded work.
pub(crate) async fn can_enroll(
    store: &dyn Store,
    student: &Student,
    subject: &Subject,
    period: &str,
) -> Result<Eligibility, StoreError> {
    let mut reasons = Vec::new();

    for prerequisite in store.list_prerequisites(&subject.id).await? {
        if !store.has_passed(&student.id, &prerequisite.id).await? {
            reasons.push(ItemError::Validation(format!(
                "Prerequisite {} not met for {}",
                prerequisite.name, subject.name
            )));
        }
    }

    if store.is_enrolled_in_period(&student.id, &subject.id, period).await? {
        reasons.push(already_enrolled(subject));
    }

    Ok(Eligibility { reasons })
}

pub(crate) fn already_enrolled(subject: &Subject) -> ItemError {
    ItemError::Conflict(format!("Already enrolled in {}", subject.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;
    use crate::test_support::{seed_grade, seed_professor, seed_student, seed_subject};

    #[tokio::test]
    async fn missing_prerequisite_is_reported() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let calc1 = seed_subject(&store, "MAT101", "Calculus I", Some(&professor), &[]).await;
        let calc2 =
            seed_subject(&store, "MAT102", "Calculus II", Some(&professor), &[&calc1]).await;

        let eligibility = can_enroll(&store, &student, &calc2, "2025-1").await.unwrap();

        assert!(!eligibility.is_eligible());
        assert_eq!(
            eligibility.reasons,
            vec![ItemError::Validation("Prerequisite Calculus I not met for Calculus II".into())]
        );
    }

    #[tokio::test]
    async fn failed_prerequisite_does_not_count() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let calc1 = seed_subject(&store, "MAT101", "Calculus I", Some(&professor), &[]).await;
        let calc2 =
            seed_subject(&store, "MAT102", "Calculus II", Some(&professor), &[&calc1]).await;
        seed_grade(&store, &student, &calc1, "2024-2", 2.9).await;

        let eligibility = can_enroll(&store, &student, &calc2, "2025-1").await.unwrap();
        assert!(!eligibility.is_eligible());

        seed_grade(&store, &student, &calc1, "2025-1", 3.0).await;
        let eligibility = can_enroll(&store, &student, &calc2, "2025-2").await.unwrap();
        assert!(eligibility.is_eligible());
    }

    #[tokio::test]
    async fn existing_enrollment_in_period_blocks_only_that_period() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let physics = seed_subject(&store, "FIS101", "Physics I", Some(&professor), &[]).await;
        seed_grade(&store, &student, &physics, "2024-2", 1.5).await;

        let same = can_enroll(&store, &student, &physics, "2024-2").await.unwrap();
        assert_eq!(same.reasons, vec![ItemError::Conflict("Already enrolled in Physics I".into())]);

        let next = can_enroll(&store, &student, &physics, "2025-1").await.unwrap();
        assert!(next.is_eligible());
    }

    #[tokio::test]
    async fn prerequisite_cycle_terminates() {
        let store = MemoryStore::new();
        let (_, professor) = seed_professor(&store, "P001", "Ada Lovelace").await;
        let (_, student) = seed_student(&store, "S001", "Ana Perez").await;
        let a = seed_subject(&store, "A100", "Algebra", Some(&professor), &[]).await;
        let b = seed_subject(&store, "B100", "Geometry", Some(&professor), &[&a]).await;
        store
            .update_subject(
                &a.id,
                crate::repositories::subjects::SubjectChanges {
                    prerequisite_ids: Some(vec![b.id.clone()]),
                    ..crate::test_support::no_subject_changes()
                },
            )
            .await
            .unwrap();

        let eligibility = can_enroll(&store, &student, &a, "2025-1").await.unwrap();
        assert_eq!(eligibility.reasons.len(), 1);
    }
}
