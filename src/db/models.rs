use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::EnrollmentStatus;

/// Lowest grade that counts as a pass on the 0.0-5.0 scale.
pub(crate) const PASSING_GRADE: f64 = 3.0;
pub(crate) const MIN_GRADE: f64 = 0.0;
pub(crate) const MAX_GRADE: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Account {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_admin: bool,
    pub(crate) date_joined: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) student_code: String,
    pub(crate) career: String,
    pub(crate) semester: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Professor {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) professor_code: String,
    pub(crate) department: String,
    pub(crate) title: String,
    pub(crate) specialization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) credits: i32,
    pub(crate) professor_id: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) semester_number: Option<i32>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Subject {
    pub(crate) fn is_taught_by(&self, professor: &Professor) -> bool {
        self.professor_id.as_deref() == Some(professor.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) professor_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) grade: Option<f64>,
    pub(crate) attendance: f64,
    pub(crate) date_enrolled: PrimitiveDateTime,
    pub(crate) date_completed: Option<PrimitiveDateTime>,
    pub(crate) is_completed: bool,
    pub(crate) period: String,
    pub(crate) notes: String,
}

impl Enrollment {
    /// Approval is derived from the grade, never stored.
    pub(crate) fn is_approved(&self) -> bool {
        self.grade.is_some_and(|grade| grade >= PASSING_GRADE)
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.is_completed && self.grade.is_some_and(|grade| grade < PASSING_GRADE)
    }
}

/// Roster row: an enrollment joined with the enrolled student's identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct RosterEntry {
    pub(crate) enrollment_id: String,
    pub(crate) student_code: String,
    pub(crate) full_name: String,
    pub(crate) grade: Option<f64>,
    pub(crate) status: EnrollmentStatus,
    pub(crate) date_completed: Option<PrimitiveDateTime>,
}

/// The single profile an account owns.
#[derive(Debug, Clone)]
pub(crate) enum AccountProfile {
    Student(Student),
    Professor(Professor),
}
