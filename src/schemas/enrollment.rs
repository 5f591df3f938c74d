use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Enrollment, RosterEntry};
use crate::db::types::EnrollmentStatus;
use crate::services::grading::GradeItem;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EnrollmentRequest {
    #[serde(default, alias = "subjectIds")]
    #[validate(length(max = 50, message = "at most 50 subjects per request"))]
    pub(crate) subject_ids: Vec<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "period must be 1-20 characters"))]
    pub(crate) period: String,
}

/// Grade items stay raw JSON so one malformed entry is reported next to the
/// others instead of rejecting the whole body.
#[derive(Debug, Deserialize)]
pub(crate) struct GradeSubmission {
    #[serde(default)]
    pub(crate) grades: Vec<Value>,
}

impl GradeSubmission {
    pub(crate) fn items(&self) -> Vec<GradeItem> {
        self.grades.iter().map(parse_grade_item).collect()
    }
}

fn parse_grade_item(value: &Value) -> GradeItem {
    let student_id = value
        .get("student_id")
        .or_else(|| value.get("studentId"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let grade = match value.get("grade") {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };

    match (student_id, grade) {
        (Some(student_id), Some(grade)) if grade.is_finite() => {
            GradeItem::Entry { student_id: student_id.to_string(), grade }
        }
        _ => GradeItem::Malformed,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) professor_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) grade: Option<f64>,
    pub(crate) attendance: f64,
    pub(crate) date_enrolled: String,
    pub(crate) date_completed: Option<String>,
    pub(crate) is_completed: bool,
    pub(crate) is_approved: bool,
    pub(crate) period: String,
    pub(crate) notes: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        let is_approved = enrollment.is_approved();
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            subject_id: enrollment.subject_id,
            professor_id: enrollment.professor_id,
            status: enrollment.status,
            grade: enrollment.grade,
            attendance: enrollment.attendance,
            date_enrolled: format_primitive(enrollment.date_enrolled),
            date_completed: enrollment.date_completed.map(format_primitive),
            is_completed: enrollment.is_completed,
            is_approved,
            period: enrollment.period,
            notes: enrollment.notes,
        }
    }

    pub(crate) fn from_many(enrollments: Vec<Enrollment>) -> Vec<Self> {
        enrollments.into_iter().map(Self::from_db).collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ApprovedSubjectsResponse {
    pub(crate) subjects: Vec<EnrollmentResponse>,
    pub(crate) average: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterEntryResponse {
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) grade: Option<f64>,
    pub(crate) status: EnrollmentStatus,
}

impl RosterEntryResponse {
    pub(crate) fn from_db(entry: RosterEntry) -> Self {
        Self {
            student_id: entry.student_code,
            name: entry.full_name,
            grade: entry.grade,
            status: entry.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeSheetEntryResponse {
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) grade: Option<f64>,
    pub(crate) status: EnrollmentStatus,
    pub(crate) date_completed: Option<String>,
}

impl GradeSheetEntryResponse {
    pub(crate) fn from_db(entry: RosterEntry) -> Self {
        Self {
            student_id: entry.student_code,
            name: entry.full_name,
            grade: entry.grade,
            status: entry.status,
            date_completed: entry.date_completed.map(format_primitive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grade_items_are_parsed_leniently() {
        let submission: GradeSubmission = serde_json::from_value(json!({
            "grades": [
                {"student_id": "S001", "grade": 4.2},
                {"student_id": "S002", "grade": "3.5"},
                {"student_id": "S003"},
                {"grade": 4.0},
                "S004",
                {"student_id": 12, "grade": 3.0}
            ]
        }))
        .unwrap();

        assert_eq!(
            submission.items(),
            vec![
                GradeItem::Entry { student_id: "S001".into(), grade: 4.2 },
                GradeItem::Entry { student_id: "S002".into(), grade: 3.5 },
                GradeItem::Malformed,
                GradeItem::Malformed,
                GradeItem::Malformed,
                GradeItem::Malformed,
            ]
        );
    }
}
