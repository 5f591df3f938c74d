use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Subject;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, max = 20, message = "code must be 1-20 characters"))]
    pub(crate) code: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[validate(range(min = 1, message = "credits must be at least 1"))]
    pub(crate) credits: i32,
    #[serde(default, alias = "professorId")]
    pub(crate) professor_id: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default, alias = "semesterNumber")]
    #[validate(range(min = 1, max = 12, message = "semester_number must be between 1 and 12"))]
    pub(crate) semester_number: Option<i32>,
    #[serde(default = "default_true", alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(default, alias = "prerequisiteIds")]
    pub(crate) prerequisite_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "credits must be at least 1"))]
    pub(crate) credits: Option<i32>,
    #[serde(default, alias = "professorId")]
    pub(crate) professor_id: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default, alias = "semesterNumber")]
    #[validate(range(min = 1, max = 12, message = "semester_number must be between 1 and 12"))]
    pub(crate) semester_number: Option<i32>,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default, alias = "prerequisiteIds")]
    pub(crate) prerequisite_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectListQuery {
    #[serde(default)]
    pub(crate) professor_id: Option<String>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) credits: i32,
    pub(crate) professor_id: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) semester_number: Option<i32>,
    pub(crate) is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) prerequisite_ids: Option<Vec<String>>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: Subject) -> Self {
        Self {
            id: subject.id,
            code: subject.code,
            name: subject.name,
            description: subject.description,
            credits: subject.credits,
            professor_id: subject.professor_id,
            department: subject.department,
            semester_number: subject.semester_number,
            is_active: subject.is_active,
            prerequisite_ids: None,
            created_at: format_primitive(subject.created_at),
            updated_at: format_primitive(subject.updated_at),
        }
    }

    pub(crate) fn with_prerequisites(mut self, prerequisites: Vec<Subject>) -> Self {
        self.prerequisite_ids =
            Some(prerequisites.into_iter().map(|prerequisite| prerequisite.id).collect());
        self
    }
}
