use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Account, AccountProfile, Professor, Student};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentProfileCreate {
    #[serde(alias = "studentCode")]
    #[validate(length(min = 1, max = 20, message = "student_code must be 1-20 characters"))]
    pub(crate) student_code: String,
    #[validate(length(min = 1, max = 100, message = "career must be 1-100 characters"))]
    pub(crate) career: String,
    #[validate(range(min = 1, max = 12, message = "semester must be between 1 and 12"))]
    pub(crate) semester: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfessorProfileCreate {
    #[serde(alias = "professorCode")]
    #[validate(length(min = 1, max = 20, message = "professor_code must be 1-20 characters"))]
    pub(crate) professor_code: String,
    #[validate(length(min = 1, max = 100, message = "department must be 1-100 characters"))]
    pub(crate) department: String,
    #[validate(length(min = 1, max = 50, message = "title must be 1-50 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "specialization must be at most 200 characters"))]
    pub(crate) specialization: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AccountCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, max = 255, message = "full_name must be 1-255 characters"))]
    pub(crate) full_name: String,
    #[serde(default, alias = "isAdmin")]
    pub(crate) is_admin: bool,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) student: Option<StudentProfileCreate>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) professor: Option<ProfessorProfileCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AccountUpdate {
    #[serde(default, alias = "fullName")]
    #[validate(length(min = 1, max = 255, message = "full_name must be 1-255 characters"))]
    pub(crate) full_name: Option<String>,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentProfileResponse {
    pub(crate) id: String,
    pub(crate) student_code: String,
    pub(crate) career: String,
    pub(crate) semester: i32,
}

impl StudentProfileResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            id: student.id,
            student_code: student.student_code,
            career: student.career,
            semester: student.semester,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfessorProfileResponse {
    pub(crate) id: String,
    pub(crate) professor_code: String,
    pub(crate) department: String,
    pub(crate) title: String,
    pub(crate) specialization: String,
}

impl ProfessorProfileResponse {
    pub(crate) fn from_db(professor: Professor) -> Self {
        Self {
            id: professor.id,
            professor_code: professor.professor_code,
            department: professor.department,
            title: professor.title,
            specialization: professor.specialization,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AccountResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_admin: bool,
    pub(crate) date_joined: String,
    pub(crate) student: Option<StudentProfileResponse>,
    pub(crate) professor: Option<ProfessorProfileResponse>,
}

impl AccountResponse {
    pub(crate) fn from_db(account: Account, profile: Option<AccountProfile>) -> Self {
        let (student, professor) = match profile {
            Some(AccountProfile::Student(student)) => {
                (Some(StudentProfileResponse::from_db(student)), None)
            }
            Some(AccountProfile::Professor(professor)) => {
                (None, Some(ProfessorProfileResponse::from_db(professor)))
            }
            None => (None, None),
        };

        Self {
            id: account.id,
            email: account.email,
            full_name: account.full_name,
            is_active: account.is_active,
            is_admin: account.is_admin,
            date_joined: format_primitive(account.date_joined),
            student,
            professor,
        }
    }
}
