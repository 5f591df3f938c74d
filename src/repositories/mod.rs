pub(crate) mod accounts;
pub(crate) mod enrollments;
pub(crate) mod health;
pub(crate) mod professors;
pub(crate) mod students;
pub(crate) mod subjects;
