use sqlx::{PgConnection, PgPool};

use crate::db::models::Student;

const COLUMNS: &str = "id, account_id, student_code, career, semester";

#[derive(Debug, Clone)]
pub(crate) struct NewStudent {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) student_code: String,
    pub(crate) career: String,
    pub(crate) semester: i32,
}

pub(crate) async fn create(
    conn: &mut PgConnection,
    params: &NewStudent,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (id, account_id, student_code, career, semester)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(&params.id)
    .bind(&params.account_id)
    .bind(&params.student_code)
    .bind(&params.career)
    .bind(params.semester)
    .fetch_one(conn)
    .await
}

pub(crate) async fn find_by_account(
    pool: &PgPool,
    account_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE account_id = $1"))
        .bind(account_id)
        .fetch_optional(pool)
        .await
}
