use sqlx::{PgConnection, PgPool};

use crate::db::models::Professor;

const COLUMNS: &str = "id, account_id, professor_code, department, title, specialization";

#[derive(Debug, Clone)]
pub(crate) struct NewProfessor {
    pub(crate) id: String,
    pub(crate) account_id: String,
    pub(crate) professor_code: String,
    pub(crate) department: String,
    pub(crate) title: String,
    pub(crate) specialization: String,
}

pub(crate) async fn create(
    conn: &mut PgConnection,
    params: &NewProfessor,
) -> Result<Professor, sqlx::Error> {
    sqlx::query_as::<_, Professor>(&format!(
        "INSERT INTO professors (id, account_id, professor_code, department, title, specialization)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(&params.id)
    .bind(&params.account_id)
    .bind(&params.professor_code)
    .bind(&params.department)
    .bind(&params.title)
    .bind(&params.specialization)
    .fetch_one(conn)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Professor>, sqlx::Error> {
    sqlx::query_as::<_, Professor>(&format!("SELECT {COLUMNS} FROM professors WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_account(
    pool: &PgPool,
    account_id: &str,
) -> Result<Option<Professor>, sqlx::Error> {
    sqlx::query_as::<_, Professor>(&format!(
        "SELECT {COLUMNS} FROM professors WHERE account_id = $1"
    ))
    .bind(account_id)
    .fetch_optional(pool)
    .await
}
