use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::db::models::Subject;

const COLUMNS: &str = "\
    id, code, name, description, credits, professor_id, department, \
    semester_number, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct NewSubject {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) credits: i32,
    pub(crate) professor_id: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) semester_number: Option<i32>,
    pub(crate) is_active: bool,
    pub(crate) prerequisite_ids: Vec<String>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone)]
pub(crate) struct SubjectChanges {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) credits: Option<i32>,
    pub(crate) professor_id: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) semester_number: Option<i32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) prerequisite_ids: Option<Vec<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SubjectFilter {
    pub(crate) professor_id: Option<String>,
    pub(crate) is_active: Option<bool>,
}

pub(crate) async fn create(pool: &PgPool, params: &NewSubject) -> Result<Subject, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let subject = sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (
            id, code, name, description, credits, professor_id, department,
            semester_number, is_active, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(&params.id)
    .bind(&params.code)
    .bind(&params.name)
    .bind(params.description.as_deref())
    .bind(params.credits)
    .bind(params.professor_id.as_deref())
    .bind(params.department.as_deref())
    .bind(params.semester_number)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    insert_prerequisites(&mut tx, &subject.id, &params.prerequisite_ids).await?;

    tx.commit().await?;
    Ok(subject)
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &SubjectFilter,
) -> Result<Vec<Subject>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM subjects"));
    let mut has_where = false;

    if let Some(professor_id) = filter.professor_id.as_ref() {
        builder.push(" WHERE professor_id = ");
        builder.push_bind(professor_id);
        has_where = true;
    }
    if let Some(is_active) = filter.is_active {
        builder.push(if has_where { " AND " } else { " WHERE " });
        builder.push("is_active = ");
        builder.push_bind(is_active);
    }

    builder.push(" ORDER BY semester_number NULLS LAST, name");

    builder.build_query_as::<Subject>().fetch_all(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: &SubjectChanges,
) -> Result<Option<Subject>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let subject = sqlx::query_as::<_, Subject>(&format!(
        "UPDATE subjects SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            credits = COALESCE($3, credits),
            professor_id = COALESCE($4, professor_id),
            department = COALESCE($5, department),
            semester_number = COALESCE($6, semester_number),
            is_active = COALESCE($7, is_active),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(params.name.as_deref())
    .bind(params.description.as_deref())
    .bind(params.credits)
    .bind(params.professor_id.as_deref())
    .bind(params.department.as_deref())
    .bind(params.semester_number)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(subject) = subject else {
        return Ok(None);
    };

    if let Some(prerequisite_ids) = params.prerequisite_ids.as_ref() {
        sqlx::query("DELETE FROM subject_prerequisites WHERE subject_id = $1")
            .bind(&subject.id)
            .execute(&mut *tx)
            .await?;
        insert_prerequisites(&mut tx, &subject.id, prerequisite_ids).await?;
    }

    tx.commit().await?;
    Ok(Some(subject))
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Direct prerequisites only; the graph is never walked transitively.
pub(crate) async fn list_prerequisites(
    pool: &PgPool,
    subject_id: &str,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(
        "SELECT s.id, s.code, s.name, s.description, s.credits, s.professor_id, s.department,
                s.semester_number, s.is_active, s.created_at, s.updated_at
         FROM subject_prerequisites sp
         JOIN subjects s ON s.id = sp.prerequisite_id
         WHERE sp.subject_id = $1
         ORDER BY s.semester_number NULLS LAST, s.name",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

async fn insert_prerequisites(
    conn: &mut PgConnection,
    subject_id: &str,
    prerequisite_ids: &[String],
) -> Result<(), sqlx::Error> {
    for prerequisite_id in prerequisite_ids {
        sqlx::query(
            "INSERT INTO subject_prerequisites (subject_id, prerequisite_id)
             VALUES ($1, $2)
             ON CONFLICT (subject_id, prerequisite_id) DO NOTHING",
        )
        .bind(subject_id)
        .bind(prerequisite_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
