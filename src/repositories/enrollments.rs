use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::db::models::{Enrollment, RosterEntry, PASSING_GRADE};
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "\
    id, student_id, subject_id, professor_id, status, grade, attendance, \
    date_enrolled, date_completed, is_completed, period, notes";

#[derive(Debug, Clone)]
pub(crate) struct NewEnrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) subject_id: String,
    pub(crate) professor_id: String,
    pub(crate) period: String,
    pub(crate) date_enrolled: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub(crate) struct EnrollmentCompletion {
    pub(crate) enrollment_id: String,
    pub(crate) grade: f64,
    pub(crate) completed_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnrollmentFilter {
    All,
    Active,
    Completed,
    Approved,
    Failed,
}

#[derive(Debug, Error)]
pub(crate) enum EnrollmentWriteError {
    #[error("batch item {index} rejected by the database: {source}")]
    Item {
        index: usize,
        #[source]
        source: sqlx::Error,
    },
    #[error("batch item {index} is no longer active")]
    NotActive { index: usize },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) async fn has_passed(
    pool: &PgPool,
    student_id: &str,
    subject_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM enrollments
            WHERE student_id = $1 AND subject_id = $2 AND is_completed AND grade >= $3
         )",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(PASSING_GRADE)
    .fetch_one(pool)
    .await
}

pub(crate) async fn exists_in_period(
    pool: &PgPool,
    student_id: &str,
    subject_id: &str,
    period: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM enrollments
            WHERE student_id = $1 AND subject_id = $2 AND period = $3
         )",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(period)
    .fetch_one(pool)
    .await
}

/// Inserts every enrollment of the batch or none of them.
pub(crate) async fn create_batch(
    pool: &PgPool,
    batch: &[NewEnrollment],
) -> Result<Vec<Enrollment>, EnrollmentWriteError> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(batch.len());

    for (index, params) in batch.iter().enumerate() {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO enrollments (
                id, student_id, subject_id, professor_id, status, attendance,
                date_enrolled, is_completed, period, notes
             ) VALUES ($1,$2,$3,$4,$5,0.0,$6,FALSE,$7,'')
             RETURNING {COLUMNS}",
        ))
        .bind(&params.id)
        .bind(&params.student_id)
        .bind(&params.subject_id)
        .bind(&params.professor_id)
        .bind(EnrollmentStatus::Active)
        .bind(params.date_enrolled)
        .bind(&params.period)
        .fetch_one(&mut *tx)
        .await
        .map_err(|source| EnrollmentWriteError::Item { index, source })?;
        created.push(enrollment);
    }

    tx.commit().await?;
    Ok(created)
}

pub(crate) async fn find_active_by_student_code(
    pool: &PgPool,
    subject_id: &str,
    student_code: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT e.id, e.student_id, e.subject_id, e.professor_id, e.status, e.grade,
                e.attendance, e.date_enrolled, e.date_completed, e.is_completed,
                e.period, e.notes
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         WHERE e.subject_id = $1 AND s.student_code = $2 AND e.status = $3
         ORDER BY e.date_enrolled DESC
         LIMIT 1",
    )
    .bind(subject_id)
    .bind(student_code)
    .bind(EnrollmentStatus::Active)
    .fetch_optional(pool)
    .await
}

/// Completes every enrollment of the batch or none of them. Rows that left
/// the active state since they were read abort the batch.
pub(crate) async fn complete_batch(
    pool: &PgPool,
    batch: &[EnrollmentCompletion],
) -> Result<Vec<Enrollment>, EnrollmentWriteError> {
    let mut tx = pool.begin().await?;
    let mut updated = Vec::with_capacity(batch.len());

    for (index, params) in batch.iter().enumerate() {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "UPDATE enrollments SET
                grade = $1,
                is_completed = TRUE,
                status = $2,
                date_completed = COALESCE(date_completed, $3)
             WHERE id = $4 AND status = $5
             RETURNING {COLUMNS}",
        ))
        .bind(params.grade)
        .bind(EnrollmentStatus::Completed)
        .bind(params.completed_at)
        .bind(&params.enrollment_id)
        .bind(EnrollmentStatus::Active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|source| EnrollmentWriteError::Item { index, source })?;

        let Some(enrollment) = enrollment else {
            return Err(EnrollmentWriteError::NotActive { index });
        };
        updated.push(enrollment);
    }

    tx.commit().await?;
    Ok(updated)
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
    filter: EnrollmentFilter,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = "
    ));
    builder.push_bind(student_id);

    match filter {
        EnrollmentFilter::All => {}
        EnrollmentFilter::Active => {
            builder.push(" AND status = ");
            builder.push_bind(EnrollmentStatus::Active);
        }
        EnrollmentFilter::Completed => {
            builder.push(" AND is_completed AND grade IS NOT NULL");
        }
        EnrollmentFilter::Approved => {
            builder.push(" AND is_completed AND grade >= ");
            builder.push_bind(PASSING_GRADE);
        }
        EnrollmentFilter::Failed => {
            builder.push(" AND is_completed AND grade < ");
            builder.push_bind(PASSING_GRADE);
        }
    }

    builder.push(" ORDER BY date_enrolled DESC");

    builder.build_query_as::<Enrollment>().fetch_all(pool).await
}

pub(crate) async fn roster_for_subject(
    pool: &PgPool,
    subject_id: &str,
    active_only: bool,
) -> Result<Vec<RosterEntry>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT e.id AS enrollment_id,
                s.student_code,
                a.full_name,
                e.grade,
                e.status,
                e.date_completed
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         JOIN accounts a ON a.id = s.account_id
         WHERE e.subject_id = ",
    );
    builder.push_bind(subject_id);

    if active_only {
        builder.push(" AND e.status = ");
        builder.push_bind(EnrollmentStatus::Active);
    }

    builder.push(" ORDER BY e.date_enrolled DESC");

    builder.build_query_as::<RosterEntry>().fetch_all(pool).await
}
