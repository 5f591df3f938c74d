use sqlx::{PgConnection, PgPool};

use crate::db::models::{Account, AccountProfile};
use crate::repositories::{professors, professors::NewProfessor, students, students::NewStudent};

const COLUMNS: &str = "id, email, full_name, is_active, is_admin, date_joined, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct NewAccount {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_admin: bool,
    pub(crate) date_joined: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
pub(crate) enum NewProfile {
    Student(NewStudent),
    Professor(NewProfessor),
}

#[derive(Debug, Clone)]
pub(crate) struct AccountChanges {
    pub(crate) full_name: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE lower(email) = lower($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Inserts the account and its profile in one transaction.
pub(crate) async fn create_with_profile(
    pool: &PgPool,
    params: &NewAccount,
    profile: Option<&NewProfile>,
) -> Result<(Account, Option<AccountProfile>), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let account = create(&mut tx, params).await?;
    let profile = match profile {
        Some(NewProfile::Student(student)) => {
            Some(AccountProfile::Student(students::create(&mut tx, student).await?))
        }
        Some(NewProfile::Professor(professor)) => {
            Some(AccountProfile::Professor(professors::create(&mut tx, professor).await?))
        }
        None => None,
    };

    tx.commit().await?;
    Ok((account, profile))
}

async fn create(conn: &mut PgConnection, params: &NewAccount) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (id, email, full_name, is_active, is_admin, date_joined, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(&params.id)
    .bind(&params.email)
    .bind(&params.full_name)
    .bind(params.is_active)
    .bind(params.is_admin)
    .bind(params.date_joined)
    .fetch_one(conn)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: &AccountChanges,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "UPDATE accounts SET
            full_name = COALESCE($1, full_name),
            is_active = COALESCE($2, is_active),
            updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(params.full_name.as_deref())
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

