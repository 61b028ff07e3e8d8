// ============================================================================
// InkBook Infrastructure - PostgreSQL User Repository
// File: crates/inkbook-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use inkbook_core::domain::{User, UserFilter, UserType};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::UserRepository;
use inkbook_shared::Pagination;

use super::{db_error, escape_like, offset_param, sqlstate, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};

const USER_COLUMNS: &str =
    "id, email, name, phone, avatar, user_type, password_hash, email_verified_at, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_type) = filter.user_type {
        qb.push(" AND user_type = ").push_bind(user_type.as_str());
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub user_type: String,
    pub password_hash: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            avatar: row.avatar,
            user_type: UserType::from_str(&row.user_type).unwrap_or_default(),
            password_hash: row.password_hash,
            email_verified_at: row.email_verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding user by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let row: Option<UserRow> = sqlx::query_as(&sql)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("finding user by email", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        info!("Creating user {}", user.id);

        let sql = format!(
            r#"
            INSERT INTO users ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row: UserRow = sqlx::query_as(&sql)
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.avatar)
        .bind(user.user_type.as_str())
        .bind(&user.password_hash)
        .bind(user.email_verified_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                DomainError::EmailAlreadyExists(user.email.clone())
            } else {
                db_error("creating user", e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_all(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError> {
        let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(offset_param(pagination.offset())?);

        let rows: Vec<UserRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing users", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filter(&mut qb, filter);

        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting users", e))?;

        Ok(total.max(0) as u64)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, phone = $3, avatar = $4, password_hash = $5,
                email_verified_at = $6, updated_at = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.avatar)
            .bind(&user.password_hash)
            .bind(user.email_verified_at)
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("updating user", e))?;

        row.map(Into::into).ok_or(DomainError::UserNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if sqlstate(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    warn!("Refused to delete user {} with studios or bookings", id);
                    DomainError::UserInUse(id)
                } else {
                    db_error("deleting user", e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound);
        }
        Ok(())
    }
}
