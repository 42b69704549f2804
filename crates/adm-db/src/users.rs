//! User repository
//!
//! Database operations for users. Every read joins the user's role so
//! callers get the role summary without a second query.

use adm_core::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::repository::{
    unique_violation, PagedRepository, Repository, RepositoryError, RepositoryResult,
};

/// User status constants
pub mod status {
    pub const DISABLED: i32 = 0;
    pub const ENABLED: i32 = 1;

    pub fn is_valid(status: i32) -> bool {
        status == DISABLED || status == ENABLED
    }
}

/// User database entity
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Id,
    pub username: String,
    /// Password hash
    pub password: String,
    pub realname: String,
    pub email: String,
    pub status: i32,
    pub role_id: Option<Id>,
    pub role_name: Option<String>,
    pub role_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn is_enabled(&self) -> bool {
        self.status == status::ENABLED
    }
}

/// DTO for creating a user
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub password_hash: String,
    pub realname: String,
    pub email: String,
    pub status: i32,
    pub role_id: Option<Id>,
}

/// DTO for updating a user
///
/// `role_id: Some(None)` detaches the role, `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub realname: Option<String>,
    pub email: Option<String>,
    pub status: Option<i32>,
    pub role_id: Option<Option<Id>>,
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.password, u.realname, u.email, u.status, u.role_id,
           r.name AS role_name, r.code AS role_code, u.created_at, u.updated_at
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
"#;

const USERNAME_TAKEN: &str = "Username has already been taken";

/// User repository implementation
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserRow>> {
        let sql = format!("{SELECT_USER} WHERE u.username = ?1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Check if username is unique
    pub async fn is_username_unique(
        &self,
        username: &str,
        exclude_id: Option<Id>,
    ) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count == 0)
    }

    /// Check that a role id points at an existing role
    pub async fn role_exists(&self, role_id: Id) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = ?1")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn fetch(&self, id: Id) -> RepositoryResult<UserRow> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("User with id {} not found", id)))
    }
}

#[async_trait]
impl Repository<UserRow, CreateUserDto, UpdateUserDto> for UserRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<UserRow>> {
        let sql = format!("{SELECT_USER} WHERE u.id = ?1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn create(&self, dto: CreateUserDto) -> RepositoryResult<UserRow> {
        if !self.is_username_unique(&dto.username, None).await? {
            return Err(RepositoryError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let id = sqlx::query_scalar::<_, Id>(
            r#"
            INSERT INTO users (
                username, password, realname, email, status, role_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7
            )
            RETURNING id
            "#,
        )
        .bind(&dto.username)
        .bind(&dto.password_hash)
        .bind(&dto.realname)
        .bind(&dto.email)
        .bind(dto.status)
        .bind(dto.role_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, USERNAME_TAKEN))?;

        self.fetch(id).await
    }

    async fn update(&self, id: Id, dto: UpdateUserDto) -> RepositoryResult<UserRow> {
        if let Some(ref username) = dto.username {
            if !self.is_username_unique(username, Some(id)).await? {
                return Err(RepositoryError::Conflict(USERNAME_TAKEN.to_string()));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?1, username),
                password = COALESCE(?2, password),
                realname = COALESCE(?3, realname),
                email = COALESCE(?4, email),
                status = COALESCE(?5, status),
                role_id = CASE WHEN ?6 THEN ?7 ELSE role_id END,
                updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(&dto.username)
        .bind(&dto.password_hash)
        .bind(&dto.realname)
        .bind(&dto.email)
        .bind(dto.status)
        .bind(dto.role_id.is_some())
        .bind(dto.role_id.flatten())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, USERNAME_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "User with id {} not found",
                id
            )));
        }

        self.fetch(id).await
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "User with id {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl PagedRepository<UserRow> for UserRepository {
    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<UserRow>> {
        let sql = format!("{SELECT_USER} ORDER BY u.id ASC LIMIT ?1 OFFSET ?2");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
