//! Permission repository
//!
//! Database operations for permissions.

use adm_core::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::repository::{unique_violation, Repository, RepositoryError, RepositoryResult};

/// Permission type constants
pub mod kind {
    pub const MENU: i32 = 1;
    pub const FUNCTION: i32 = 2;
    pub const BUTTON: i32 = 3;

    pub fn is_valid(kind: i32) -> bool {
        (MENU..=BUTTON).contains(&kind)
    }
}

/// Permission database entity
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct PermissionRow {
    pub id: Id,
    pub name: String,
    pub code: String,
    /// Code of the parent permission, empty for roots
    pub parent_code: String,
    pub path: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: i32,
    pub sort: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a permission
#[derive(Debug, Clone)]
pub struct CreatePermissionDto {
    pub name: String,
    pub code: String,
    pub parent_code: String,
    pub path: String,
    pub kind: i32,
    pub sort: i32,
    pub description: String,
}

/// DTO for updating a permission
#[derive(Debug, Clone, Default)]
pub struct UpdatePermissionDto {
    pub name: Option<String>,
    pub code: Option<String>,
    pub parent_code: Option<String>,
    pub path: Option<String>,
    pub kind: Option<i32>,
    pub sort: Option<i32>,
    pub description: Option<String>,
}

const CODE_TAKEN: &str = "Permission code has already been taken";

/// Permission repository implementation
pub struct PermissionRepository {
    pool: SqlitePool,
}

impl PermissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All permissions ordered by type, sort, id
    pub async fn find_all_ordered(&self) -> RepositoryResult<Vec<PermissionRow>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, code, parent_code, path, type, sort, description, created_at, updated_at
            FROM permissions
            ORDER BY type ASC, sort ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Find permission by code
    pub async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<PermissionRow>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, code, parent_code, path, type, sort, description, created_at, updated_at
            FROM permissions
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Check if code is unique
    pub async fn is_code_unique(&self, code: &str, exclude_id: Option<Id>) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM permissions WHERE code = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count == 0)
    }

    /// Permission codes granted to a user through their role
    pub async fn codes_for_user(&self, user_id: Id) -> RepositoryResult<Vec<String>> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.code
            FROM users u
            JOIN role_permissions rp ON rp.role_id = u.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE u.id = ?1
            ORDER BY p.type ASC, p.sort ASC, p.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codes)
    }
}

#[async_trait]
impl Repository<PermissionRow, CreatePermissionDto, UpdatePermissionDto> for PermissionRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<PermissionRow>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, code, parent_code, path, type, sort, description, created_at, updated_at
            FROM permissions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, dto: CreatePermissionDto) -> RepositoryResult<PermissionRow> {
        if !self.is_code_unique(&dto.code, None).await? {
            return Err(RepositoryError::Conflict(CODE_TAKEN.to_string()));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (
                name, code, parent_code, path, type, sort, description, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8
            )
            RETURNING id, name, code, parent_code, path, type, sort, description, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(&dto.parent_code)
        .bind(&dto.path)
        .bind(dto.kind)
        .bind(dto.sort)
        .bind(&dto.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, CODE_TAKEN))?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdatePermissionDto) -> RepositoryResult<PermissionRow> {
        if let Some(ref code) = dto.code {
            if !self.is_code_unique(code, Some(id)).await? {
                return Err(RepositoryError::Conflict(CODE_TAKEN.to_string()));
            }
        }

        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE permissions SET
                name = COALESCE(?1, name),
                code = COALESCE(?2, code),
                parent_code = COALESCE(?3, parent_code),
                path = COALESCE(?4, path),
                type = COALESCE(?5, type),
                sort = COALESCE(?6, sort),
                description = COALESCE(?7, description),
                updated_at = ?8
            WHERE id = ?9
            RETURNING id, name, code, parent_code, path, type, sort, description, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(&dto.parent_code)
        .bind(&dto.path)
        .bind(dto.kind)
        .bind(dto.sort)
        .bind(&dto.description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, CODE_TAKEN))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Permission with id {} not found", id)))?;

        Ok(row)
    }

    /// Delete a permission and every role grant of it
    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE permission_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM permissions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Permission with id {} not found",
                id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM permissions WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_validity() {
        assert!(kind::is_valid(kind::MENU));
        assert!(kind::is_valid(kind::FUNCTION));
        assert!(kind::is_valid(kind::BUTTON));
        assert!(!kind::is_valid(0));
        assert!(!kind::is_valid(4));
    }

    #[test]
    fn test_row_serializes_kind_as_type() {
        let row = PermissionRow {
            id: 1,
            name: "System".to_string(),
            code: "system".to_string(),
            parent_code: String::new(),
            path: "/system".to_string(),
            kind: kind::MENU,
            sort: 0,
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["type"], 1);
        assert!(json.get("kind").is_none());
    }
}
