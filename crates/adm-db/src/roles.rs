//! Role repository
//!
//! Database operations for roles and the role/permission join table.

use adm_core::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::permissions::PermissionRow;
use crate::repository::{
    unique_violation, PagedRepository, Repository, RepositoryError, RepositoryResult,
};

/// Role database entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoleRow {
    pub id: Id,
    pub name: String,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a role
#[derive(Debug, Clone)]
pub struct CreateRoleDto {
    pub name: String,
    pub code: String,
    pub description: String,
}

/// DTO for updating a role
#[derive(Debug, Clone, Default)]
pub struct UpdateRoleDto {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

const CODE_TAKEN: &str = "Role code has already been taken";

/// Role repository implementation
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find role by code
    pub async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<RoleRow>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, code, description, created_at, updated_at
            FROM roles
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
            "SELECT COUNT(*) FROM roles WHERE code = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count == 0)
    }

    /// Get permissions for a role, ordered like the permission list
    pub async fn get_permissions(&self, role_id: Id) -> RepositoryResult<Vec<PermissionRow>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT p.id, p.name, p.code, p.parent_code, p.path, p.type, p.sort,
                   p.description, p.created_at, p.updated_at
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = ?1
            ORDER BY p.type ASC, p.sort ASC, p.id ASC
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Get permission ids for a role
    pub async fn get_permission_ids(&self, role_id: Id) -> RepositoryResult<Vec<Id>> {
        let ids = sqlx::query_scalar::<_, Id>(
            "SELECT permission_id FROM role_permissions WHERE role_id = ?1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Replace all permissions of a role
    ///
    /// Ids that match no permission are skipped and duplicates collapse.
    pub async fn set_permissions(&self, role_id: Id, permission_ids: &[Id]) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = ?1")
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Role with id {} not found",
                role_id
            )));
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
                SELECT ?1, id FROM permissions WHERE id = ?2
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Repository<RoleRow, CreateRoleDto, UpdateRoleDto> for RoleRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<RoleRow>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, code, description, created_at, updated_at
            FROM roles
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, dto: CreateRoleDto) -> RepositoryResult<RoleRow> {
        if !self.is_code_unique(&dto.code, None).await? {
            return Err(RepositoryError::Conflict(CODE_TAKEN.to_string()));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name, code, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id, name, code, description, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(&dto.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, CODE_TAKEN))?;

        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateRoleDto) -> RepositoryResult<RoleRow> {
        if let Some(ref code) = dto.code {
            if !self.is_code_unique(code, Some(id)).await? {
                return Err(RepositoryError::Conflict(CODE_TAKEN.to_string()));
            }
        }

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE roles SET
                name = COALESCE(?1, name),
                code = COALESCE(?2, code),
                description = COALESCE(?3, description),
                updated_at = ?4
            WHERE id = ?5
            RETURNING id, name, code, description, created_at, updated_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(&dto.description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, CODE_TAKEN))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Role with id {} not found", id)))?;

        Ok(row)
    }

    /// Delete a role, its permission grants and its user assignments
    ///
    /// Permissions are left untouched.
    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET role_id = NULL, updated_at = ?1 WHERE role_id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM roles WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Role with id {} not found",
                id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl PagedRepository<RoleRow> for RoleRepository {
    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, code, description, created_at, updated_at
            FROM roles
            ORDER BY id ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
