//! Permission service

use adm_core::{AdminError, AdminResult, Id};
use adm_db::{
    permission_kind, CreatePermissionDto, PermissionRepository, PermissionRow, Repository,
    RepositoryError, UpdatePermissionDto,
};
use sqlx::SqlitePool;

use crate::tree::{build_permission_tree, PermissionNode};

/// Params for creating a permission
#[derive(Debug, Clone)]
pub struct NewPermission {
    pub name: String,
    pub code: String,
    pub parent_code: String,
    pub path: String,
    pub kind: i32,
    pub sort: i32,
    pub description: String,
}

impl Default for NewPermission {
    fn default() -> Self {
        Self {
            name: String::new(),
            code: String::new(),
            parent_code: String::new(),
            path: String::new(),
            kind: permission_kind::MENU,
            sort: 0,
            description: String::new(),
        }
    }
}

/// Params for a partial permission update
#[derive(Debug, Clone, Default)]
pub struct PermissionChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub parent_code: Option<String>,
    pub path: Option<String>,
    pub kind: Option<i32>,
    pub sort: Option<i32>,
    pub description: Option<String>,
}

pub struct PermissionService {
    permissions: PermissionRepository,
}

impl PermissionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            permissions: PermissionRepository::new(pool),
        }
    }

    /// Every permission, ordered by type, sort and id
    pub async fn list(&self) -> AdminResult<Vec<PermissionRow>> {
        Ok(self.permissions.find_all_ordered().await?)
    }

    pub async fn tree(&self) -> AdminResult<Vec<PermissionNode>> {
        Ok(build_permission_tree(self.list().await?))
    }

    pub async fn get(&self, id: Id) -> AdminResult<PermissionRow> {
        self.permissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AdminError::not_found("Permission", "id", id))
    }

    pub async fn get_by_code(&self, code: &str) -> AdminResult<PermissionRow> {
        self.permissions
            .find_by_code(code)
            .await?
            .ok_or_else(|| AdminError::not_found("Permission", "code", code))
    }

    pub async fn create(&self, params: NewPermission) -> AdminResult<PermissionRow> {
        check_kind(params.kind)?;

        let row = self
            .permissions
            .create(CreatePermissionDto {
                name: params.name,
                code: params.code,
                parent_code: params.parent_code,
                path: params.path,
                kind: params.kind,
                sort: params.sort,
                description: params.description,
            })
            .await?;

        tracing::info!(permission_id = row.id, code = %row.code, "Permission created");
        Ok(row)
    }

    pub async fn update(&self, id: Id, changes: PermissionChanges) -> AdminResult<PermissionRow> {
        if let Some(kind) = changes.kind {
            check_kind(kind)?;
        }

        let row = self
            .permissions
            .update(
                id,
                UpdatePermissionDto {
                    name: changes.name.filter(|v| !v.is_empty()),
                    code: changes.code.filter(|v| !v.is_empty()),
                    parent_code: changes.parent_code,
                    path: changes.path,
                    kind: changes.kind,
                    sort: changes.sort,
                    description: changes.description,
                },
            )
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(permission_id = id, "Permission updated");
        Ok(row)
    }

    /// Delete a permission and revoke it from every role
    pub async fn delete(&self, id: Id) -> AdminResult<()> {
        self.permissions
            .delete(id)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(permission_id = id, "Permission deleted");
        Ok(())
    }

    /// Codes granted to a user through their role
    pub async fn user_permission_codes(&self, user_id: Id) -> AdminResult<Vec<String>> {
        Ok(self.permissions.codes_for_user(user_id).await?)
    }

    /// Whether a user's role grants `code`
    pub async fn check(&self, user_id: Id, code: &str) -> AdminResult<bool> {
        let codes = self.user_permission_codes(user_id).await?;
        Ok(codes.iter().any(|c| c == code))
    }
}

fn check_kind(kind: i32) -> AdminResult<()> {
    if permission_kind::is_valid(kind) {
        Ok(())
    } else {
        Err(AdminError::invalid("type", "must be 1 (menu), 2 (function) or 3 (button)"))
    }
}

fn not_found_as(err: RepositoryError, id: Id) -> AdminError {
    match err {
        RepositoryError::NotFound(_) => AdminError::not_found("Permission", "id", id),
        other => other.into(),
    }
}
