//! Role service

use std::collections::HashSet;

use adm_core::{AdminError, AdminResult, Id, Page, PaginationParams};
use adm_db::{
    CreateRoleDto, PagedRepository, PermissionRepository, Repository, RepositoryError,
    RoleRepository, RoleRow, UpdateRoleDto,
};
use sqlx::SqlitePool;

use crate::tree::build_checked_tree;
use crate::views::{RolePermissionData, RoleView};

/// Params for creating a role
#[derive(Debug, Clone, Default)]
pub struct NewRole {
    pub name: String,
    pub code: String,
    pub description: String,
}

/// Params for a partial role update
#[derive(Debug, Clone, Default)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

pub struct RoleService {
    roles: RoleRepository,
    permissions: PermissionRepository,
}

impl RoleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            roles: RoleRepository::new(pool.clone()),
            permissions: PermissionRepository::new(pool),
        }
    }

    pub async fn list(&self, params: PaginationParams) -> AdminResult<Page<RoleView>> {
        let params = params.normalized();
        let total = self.roles.count().await?;
        let rows = self.roles.find_all(params.limit(), params.offset()).await?;

        Ok(Page::new(rows, total, params).map(RoleView::from))
    }

    /// Role with the permissions it holds
    pub async fn get(&self, id: Id) -> AdminResult<RoleView> {
        let role = self.find(id).await?;
        let permissions = self.roles.get_permissions(id).await?;

        Ok(RoleView {
            role,
            permissions: Some(permissions),
        })
    }

    pub async fn create(&self, params: NewRole) -> AdminResult<RoleView> {
        let row = self
            .roles
            .create(CreateRoleDto {
                name: params.name,
                code: params.code,
                description: params.description,
            })
            .await?;

        tracing::info!(role_id = row.id, code = %row.code, "Role created");
        Ok(row.into())
    }

    pub async fn update(&self, id: Id, changes: RoleChanges) -> AdminResult<RoleView> {
        let row = self
            .roles
            .update(
                id,
                UpdateRoleDto {
                    name: changes.name.filter(|v| !v.is_empty()),
                    code: changes.code.filter(|v| !v.is_empty()),
                    description: changes.description,
                },
            )
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(role_id = id, "Role updated");
        Ok(row.into())
    }

    /// Delete a role, its grants and its user assignments
    pub async fn delete(&self, id: Id) -> AdminResult<()> {
        self.roles.delete(id).await.map_err(|e| not_found_as(e, id))?;

        tracing::info!(role_id = id, "Role deleted");
        Ok(())
    }

    /// Full permission tree with the role's permissions checked
    pub async fn permissions_view(&self, id: Id) -> AdminResult<RolePermissionData> {
        self.find(id).await?;

        let permission_ids = self.roles.get_permission_ids(id).await?;
        let held: HashSet<Id> = permission_ids.iter().copied().collect();
        let rows = self.permissions.find_all_ordered().await?;

        Ok(RolePermissionData {
            role_id: id,
            permission_ids,
            permission_trees: build_checked_tree(rows, &held),
        })
    }

    /// Replace the role's permission set
    pub async fn assign_permissions(&self, id: Id, permission_ids: &[Id]) -> AdminResult<()> {
        self.roles
            .set_permissions(id, permission_ids)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(role_id = id, count = permission_ids.len(), "Role permissions assigned");
        Ok(())
    }

    async fn find(&self, id: Id) -> AdminResult<RoleRow> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AdminError::not_found("Role", "id", id))
    }
}

fn not_found_as(err: RepositoryError, id: Id) -> AdminError {
    match err {
        RepositoryError::NotFound(_) => AdminError::not_found("Role", "id", id),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{NewPermission, PermissionService};
    use crate::testing::database;
    use adm_db::permission_kind;

    fn editor() -> NewRole {
        NewRole {
            name: "Editor".into(),
            code: "editor".into(),
            description: "Edits things".into(),
        }
    }

    fn permission(code: &str, parent_code: &str) -> NewPermission {
        NewPermission {
            name: code.into(),
            code: code.into(),
            parent_code: parent_code.into(),
            kind: permission_kind::MENU,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_code() {
        let db = database().await;
        let service = RoleService::new(db.pool().clone());
        service.create(editor()).await.unwrap();

        let err = service.create(editor()).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_update_and_missing_role() {
        let db = database().await;
        let service = RoleService::new(db.pool().clone());
        let role = service.create(editor()).await.unwrap();

        let updated = service
            .update(
                role.role.id,
                RoleChanges {
                    name: Some("Editors".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role.name, "Editors");
        assert_eq!(updated.role.code, "editor");

        let err = service.update(77, RoleChanges::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        let err = service.delete(77).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_permissions_view_marks_held_nodes() {
        let db = database().await;
        let service = RoleService::new(db.pool().clone());
        let permissions = PermissionService::new(db.pool().clone());
        let role = service.create(editor()).await.unwrap().role;
        let parent = permissions.create(permission("content", "")).await.unwrap();
        let child = permissions.create(permission("content:edit", "content")).await.unwrap();

        service.assign_permissions(role.id, &[child.id]).await.unwrap();
        let data = service.permissions_view(role.id).await.unwrap();

        assert_eq!(data.role_id, role.id);
        assert_eq!(data.permission_ids, vec![child.id]);
        assert_eq!(data.permission_trees.len(), 1);
        assert_eq!(data.permission_trees[0].id, parent.id);
        assert!(!data.permission_trees[0].checked);
        assert!(data.permission_trees[0].children[0].checked);
    }

    #[tokio::test]
    async fn test_assign_replaces_set() {
        let db = database().await;
        let service = RoleService::new(db.pool().clone());
        let permissions = PermissionService::new(db.pool().clone());
        let role = service.create(editor()).await.unwrap().role;
        let a = permissions.create(permission("a", "")).await.unwrap();
        let b = permissions.create(permission("b", "")).await.unwrap();

        service.assign_permissions(role.id, &[a.id, b.id]).await.unwrap();
        service.assign_permissions(role.id, &[b.id, 4242]).await.unwrap();

        let view = service.get(role.id).await.unwrap();
        let codes: Vec<_> = view.permissions.unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["b"]);

        let err = service.assign_permissions(999, &[a.id]).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete_keeps_permissions() {
        let db = database().await;
        let service = RoleService::new(db.pool().clone());
        let permissions = PermissionService::new(db.pool().clone());
        let role = service.create(editor()).await.unwrap().role;
        let a = permissions.create(permission("a", "")).await.unwrap();
        service.assign_permissions(role.id, &[a.id]).await.unwrap();

        service.delete(role.id).await.unwrap();

        assert!(permissions.get(a.id).await.is_ok());
        assert_eq!(service.get(role.id).await.unwrap_err().status_code(), 404);
    }
}
