//! Roles API handlers

use adm_core::{Id, Page};
use adm_services::{NewRole, RoleChanges, RolePermissionData, RoleView};
use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AppState, JsonBody, Pagination, PathId};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub code: String,
    #[validate(length(max = 255, message = "is too long"))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(max = 50, message = "is too long"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "is too long"))]
    pub code: Option<String>,
    #[validate(length(max = 255, message = "is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignPermissionsRequest {
    pub permission_ids: Vec<Id>,
}

/// List roles
///
/// GET /api/roles
pub async fn list_roles(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<ApiResponse<Page<RoleView>>> {
    let page = state.roles().list(pagination.0).await?;
    Ok(ApiResponse::success(page))
}

/// Get a role with its permissions
///
/// GET /api/roles/:id
pub async fn get_role(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<RoleView>> {
    let role = state.roles().get(id).await?;
    Ok(ApiResponse::success(role))
}

/// Create a role
///
/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateRoleRequest>,
) -> ApiResult<ApiResponse<RoleView>> {
    let role = state
        .roles()
        .create(NewRole {
            name: body.name,
            code: body.code,
            description: body.description,
        })
        .await?;

    Ok(ApiResponse::success(role))
}

/// Update a role
///
/// PUT /api/roles/:id
pub async fn update_role(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<UpdateRoleRequest>,
) -> ApiResult<ApiResponse<RoleView>> {
    let role = state
        .roles()
        .update(
            id,
            RoleChanges {
                name: body.name,
                code: body.code,
                description: body.description,
            },
        )
        .await?;

    Ok(ApiResponse::success(role))
}

/// Delete a role and clear its associations
///
/// DELETE /api/roles/:id
pub async fn delete_role(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<()>> {
    state.roles().delete(id).await?;
    Ok(ApiResponse::empty())
}

/// Permission tree with the role's permissions checked
///
/// GET /api/roles/:id/permissions
pub async fn get_role_permissions(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<RolePermissionData>> {
    let data = state.roles().permissions_view(id).await?;
    Ok(ApiResponse::success(data))
}

/// Replace the role's permissions
///
/// POST /api/roles/:id/permissions
pub async fn assign_role_permissions(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<AssignPermissionsRequest>,
) -> ApiResult<ApiResponse<()>> {
    state
        .roles()
        .assign_permissions(id, &body.permission_ids)
        .await?;
    Ok(ApiResponse::empty())
}
