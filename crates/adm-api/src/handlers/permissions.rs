//! Permissions API handlers

use adm_db::PermissionRow;
use adm_services::{NewPermission, PermissionChanges, PermissionNode};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AppState, JsonBody, PathId};
use crate::response::ApiResponse;

fn default_kind() -> i32 {
    adm_db::permission_kind::MENU
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub code: String,
    #[validate(length(max = 50, message = "is too long"))]
    #[serde(default)]
    pub parent_code: String,
    #[validate(length(max = 100, message = "is too long"))]
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: i32,
    #[serde(default)]
    pub sort: i32,
    #[validate(length(max = 255, message = "is too long"))]
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    #[validate(length(max = 50, message = "is too long"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "is too long"))]
    pub code: Option<String>,
    #[validate(length(max = 50, message = "is too long"))]
    pub parent_code: Option<String>,
    #[validate(length(max = 100, message = "is too long"))]
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    pub sort: Option<i32>,
    #[validate(length(max = 255, message = "is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionList {
    pub list: Vec<PermissionRow>,
    pub total: usize,
}

/// Flat permission list
///
/// GET /api/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<PermissionList>> {
    let list = state.permissions().list().await?;
    let total = list.len();
    Ok(ApiResponse::success(PermissionList { list, total }))
}

/// Permission tree
///
/// GET /api/permissions/tree
pub async fn permission_tree(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<PermissionNode>>> {
    let tree = state.permissions().tree().await?;
    Ok(ApiResponse::success(tree))
}

/// Get a single permission
///
/// GET /api/permissions/:id
pub async fn get_permission(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<PermissionRow>> {
    let permission = state.permissions().get(id).await?;
    Ok(ApiResponse::success(permission))
}

/// Create a permission
///
/// POST /api/permissions
pub async fn create_permission(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreatePermissionRequest>,
) -> ApiResult<ApiResponse<PermissionRow>> {
    let permission = state
        .permissions()
        .create(NewPermission {
            name: body.name,
            code: body.code,
            parent_code: body.parent_code,
            path: body.path,
            kind: body.kind,
            sort: body.sort,
            description: body.description,
        })
        .await?;

    Ok(ApiResponse::success(permission))
}

/// Update a permission
///
/// PUT /api/permissions/:id
pub async fn update_permission(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<UpdatePermissionRequest>,
) -> ApiResult<ApiResponse<PermissionRow>> {
    let permission = state
        .permissions()
        .update(
            id,
            PermissionChanges {
                name: body.name,
                code: body.code,
                parent_code: body.parent_code,
                path: body.path,
                kind: body.kind,
                sort: body.sort,
                description: body.description,
            },
        )
        .await?;

    Ok(ApiResponse::success(permission))
}

/// Delete a permission and revoke it from all roles
///
/// DELETE /api/permissions/:id
pub async fn delete_permission(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<()>> {
    state.permissions().delete(id).await?;
    Ok(ApiResponse::empty())
}
