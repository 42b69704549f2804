//! Users API handlers

use adm_core::{Id, Page};
use adm_services::{NewUser, UserChanges, UserView};
use axum::extract::State;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser, JsonBody, Pagination, PathId};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 72, message = "must be 6 to 72 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub realname: String,
    #[validate(
        email(message = "is not a valid email address"),
        length(max = 100, message = "is too long")
    )]
    pub email: String,
    #[validate(range(min = 0, max = 1, message = "must be 0 or 1"))]
    pub status: Option<i32>,
    pub role_id: Option<Id>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 50, message = "is too long"))]
    pub username: Option<String>,
    #[validate(custom = "password_or_empty")]
    pub password: Option<String>,
    #[validate(length(max = 50, message = "is too long"))]
    pub realname: Option<String>,
    #[validate(custom = "email_or_empty")]
    pub email: Option<String>,
    #[validate(range(min = 0, max = 1, message = "must be 0 or 1"))]
    pub status: Option<i32>,
    /// Absent leaves the role alone, `null` removes it
    #[serde(default, deserialize_with = "present")]
    pub role_id: Option<Option<Id>>,
}

/// Distinguish an explicit `null` from a missing field
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn email_or_empty(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || (email.chars().count() <= 100 && validator::validate_email(email)) {
        Ok(())
    } else {
        let mut error = ValidationError::new("email");
        error.message = Some("is not a valid email address".into());
        Err(error)
    }
}

fn password_or_empty(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() || (6..=72).contains(&password.chars().count()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("length");
        error.message = Some("must be 6 to 72 characters".into());
        Err(error)
    }
}

/// List users
///
/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<ApiResponse<Page<UserView>>> {
    let page = state.users().list(pagination.0).await?;
    Ok(ApiResponse::success(page))
}

/// Get a single user
///
/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<UserView>> {
    let user = state.users().get(id).await?;
    Ok(ApiResponse::success(user))
}

/// Create a user
///
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> ApiResult<ApiResponse<UserView>> {
    let user = state
        .users()
        .create(NewUser {
            username: body.username,
            password: body.password,
            realname: body.realname,
            email: body.email,
            status: body.status,
            role_id: body.role_id,
        })
        .await?;

    Ok(ApiResponse::success(user))
}

/// Update a user; only supplied fields change
///
/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> ApiResult<ApiResponse<UserView>> {
    let user = state
        .users()
        .update(
            id,
            UserChanges {
                username: body.username,
                password: body.password,
                realname: body.realname,
                email: body.email,
                status: body.status,
                role_id: body.role_id,
            },
        )
        .await?;

    Ok(ApiResponse::success(user))
}

/// Delete a user
///
/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    current: AuthenticatedUser,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<()>> {
    state.users().delete(id, current.id).await?;
    Ok(ApiResponse::empty())
}
