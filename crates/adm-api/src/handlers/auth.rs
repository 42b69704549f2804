//! Auth API handlers

use adm_services::{ProfileView, UserView};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser, JsonBody};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub username: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub realname: String,
    pub email: String,
}

impl From<UserView> for LoginUser {
    fn from(user: UserView) -> Self {
        Self {
            id: user.id,
            username: user.username,
            realname: user.realname,
            email: user.email,
        }
    }
}

/// Exchange credentials for a token
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let user = state
        .users()
        .authenticate(&body.username, &body.password)
        .await?;

    let token = state
        .jwt
        .create_token(user.id, &user.username)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Tokens are stateless; the client discards its copy
///
/// POST /api/auth/logout
pub async fn logout() -> ApiResponse<()> {
    ApiResponse::empty()
}

/// Current user with role and permission codes
///
/// GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<ApiResponse<ProfileView>> {
    let profile = state.users().profile(user.id).await?;
    Ok(ApiResponse::success(profile))
}
