//! Axum extractors for API handlers

use std::sync::Arc;

use adm_auth::{Authenticator, CurrentUser, JwtService};
use adm_core::{config::AppConfig, Id, PaginationParams};
use adm_services::{PermissionService, RoleService, UserService};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(JwtService::from_config(&config.auth)),
            config: Arc::new(config),
        }
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.jwt.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.pool.clone())
    }

    pub fn permissions(&self) -> PermissionService {
        PermissionService::new(self.pool.clone())
    }
}

/// Authenticated user extractor
///
/// Reads the `CurrentUser` the auth middleware stored on the request.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Pagination from `?page=&pageSize=`, clamped
///
/// Each value that does not parse falls back to its own default.
pub struct Pagination(pub PaginationParams);

#[derive(Deserialize)]
struct PaginationQuery {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

fn parse_or(value: Option<String>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let defaults = PaginationParams::default();
        let Ok(Query(query)) = Query::<PaginationQuery>::from_request_parts(parts, state).await
        else {
            return Ok(Pagination(defaults));
        };

        Ok(Pagination(PaginationParams::new(
            parse_or(query.page, defaults.page),
            parse_or(query.page_size, defaults.page_size),
        )))
    }
}

impl std::ops::Deref for Pagination {
    type Target = PaginationParams;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// JSON body that is parsed and then validated
///
/// Malformed JSON is a 400, failed validation a 422.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(JsonBody(value))
    }
}

/// Numeric `:id` path segment
pub struct PathId(pub Id);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Id>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid id"))?;
        Ok(PathId(id))
    }
}
