//! Request authentication
//!
//! Resolves an `Authorization` header to the user the token was issued for.

use std::sync::Arc;

use adm_core::{AdminError, Id};
use serde::Serialize;
use thiserror::Error;

use crate::jwt::{extract_bearer_token, JwtError, JwtService};

/// Authentication errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    Required,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

impl From<AuthError> for AdminError {
    fn from(err: AuthError) -> Self {
        AdminError::unauthorized(err.to_string())
    }
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: Id,
    pub username: String,
}

impl CurrentUser {
    pub fn new(id: Id, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Authenticator for validating requests
#[derive(Clone)]
pub struct Authenticator {
    jwt: Arc<JwtService>,
}

impl Authenticator {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }

    /// Authenticate from the raw `Authorization` header value, if any
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<CurrentUser, AuthError> {
        let header = authorization.ok_or(AuthError::Required)?;
        let token = extract_bearer_token(header).ok_or(AuthError::InvalidToken)?;

        let claims = self.jwt.validate_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected bearer token");
            match e {
                JwtError::Expired => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;
        Ok(CurrentUser::new(id, claims.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> (Arc<JwtService>, Authenticator) {
        let jwt = Arc::new(JwtService::new(b"test-secret-key-at-least-32-bytes", 3600));
        (jwt.clone(), Authenticator::new(jwt))
    }

    #[test]
    fn test_jwt_authentication() {
        let (jwt, authenticator) = authenticator();
        let token = jwt.create_token(7, "alice").unwrap();

        let user = authenticator
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(user, CurrentUser::new(7, "alice"));
    }

    #[test]
    fn test_missing_header() {
        let (_, authenticator) = authenticator();
        assert_eq!(authenticator.authenticate(None), Err(AuthError::Required));
    }

    #[test]
    fn test_wrong_scheme_and_bad_token() {
        let (_, authenticator) = authenticator();
        assert_eq!(
            authenticator.authenticate(Some("Basic YWRtaW46YWRtaW4=")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            authenticator.authenticate(Some("Bearer not-a-jwt")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token() {
        let (_, authenticator) = authenticator();
        let expired = JwtService::new(b"test-secret-key-at-least-32-bytes", -3600)
            .create_token(1, "admin")
            .unwrap();

        assert_eq!(
            authenticator.authenticate(Some(&format!("Bearer {}", expired))),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_maps_to_unauthorized() {
        let err: AdminError = AuthError::TokenExpired.into();
        assert_eq!(err.status_code(), 401);
    }
}
