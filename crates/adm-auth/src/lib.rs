//! # adm-auth
//!
//! Authentication for Admin RS.
//!
//! ## Features
//!
//! - JWT bearer tokens (HS256)
//! - Argon2 password hashing
//! - Request authenticator resolving a bearer token to the current user

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService};
pub use middleware::{AuthError, Authenticator, CurrentUser};
pub use password::{PasswordError, PasswordHasher};
