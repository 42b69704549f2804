//! Result type alias

use crate::error::AdminError;

/// Standard Result type for Admin RS operations
pub type AdminResult<T> = Result<T, AdminError>;
