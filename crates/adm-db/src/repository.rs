//! Repository traits and base implementations
//!
//! Provides generic CRUD operations for database entities.

use adm_core::{AdminError, Id};
use async_trait::async_trait;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AdminError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(message) => AdminError::NotFound {
                entity: "Record",
                field: "query",
                value: message,
            },
            RepositoryError::Database(e) => AdminError::Database(e.to_string()),
            RepositoryError::Validation(message) => AdminError::invalid("base", message),
            RepositoryError::Conflict(message) => AdminError::Conflict { message },
        }
    }
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`
///
/// The uniqueness pre-checks race with concurrent writers; the schema's
/// UNIQUE indexes are the final word.
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(message.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

/// Base repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, CreateDto, UpdateDto>: Send + Sync {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    /// Create a new entity
    async fn create(&self, dto: CreateDto) -> RepositoryResult<T>;

    /// Update an existing entity
    async fn update(&self, id: Id, dto: UpdateDto) -> RepositoryResult<T>;

    /// Delete an entity by ID
    async fn delete(&self, id: Id) -> RepositoryResult<()>;

    /// Check if an entity exists
    async fn exists(&self, id: Id) -> RepositoryResult<bool>;
}

/// Repositories listed page by page
#[async_trait]
pub trait PagedRepository<T>: Send + Sync {
    /// One page of entities ordered by id
    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<T>>;

    /// Count all entities
    async fn count(&self) -> RepositoryResult<i64>;
}
