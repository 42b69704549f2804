//! # adm-db
//!
//! Database layer for Admin RS.
//!
//! This crate provides SQLite database access using SQLx, including:
//!
//! - Connection pool management
//! - Schema creation and first-run seed data
//! - Repository pattern for CRUD operations on users, roles and permissions
//!
//! ## Example
//!
//! ```ignore
//! use adm_db::{Database, DatabaseConfig, Repository, UserRepository};
//!
//! let db = Database::connect(&DatabaseConfig::with_url("sqlite://data.db?mode=rwc")).await?;
//! db.migrate().await?;
//!
//! let repo = UserRepository::new(db.pool().clone());
//! let user = repo.find_by_id(1).await?;
//! ```

pub mod permissions;
pub mod pool;
pub mod repository;
pub mod roles;
pub mod schema;
pub mod seed;
pub mod users;

// Re-exports
pub use permissions::{
    kind as permission_kind, CreatePermissionDto, PermissionRepository, PermissionRow,
    UpdatePermissionDto,
};
pub use pool::{Database, DatabaseConfig};
pub use repository::{PagedRepository, Repository, RepositoryError, RepositoryResult};
pub use roles::{CreateRoleDto, RoleRepository, RoleRow, UpdateRoleDto};
pub use seed::{seed_defaults, SeedData};
pub use users::{status as user_status, CreateUserDto, UpdateUserDto, UserRepository, UserRow};
