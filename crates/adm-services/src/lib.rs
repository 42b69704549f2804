//! # adm-services
//!
//! Business logic services for Admin RS.
//!
//! Each service wraps the repositories it needs, applies the domain rules
//! (uniqueness, self-delete, account status, permission types) and returns
//! view types ready for serialization.

pub mod permissions;
pub mod roles;
pub mod tree;
pub mod users;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

pub use permissions::{NewPermission, PermissionChanges, PermissionService};
pub use roles::{NewRole, RoleChanges, RoleService};
pub use tree::{build_permission_tree, PermissionNode};
pub use users::{NewUser, UserChanges, UserService};
pub use views::{ProfileView, RolePermissionData, RoleSummary, RoleView, UserView};
