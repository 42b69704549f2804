//! Serializable views returned by the services
//!
//! Password hashes never leave the service layer: `UserView` is built from
//! a `UserRow` and drops the hash.

use adm_core::Id;
use adm_db::{PermissionRow, RoleRow, UserRow};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tree::PermissionNode;

/// Role reference embedded in user payloads
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleSummary {
    pub id: Id,
    pub name: String,
    pub code: String,
}

/// User as exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Id,
    pub username: String,
    pub realname: String,
    pub email: String,
    pub status: i32,
    pub role_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        let role = match (row.role_id, row.role_name, row.role_code) {
            (Some(id), Some(name), Some(code)) => Some(RoleSummary { id, name, code }),
            _ => None,
        };

        Self {
            id: row.id,
            username: row.username,
            realname: row.realname,
            email: row.email,
            status: row.status,
            role_id: row.role_id,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Role with its granted permissions
#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: RoleRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionRow>>,
}

impl From<RoleRow> for RoleView {
    fn from(role: RoleRow) -> Self {
        Self {
            role,
            permissions: None,
        }
    }
}

/// The signed-in user with role and effective permission codes
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub permissions: Vec<String>,
}

/// Permission assignment screen for one role
#[derive(Debug, Clone, Serialize)]
pub struct RolePermissionData {
    pub role_id: Id,
    pub permission_ids: Vec<Id>,
    pub permission_trees: Vec<PermissionNode>,
}
