//! First-run seed data
//!
//! Populates the default administrator, roles and permission catalogue
//! when the users table is empty.

use adm_core::Id;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::permissions::kind;
use crate::repository::RepositoryResult;
use crate::users::status;

/// Inputs for seeding that the database layer cannot compute itself
#[derive(Debug, Clone)]
pub struct SeedData {
    pub admin_username: String,
    /// Already-hashed administrator password
    pub admin_password_hash: String,
}

struct SeedPermission {
    name: &'static str,
    code: &'static str,
    parent_code: &'static str,
    path: &'static str,
    kind: i32,
    sort: i32,
    description: &'static str,
}

const fn menu(
    name: &'static str,
    code: &'static str,
    parent_code: &'static str,
    path: &'static str,
    sort: i32,
    description: &'static str,
) -> SeedPermission {
    SeedPermission {
        name,
        code,
        parent_code,
        path,
        kind: kind::MENU,
        sort,
        description,
    }
}

const fn function(
    name: &'static str,
    code: &'static str,
    parent_code: &'static str,
    sort: i32,
    description: &'static str,
) -> SeedPermission {
    SeedPermission {
        name,
        code,
        parent_code,
        path: "",
        kind: kind::FUNCTION,
        sort,
        description,
    }
}

const DEFAULT_PERMISSIONS: &[SeedPermission] = &[
    menu("System", "system", "", "/system", 0, "System management"),
    menu("Users", "system:user", "system", "/system/user", 1, "User management"),
    menu("Roles", "system:role", "system", "/system/role", 2, "Role management"),
    menu(
        "Permissions",
        "system:permission",
        "system",
        "/system/permission",
        3,
        "Permission management",
    ),
    function("View users", "system:user:view", "system:user", 1, "List and view users"),
    function("Add user", "system:user:add", "system:user", 2, "Create users"),
    function("Edit user", "system:user:edit", "system:user", 3, "Edit users"),
    function("Delete user", "system:user:delete", "system:user", 4, "Delete users"),
    function("View roles", "system:role:view", "system:role", 1, "List and view roles"),
    function("Add role", "system:role:add", "system:role", 2, "Create roles"),
    function("Edit role", "system:role:edit", "system:role", 3, "Edit roles"),
    function("Delete role", "system:role:delete", "system:role", 4, "Delete roles"),
    function(
        "View permissions",
        "system:permission:view",
        "system:permission",
        1,
        "List and view permissions",
    ),
    function(
        "Assign permissions",
        "system:permission:assign",
        "system:permission",
        2,
        "Assign permissions to roles",
    ),
    menu("Dashboard", "dashboard", "", "/dashboard", 0, "Dashboard"),
];

/// Seed default data if no user exists yet
///
/// Returns `true` when data was written.
pub async fn seed_defaults(pool: &SqlitePool, data: &SeedData) -> RepositoryResult<bool> {
    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if users > 0 {
        tracing::debug!(users, "Users present, skipping seed");
        return Ok(false);
    }

    let mut tx = pool.begin().await?;

    let admin_role = insert_role(&mut tx, "Super Administrator", "admin", "Full access").await?;
    insert_role(&mut tx, "Regular User", "user", "Default role for new accounts").await?;

    for permission in DEFAULT_PERMISSIONS {
        let permission_id = insert_permission(&mut tx, permission).await?;
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)")
            .bind(admin_role)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO users (
            username, password, realname, email, status, role_id, created_at, updated_at
        ) VALUES (
            ?1, ?2, 'Administrator', 'admin@example.com', ?3, ?4, ?5, ?5
        )
        "#,
    )
    .bind(&data.admin_username)
    .bind(&data.admin_password_hash)
    .bind(status::ENABLED)
    .bind(admin_role)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        admin = %data.admin_username,
        permissions = DEFAULT_PERMISSIONS.len(),
        "Seeded default data"
    );
    Ok(true)
}

async fn insert_role(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    code: &str,
    description: &str,
) -> RepositoryResult<Id> {
    let id = sqlx::query_scalar::<_, Id>(
        r#"
        INSERT INTO roles (name, code, description, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(code)
    .bind(description)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

async fn insert_permission(
    tx: &mut Transaction<'_, Sqlite>,
    permission: &SeedPermission,
) -> RepositoryResult<Id> {
    let id = sqlx::query_scalar::<_, Id>(
        r#"
        INSERT INTO permissions (
            name, code, parent_code, path, type, sort, description, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8
        )
        RETURNING id
        "#,
    )
    .bind(permission.name)
    .bind(permission.code)
    .bind(permission.parent_code)
    .bind(permission.path)
    .bind(permission.kind)
    .bind(permission.sort)
    .bind(permission.description)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
