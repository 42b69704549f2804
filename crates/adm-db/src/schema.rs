//! Schema creation
//!
//! Idempotent `CREATE ... IF NOT EXISTS` statements run at startup.
//! `parent_code` is a plain string column: permission hierarchy is not
//! enforced by a foreign key.

use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL,
        code        TEXT    NOT NULL UNIQUE,
        description TEXT    NOT NULL DEFAULT '',
        created_at  TEXT    NOT NULL,
        updated_at  TEXT    NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        username   TEXT    NOT NULL UNIQUE,
        password   TEXT    NOT NULL,
        realname   TEXT    NOT NULL DEFAULT '',
        email      TEXT    NOT NULL DEFAULT '',
        status     INTEGER NOT NULL DEFAULT 1,
        role_id    INTEGER NULL REFERENCES roles (id),
        created_at TEXT    NOT NULL,
        updated_at TEXT    NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS permissions (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL,
        code        TEXT    NOT NULL UNIQUE,
        parent_code TEXT    NOT NULL DEFAULT '',
        path        TEXT    NOT NULL DEFAULT '',
        type        INTEGER NOT NULL DEFAULT 1,
        sort        INTEGER NOT NULL DEFAULT 0,
        description TEXT    NOT NULL DEFAULT '',
        created_at  TEXT    NOT NULL,
        updated_at  TEXT    NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        role_id       INTEGER NOT NULL REFERENCES roles (id),
        permission_id INTEGER NOT NULL REFERENCES permissions (id),
        PRIMARY KEY (role_id, permission_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_role_id ON users (role_id)",
    "CREATE INDEX IF NOT EXISTS idx_permissions_parent_code ON permissions (parent_code)",
    "CREATE INDEX IF NOT EXISTS idx_role_permissions_permission_id ON role_permissions (permission_id)",
];

/// Create all tables and indexes
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::debug!(statements = STATEMENTS.len(), "Schema migrated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::pool::Database;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, vec!["permissions", "role_permissions", "roles", "users"]);
    }
}
