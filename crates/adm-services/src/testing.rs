//! Shared fixtures for service tests

use adm_db::Database;

/// Fresh migrated in-memory database
pub async fn database() -> Database {
    let db = Database::connect_in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db
}
