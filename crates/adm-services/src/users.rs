//! User service
//!
//! Account management plus credential checks for login.

use adm_auth::PasswordHasher;
use adm_core::{AdminError, AdminResult, Id, Page, PaginationParams};
use adm_db::{
    user_status, CreateUserDto, PagedRepository, PermissionRepository, Repository, UpdateUserDto,
    UserRepository, UserRow,
};
use sqlx::SqlitePool;

use crate::views::{ProfileView, UserView};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Params for creating a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub realname: String,
    pub email: String,
    /// Defaults to enabled
    pub status: Option<i32>,
    pub role_id: Option<Id>,
}

/// Params for a partial user update
///
/// Empty strings count as "not supplied".
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub realname: Option<String>,
    pub email: Option<String>,
    pub status: Option<i32>,
    /// `Some(None)` removes the role
    pub role_id: Option<Option<Id>>,
}

pub struct UserService {
    users: UserRepository,
    permissions: PermissionRepository,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            permissions: PermissionRepository::new(pool),
            hasher: PasswordHasher::new(),
        }
    }

    /// List users ordered by id
    pub async fn list(&self, params: PaginationParams) -> AdminResult<Page<UserView>> {
        let params = params.normalized();
        let total = self.users.count().await?;
        let rows = self.users.find_all(params.limit(), params.offset()).await?;

        Ok(Page::new(rows, total, params).map(UserView::from))
    }

    pub async fn get(&self, id: Id) -> AdminResult<UserView> {
        Ok(self.find(id).await?.into())
    }

    pub async fn create(&self, params: NewUser) -> AdminResult<UserView> {
        if !self.users.is_username_unique(&params.username, None).await? {
            return Err(AdminError::conflict("Username has already been taken"));
        }

        let status = params.status.unwrap_or(user_status::ENABLED);
        check_status(status)?;
        if let Some(role_id) = params.role_id {
            self.check_role(role_id).await?;
        }

        let password_hash = self.hash(&params.password)?;
        let row = self
            .users
            .create(CreateUserDto {
                username: params.username,
                password_hash,
                realname: params.realname,
                email: params.email,
                status,
                role_id: params.role_id,
            })
            .await?;

        tracing::info!(user_id = row.id, username = %row.username, "User created");
        Ok(row.into())
    }

    pub async fn update(&self, id: Id, changes: UserChanges) -> AdminResult<UserView> {
        if !self.users.exists(id).await? {
            return Err(AdminError::not_found("User", "id", id));
        }

        let username = non_empty(changes.username);
        if let Some(ref username) = username {
            if !self.users.is_username_unique(username, Some(id)).await? {
                return Err(AdminError::conflict("Username has already been taken"));
            }
        }
        if let Some(status) = changes.status {
            check_status(status)?;
        }
        if let Some(Some(role_id)) = changes.role_id {
            self.check_role(role_id).await?;
        }

        let password_hash = match non_empty(changes.password) {
            Some(password) => Some(self.hash(&password)?),
            None => None,
        };

        let row = self
            .users
            .update(
                id,
                UpdateUserDto {
                    username,
                    password_hash,
                    realname: non_empty(changes.realname),
                    email: non_empty(changes.email),
                    status: changes.status,
                    role_id: changes.role_id,
                },
            )
            .await?;

        tracing::info!(user_id = id, "User updated");
        Ok(row.into())
    }

    /// Delete a user; `acting_user_id` may not delete itself
    pub async fn delete(&self, id: Id, acting_user_id: Id) -> AdminResult<()> {
        if id == acting_user_id {
            return Err(AdminError::conflict("You cannot delete your own account"));
        }

        self.users.delete(id).await.map_err(|e| match e {
            adm_db::RepositoryError::NotFound(_) => AdminError::not_found("User", "id", id),
            other => other.into(),
        })?;

        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Check credentials for login
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> AdminResult<UserView> {
        let Some(row) = self.users.find_by_username(username).await? else {
            tracing::warn!(username, "Login attempt for unknown user");
            return Err(AdminError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(password, &row.password) {
            tracing::warn!(username, "Login attempt with wrong password");
            return Err(AdminError::unauthorized(INVALID_CREDENTIALS));
        }

        if !row.is_enabled() {
            tracing::warn!(username, "Login attempt for disabled account");
            return Err(AdminError::forbidden("Account is disabled"));
        }

        if self.hasher.needs_rehash(&row.password) {
            self.upgrade_hash(row.id, password).await;
        }

        tracing::info!(user_id = row.id, username, "User logged in");
        Ok(row.into())
    }

    /// User with role and granted permission codes
    pub async fn profile(&self, id: Id) -> AdminResult<ProfileView> {
        let user = self.find(id).await?;
        let permissions = self.permissions.codes_for_user(id).await?;

        Ok(ProfileView {
            user: user.into(),
            permissions,
        })
    }

    async fn find(&self, id: Id) -> AdminResult<UserRow> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AdminError::not_found("User", "id", id))
    }

    async fn check_role(&self, role_id: Id) -> AdminResult<()> {
        if self.users.role_exists(role_id).await? {
            Ok(())
        } else {
            Err(AdminError::invalid("role_id", format!("Role {} does not exist", role_id)))
        }
    }

    /// Replace a legacy bcrypt hash; login still succeeds if this fails
    async fn upgrade_hash(&self, id: Id, password: &str) {
        let changes = match self.hash(password) {
            Ok(password_hash) => UpdateUserDto {
                password_hash: Some(password_hash),
                ..Default::default()
            },
            Err(e) => {
                tracing::warn!(user_id = id, error = %e, "Could not rehash legacy password");
                return;
            }
        };

        match self.users.update(id, changes).await {
            Ok(_) => tracing::info!(user_id = id, "Upgraded legacy password hash"),
            Err(e) => tracing::warn!(user_id = id, error = %e, "Could not store rehashed password"),
        }
    }

    fn hash(&self, password: &str) -> AdminResult<String> {
        self.hasher
            .hash(password)
            .map_err(|e| AdminError::Internal(e.to_string()))
    }
}

fn check_status(status: i32) -> AdminResult<()> {
    if user_status::is_valid(status) {
        Ok(())
    } else {
        Err(AdminError::invalid("status", "must be 0 or 1"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::database;
    use adm_db::{seed_defaults, SeedData};

    fn alice() -> NewUser {
        NewUser {
            username: "alice".into(),
            password: "secret1".into(),
            realname: "Alice".into(),
            email: "alice@example.com".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());

        let created = service.create(alice()).await.unwrap();
        assert_eq!(created.status, user_status::ENABLED);

        let user = service.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        service.create(alice()).await.unwrap();

        let wrong_password = service.authenticate("alice", "nope").await.unwrap_err();
        let unknown_user = service.authenticate("mallory", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.status_code(), 401);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_legacy_bcrypt_hash_logs_in_and_is_upgraded() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        let legacy = bcrypt::hash("admin123", 4).unwrap().replacen("$2b$", "$2a$", 1);
        service
            .users
            .create(CreateUserDto {
                username: "legacy".into(),
                password_hash: legacy,
                realname: "Legacy".into(),
                email: "legacy@example.com".into(),
                status: user_status::ENABLED,
                role_id: None,
            })
            .await
            .unwrap();

        assert!(service.authenticate("legacy", "wrong").await.is_err());
        let stored = service.users.find_by_username("legacy").await.unwrap().unwrap();
        assert!(stored.password.starts_with("$2a$"));

        service.authenticate("legacy", "admin123").await.unwrap();
        let stored = service.users.find_by_username("legacy").await.unwrap().unwrap();
        assert!(stored.password.starts_with("$argon2id$"));

        service.authenticate("legacy", "admin123").await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_account_cannot_log_in() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        service
            .create(NewUser {
                status: Some(user_status::DISABLED),
                ..alice()
            })
            .await
            .unwrap();

        let err = service.authenticate("alice", "secret1").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        service.create(alice()).await.unwrap();

        let err = service.create(alice()).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_unknown_role_is_validation_error() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());

        let err = service
            .create(NewUser {
                role_id: Some(99),
                ..alice()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_update_rehashes_password_and_skips_empty_fields() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        let created = service.create(alice()).await.unwrap();

        let updated = service
            .update(
                created.id,
                UserChanges {
                    realname: Some(String::new()),
                    email: Some("new@example.com".into()),
                    password: Some("secret2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.realname, "Alice");
        assert_eq!(updated.email, "new@example.com");
        assert!(service.authenticate("alice", "secret2").await.is_ok());
        assert!(service.authenticate("alice", "secret1").await.is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_bad_status_and_missing_user() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        let created = service.create(alice()).await.unwrap();

        let err = service
            .update(
                created.id,
                UserChanges {
                    status: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);

        let err = service.update(404, UserChanges::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        let created = service.create(alice()).await.unwrap();

        let err = service.delete(created.id, created.id).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        service.delete(created.id, 1000).await.unwrap();
        let err = service.get(created.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        for i in 0..12 {
            service
                .create(NewUser {
                    username: format!("user{i}"),
                    ..alice()
                })
                .await
                .unwrap();
        }

        let page = service.list(PaginationParams::new(2, 5)).await.unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.list.len(), 5);
        assert_eq!(page.list[0].username, "user5");

        let last = service.list(PaginationParams::new(3, 5)).await.unwrap();
        assert_eq!(last.list.len(), 2);
    }

    #[tokio::test]
    async fn test_profile_lists_permission_codes() {
        let db = database().await;
        let service = UserService::new(db.pool().clone());
        let seed = SeedData {
            admin_username: "admin".into(),
            admin_password_hash: PasswordHasher::new().hash("admin123").unwrap(),
        };
        seed_defaults(db.pool(), &seed).await.unwrap();

        let admin = service.authenticate("admin", "admin123").await.unwrap();
        let profile = service.profile(admin.id).await.unwrap();

        assert_eq!(profile.user.role.map(|r| r.code), Some("admin".to_string()));
        assert_eq!(profile.permissions.len(), 15);

        let plain = service.create(alice()).await.unwrap();
        assert!(service.profile(plain.id).await.unwrap().permissions.is_empty());
    }
}
