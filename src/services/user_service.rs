use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthUser, PasswordHasher};
use crate::database::models::{PopulatedUser, User, UserChanges, UserProfile};
use crate::database::{CatalogStore, Store, UserStore};
use crate::error::ApiError;
use crate::types::{FavoriteKind, Role};

use super::validation::{non_blank, normalize_email, validate_email, validate_username};

/// Self-service profile fields
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Fields an admin may change on any account
#[derive(Debug, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Resolves the favorite id sets into full records, skipping ids whose target is gone.
pub(crate) async fn populate(store: &dyn Store, user: &User) -> Result<PopulatedUser, ApiError> {
    let (albums, artists) = futures::try_join!(
        store.albums_by_ids(&user.favorite_albums),
        store.artists_by_ids(&user.favorite_artists),
    )?;
    Ok(PopulatedUser::new(user, albums, artists))
}

/// Uniqueness pre-check for username and email. `exclude` is the record being updated.
pub(crate) async fn ensure_available(
    store: &dyn Store,
    exclude: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(email) = email {
        if let Some(existing) = store.user_by_email(email).await? {
            if Some(existing.id) != exclude {
                return Err(ApiError::EmailExists);
            }
        }
    }
    if let Some(username) = username {
        if let Some(existing) = store.user_by_username(username).await? {
            if Some(existing.id) != exclude {
                return Err(ApiError::UsernameExists);
            }
        }
    }
    Ok(())
}

/// Validated, normalized identity fields shared by the profile and admin updates.
fn identity_changes(username: Option<String>, email: Option<String>) -> Result<(Option<String>, Option<String>), ApiError> {
    let username = non_blank("username", username)?;
    if let Some(username) = &username {
        validate_username(username)?;
    }

    let email = non_blank("email", email)?.map(|e| normalize_email(&e));
    if let Some(email) = &email {
        validate_email(email)?;
    }
    Ok((username, email))
}

pub struct UserService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    async fn find(&self, id: Uuid) -> Result<User, ApiError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Refuses to leave the system without an admin. Check-then-act: the count and the
    /// following write are separate statements, so two concurrent demotions can both pass.
    async fn ensure_not_last_admin(&self, target: &User) -> Result<(), ApiError> {
        if target.role != Role::Admin {
            return Ok(());
        }
        if self.store.count_admins().await? <= 1 {
            warn!(user_id = %target.id, "Refused to remove the last admin");
            return Err(ApiError::LastAdminViolation);
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, ApiError> {
        let users = self.store.list_users().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn get(&self, caller: AuthUser, id: Uuid) -> Result<PopulatedUser, ApiError> {
        caller.require_self_or_admin(id)?;
        let user = self.find(id).await?;
        populate(self.store.as_ref(), &user).await
    }

    pub async fn update_profile(
        &self,
        caller: AuthUser,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<PopulatedUser, ApiError> {
        caller.require_self_or_admin(id)?;
        let (username, email) = identity_changes(update.username, update.email)?;
        let avatar = update.avatar.map(|a| a.trim().to_string());

        self.find(id).await?;
        ensure_available(self.store.as_ref(), Some(id), username.as_deref(), email.as_deref()).await?;

        let changes = UserChanges {
            username,
            email,
            avatar,
            ..Default::default()
        };
        let user = if changes.is_empty() {
            self.find(id).await?
        } else {
            self.store
                .update_user(id, changes)
                .await?
                .ok_or_else(|| ApiError::not_found("User not found"))?
        };

        info!(user_id = %id, by = %caller.user_id, "Profile updated");
        populate(self.store.as_ref(), &user).await
    }

    pub async fn change_password(&self, caller: AuthUser, id: Uuid, change: PasswordChange) -> Result<(), ApiError> {
        caller.require_self(id)?;
        let current = change
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("currentPassword"))?;
        let new = change
            .new_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::missing_field("newPassword"))?;

        let user = self.find(id).await?;
        if !self.hasher.verify_blocking(current, user.password_hash).await? {
            warn!(user_id = %id, "Password change refused: wrong current password");
            return Err(ApiError::IncorrectPassword);
        }

        let password_hash = self.hasher.hash_blocking(new).await?;
        self.store
            .update_user(
                id,
                UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    pub async fn admin_update(
        &self,
        caller: AuthUser,
        id: Uuid,
        update: AdminUserUpdate,
    ) -> Result<UserProfile, ApiError> {
        caller.require_admin()?;

        let role = match non_blank("role", update.role)? {
            Some(raw) => Some(
                raw.parse::<Role>()
                    .map_err(|_| ApiError::invalid_field("role", format!("Unknown role '{}'", raw)))?,
            ),
            None => None,
        };
        let (username, email) = identity_changes(update.username, update.email)?;

        let target = self.find(id).await?;
        if let Some(role) = role {
            if role != target.role {
                if caller.is_self(id) {
                    warn!(user_id = %id, "Refused self role change");
                    return Err(ApiError::self_modification("You cannot change your own role"));
                }
                if role == Role::User {
                    self.ensure_not_last_admin(&target).await?;
                }
            }
        }
        ensure_available(self.store.as_ref(), Some(id), username.as_deref(), email.as_deref()).await?;

        let password_hash = match update.password.filter(|p| !p.trim().is_empty()) {
            Some(password) => Some(self.hasher.hash_blocking(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username,
            email,
            password_hash,
            role,
            ..Default::default()
        };
        let user = if changes.is_empty() {
            target
        } else {
            self.store
                .update_user(id, changes)
                .await?
                .ok_or_else(|| ApiError::not_found("User not found"))?
        };

        info!(user_id = %id, by = %caller.user_id, role = %user.role, "User updated by admin");
        Ok(UserProfile::from(&user))
    }

    pub async fn delete(&self, caller: AuthUser, id: Uuid) -> Result<(), ApiError> {
        caller.require_admin()?;
        if caller.is_self(id) {
            warn!(user_id = %id, "Refused self delete");
            return Err(ApiError::self_modification("You cannot delete your own account"));
        }

        let target = self.find(id).await?;
        self.ensure_not_last_admin(&target).await?;

        if !self.store.delete_user(id).await? {
            return Err(ApiError::not_found("User not found"));
        }
        info!(user_id = %id, by = %caller.user_id, "User deleted");
        Ok(())
    }

    /// Idempotent set union. The referenced album or artist must exist.
    pub async fn add_favorite(
        &self,
        caller: AuthUser,
        user_id: Uuid,
        kind: FavoriteKind,
        item_id: Uuid,
    ) -> Result<PopulatedUser, ApiError> {
        caller.require_self(user_id)?;

        let exists = match kind {
            FavoriteKind::Album => self.store.album_by_id(item_id).await?.is_some(),
            FavoriteKind::Artist => self.store.artist_by_id(item_id).await?.is_some(),
        };
        if !exists {
            return Err(ApiError::not_found(match kind {
                FavoriteKind::Album => "Album not found",
                FavoriteKind::Artist => "Artist not found",
            }));
        }

        let user = self
            .store
            .add_favorite(user_id, kind, item_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        populate(self.store.as_ref(), &user).await
    }

    /// Idempotent set difference; removing an absent id is not an error.
    pub async fn remove_favorite(
        &self,
        caller: AuthUser,
        user_id: Uuid,
        kind: FavoriteKind,
        item_id: Uuid,
    ) -> Result<PopulatedUser, ApiError> {
        caller.require_self(user_id)?;
        let user = self
            .store
            .remove_favorite(user_id, kind, item_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        populate(self.store.as_ref(), &user).await
    }

    /// Grants the admin role by email. Used by the admin CLI.
    pub async fn promote(&self, email: &str) -> Result<UserProfile, ApiError> {
        let email = normalize_email(email);
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let user = self
            .store
            .update_user(
                user.id,
                UserChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        info!(user_id = %user.id, "Promoted to admin");
        Ok(UserProfile::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_album, seed_artist, seed_user, test_state, TEST_PASSWORD};

    fn as_caller(user: &User) -> AuthUser {
        AuthUser::new(user.id, user.role)
    }

    #[tokio::test]
    async fn sole_admin_cannot_delete_themself() {
        let state = test_state();
        let admin = seed_user(&state, "root", Role::Admin).await;

        let err = state.users().delete(as_caller(&admin), admin.id).await.unwrap_err();
        assert_eq!(err.error_code(), "SELF_MODIFICATION_FORBIDDEN");
        assert_eq!(state.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn last_admin_cannot_be_deleted_or_demoted() {
        let state = test_state();
        let admin = seed_user(&state, "root", Role::Admin).await;
        // A token issued before the caller lost their admin role still carries `admin`.
        let stale = AuthUser::new(Uuid::new_v4(), Role::Admin);

        let err = state.users().delete(stale, admin.id).await.unwrap_err();
        assert_eq!(err.error_code(), "LAST_ADMIN_VIOLATION");

        let demote = AdminUserUpdate {
            role: Some("user".to_string()),
            ..Default::default()
        };
        let err = state.users().admin_update(stale, admin.id, demote).await.unwrap_err();
        assert_eq!(err.error_code(), "LAST_ADMIN_VIOLATION");

        assert_eq!(state.store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn one_of_two_admins_can_be_demoted() {
        let state = test_state();
        let first = seed_user(&state, "first", Role::Admin).await;
        let second = seed_user(&state, "second", Role::Admin).await;

        let demote = AdminUserUpdate {
            role: Some("user".to_string()),
            ..Default::default()
        };
        let profile = state
            .users()
            .admin_update(as_caller(&first), second.id, demote)
            .await
            .unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(state.store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn admin_cannot_change_own_role_but_may_resend_it() {
        let state = test_state();
        let admin = seed_user(&state, "root", Role::Admin).await;
        seed_user(&state, "deputy", Role::Admin).await;

        let same = AdminUserUpdate {
            role: Some("admin".to_string()),
            ..Default::default()
        };
        assert!(state.users().admin_update(as_caller(&admin), admin.id, same).await.is_ok());

        let demote = AdminUserUpdate {
            role: Some("user".to_string()),
            ..Default::default()
        };
        let err = state
            .users()
            .admin_update(as_caller(&admin), admin.id, demote)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SELF_MODIFICATION_FORBIDDEN");
    }

    #[tokio::test]
    async fn admin_update_rejects_unknown_roles_and_taken_names() {
        let state = test_state();
        let admin = seed_user(&state, "root", Role::Admin).await;
        let user = seed_user(&state, "listener", Role::User).await;
        seed_user(&state, "taken", Role::User).await;

        let err = state
            .users()
            .admin_update(
                as_caller(&admin),
                user.id,
                AdminUserUpdate {
                    role: Some("superuser".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = state
            .users()
            .admin_update(
                as_caller(&admin),
                user.id,
                AdminUserUpdate {
                    username: Some("taken".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "USERNAME_EXISTS");
    }

    #[tokio::test]
    async fn profile_update_checks_uniqueness_excluding_self() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let other = seed_user(&state, "other", Role::User).await;
        let users = state.users();

        let kept = users
            .update_profile(
                as_caller(&user),
                user.id,
                ProfileUpdate {
                    username: Some("listener".to_string()),
                    email: Some(user.email.to_uppercase()),
                    avatar: Some("https://img.example.com/me.png".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.avatar, "https://img.example.com/me.png");

        let err = users
            .update_profile(
                as_caller(&user),
                user.id,
                ProfileUpdate {
                    email: Some(other.email.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EMAIL_EXISTS");

        let err = users
            .update_profile(as_caller(&other), user.id, ProfileUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn password_change_requires_the_current_password() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let users = state.users();

        let err = users
            .change_password(
                as_caller(&user),
                user.id,
                PasswordChange {
                    current_password: Some("guess".to_string()),
                    new_password: Some("new secret".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INCORRECT_PASSWORD");

        users
            .change_password(
                as_caller(&user),
                user.id,
                PasswordChange {
                    current_password: Some(TEST_PASSWORD.to_string()),
                    new_password: Some("new secret".to_string()),
                },
            )
            .await
            .unwrap();

        let stored = state.store.user_by_id(user.id).await.unwrap().unwrap();
        assert!(state.hasher.verify("new secret", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn favorites_are_idempotent_sets() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let artist = seed_artist(&state, "Massive Attack").await;
        let album = seed_album(&state, artist.id, "Mezzanine").await;
        let users = state.users();
        let me = as_caller(&user);

        users.add_favorite(me, user.id, FavoriteKind::Album, album.id).await.unwrap();
        let populated = users.add_favorite(me, user.id, FavoriteKind::Album, album.id).await.unwrap();
        assert_eq!(populated.favorite_albums.len(), 1);
        assert_eq!(populated.favorite_albums[0].title, "Mezzanine");

        let populated = users
            .remove_favorite(me, user.id, FavoriteKind::Artist, artist.id)
            .await
            .unwrap();
        assert!(populated.favorite_artists.is_empty());
        assert_eq!(populated.favorite_albums.len(), 1);

        let err = users
            .add_favorite(me, user.id, FavoriteKind::Artist, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn favorites_are_self_only_even_for_admins() {
        let state = test_state();
        let admin = seed_user(&state, "root", Role::Admin).await;
        let user = seed_user(&state, "listener", Role::User).await;
        let artist = seed_artist(&state, "Tricky").await;

        let err = state
            .users()
            .add_favorite(as_caller(&admin), user.id, FavoriteKind::Artist, artist.id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn deleted_favorites_are_skipped_when_resolving() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;
        let artist = seed_artist(&state, "Portishead").await;
        let users = state.users();

        users
            .add_favorite(as_caller(&user), user.id, FavoriteKind::Artist, artist.id)
            .await
            .unwrap();
        state.store.delete_artist(artist.id).await.unwrap();

        let populated = users.get(as_caller(&user), user.id).await.unwrap();
        assert!(populated.favorite_artists.is_empty());
    }

    #[tokio::test]
    async fn promote_grants_admin() {
        let state = test_state();
        let user = seed_user(&state, "listener", Role::User).await;

        let profile = state.users().promote(&user.email.to_uppercase()).await.unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(state.users().promote("ghost@example.com").await.is_err());
    }
}
