use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{AuthUser, PasswordHasher, TokenCodec};
use crate::database::models::{NewUser, PopulatedUser, UserSummary};
use crate::database::{Store, UserStore};
use crate::error::ApiError;
use crate::types::Role;

use super::user_service::{ensure_available, populate};
use super::validation::{normalize_email, optional, required, validate_email, validate_username};

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Passwords are taken verbatim; only presence is checked.
fn required_password(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(ApiError::missing_field("password")),
    }
}

/// Account creation, credential checks and token issuance
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenCodec>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenCodec>, hasher: PasswordHasher) -> Self {
        Self { store, tokens, hasher }
    }

    /// Self-registration; always creates a plain user.
    pub async fn signup(&self, request: SignupRequest) -> Result<UserSummary, ApiError> {
        self.register(request, Role::User).await
    }

    /// Creates an account with an explicit role. Only reachable from the admin CLI.
    pub async fn register(&self, request: SignupRequest, role: Role) -> Result<UserSummary, ApiError> {
        let username = required("username", request.username)?;
        let email = normalize_email(&required("email", request.email)?);
        let password = required_password(request.password)?;
        let avatar = optional(request.avatar).unwrap_or_default();

        validate_username(&username)?;
        validate_email(&email)?;
        ensure_available(self.store.as_ref(), None, Some(&username), Some(&email)).await?;

        let password_hash = self.hasher.hash_blocking(password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                avatar,
                role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "Account created for {}", user.username);
        Ok(UserSummary::from(&user))
    }

    /// Both failure modes return the same error so callers cannot probe for accounts.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let email = normalize_email(&required("email", request.email)?);
        let password = required_password(request.password)?;

        let Some(user) = self.store.user_by_email(&email).await? else {
            self.hasher.verify_decoy_blocking(password).await?;
            warn!("Login failed: unknown account");
            return Err(ApiError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify_blocking(password, user.password_hash.clone())
            .await?;
        if !valid {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, user.role)?;
        info!(user_id = %user.id, "Login succeeded");
        Ok(LoginResponse {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// The caller's own record with favorites resolved.
    pub async fn current_user(&self, caller: AuthUser) -> Result<PopulatedUser, ApiError> {
        let user = self
            .store
            .user_by_id(caller.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        populate(self.store.as_ref(), &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::database::MemoryStore;
    use crate::state::AppState;
    use crate::testing::{seed_user, test_config, test_state, TEST_PASSWORD};

    fn signup_request(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some("correct horse".to_string()),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn signup_then_login_yields_a_verifiable_token() {
        let state = test_state();
        let accounts = state.accounts();

        let created = accounts
            .signup(signup_request("aphex", "  Aphex@Warp.NET "))
            .await
            .unwrap();
        assert_eq!(created.role, Role::User);

        let stored = state.store.user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "aphex@warp.net");
        assert_ne!(stored.password_hash, "correct horse");

        let session = accounts
            .login(LoginRequest {
                email: Some("APHEX@warp.net".to_string()),
                password: Some("correct horse".to_string()),
            })
            .await
            .unwrap();
        let claims = state.tokens.verify(&session.token).unwrap();
        assert_eq!(claims.sub, created.id);
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn signup_rejects_missing_fields_and_duplicates() {
        let state = test_state();
        let accounts = state.accounts();

        let err = accounts
            .signup(SignupRequest {
                username: Some("boards".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");

        accounts.signup(signup_request("boards", "boc@warp.net")).await.unwrap();

        let err = accounts
            .signup(signup_request("canada", "BOC@warp.net"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EMAIL_EXISTS");

        let err = accounts
            .signup(signup_request("boards", "other@warp.net"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "USERNAME_EXISTS");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = test_state();
        let user = seed_user(&state, "autechre", Role::User).await;
        let accounts = state.accounts();

        let wrong_password = accounts
            .login(LoginRequest {
                email: Some(user.email.clone()),
                password: Some("not it".to_string()),
            })
            .await
            .unwrap_err();
        let unknown_account = accounts
            .login(LoginRequest {
                email: Some("nobody@warp.net".to_string()),
                password: Some(TEST_PASSWORD.to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status_code(), unknown_account.status_code());
        assert_eq!(wrong_password.to_json(), unknown_account.to_json());
        assert_eq!(wrong_password.error_code(), "INVALID_CREDENTIALS");
    }

    async fn failed_login(accounts: &AccountService, email: &str) -> Duration {
        let started = Instant::now();
        let err = accounts
            .login(LoginRequest {
                email: Some(email.to_string()),
                password: Some("not it".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
        started.elapsed()
    }

    #[tokio::test]
    async fn unknown_accounts_cost_as_much_as_wrong_passwords() {
        let mut config = test_config();
        config.security.password_hash_memory_kib = 4096;
        config.security.password_hash_iterations = 4;
        let state = AppState::new(config, Arc::new(MemoryStore::new())).unwrap();
        let user = seed_user(&state, "plaid", Role::User).await;
        let accounts = state.accounts();

        let mut wrong_password = Duration::ZERO;
        let mut unknown_account = Duration::ZERO;
        for _ in 0..3 {
            wrong_password += failed_login(&accounts, &user.email).await;
            unknown_account += failed_login(&accounts, "nobody@warp.net").await;
        }

        assert!(
            unknown_account * 5 > wrong_password,
            "unknown {:?} vs wrong password {:?}",
            unknown_account,
            wrong_password
        );
    }

    #[tokio::test]
    async fn current_user_resolves_favorites() {
        let state = test_state();
        let user = seed_user(&state, "squarepusher", Role::User).await;
        let me = state
            .accounts()
            .current_user(AuthUser::new(user.id, Role::User))
            .await
            .unwrap();
        assert_eq!(me.id, user.id);
        assert!(me.favorite_albums.is_empty());
    }
}
