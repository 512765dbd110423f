//! Authentication service
//!
//! Registration and login. Both hand back a freshly minted bearer token;
//! there is no server-side session.
//!
//! Username uniqueness is a check-then-insert. Two concurrent registrations
//! of the same name can both pass the check; the store's UNIQUE index then
//! fails the second insert, which surfaces as an internal error.

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::password::{check_password, hash_password};
use crate::services::token::{TokenError, TokenService};
use anyhow::Context;
use std::sync::Arc;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing username or password
    #[error("Validation error: {0}")]
    Validation(String),

    /// Username already registered
    #[error("User already exists")]
    Conflict,

    /// Unknown user or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::Internal(anyhow::Error::new(e).context("Failed to issue token"))
    }
}

/// Input for registration and login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Registers users and issues tokens
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { user_repo, tokens }
    }

    /// Register a new user and return a token for them.
    ///
    /// # Errors
    ///
    /// - `Validation` if username or password is empty
    /// - `Conflict` if the username is taken
    /// - `Internal` for store or hashing failures
    pub async fn register(&self, input: Credentials) -> Result<String, AuthError> {
        validate_credentials(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            tracing::debug!(username = %input.username, "Registration rejected: username taken");
            return Err(AuthError::Conflict);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = self
            .user_repo
            .create(&User::new(input.username, password_hash))
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        Ok(self.tokens.issue(user.id)?)
    }

    /// Check credentials and return a fresh token.
    ///
    /// An unknown username and a wrong password produce the same
    /// `InvalidCredentials` error.
    pub async fn login(&self, input: Credentials) -> Result<String, AuthError> {
        let user = self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to look up user")?;

        let valid = check_password(
            &input.password,
            user.as_ref().map(|u| u.password_hash.as_str()),
        )
        .context("Failed to verify password")?;

        let user = match user {
            Some(user) if valid => user,
            _ => {
                tracing::debug!(username = %input.username, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        tracing::info!(user_id = user.id, "User logged in");

        Ok(self.tokens.issue(user.id)?)
    }
}

fn validate_credentials(input: &Credentials) -> Result<(), AuthError> {
    if input.username.trim().is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }
    if input.password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::verify_password;
    use std::time::{Duration, Instant};

    async fn setup_test_service() -> (Arc<dyn UserRepository>, Arc<TokenService>, AuthService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool);
        let tokens = Arc::new(TokenService::new("test-secret", 3600));
        let service = AuthService::new(user_repo.clone(), tokens.clone());
        (user_repo, tokens, service)
    }

    #[tokio::test]
    async fn test_register_returns_token_for_new_user() {
        let (repo, tokens, service) = setup_test_service().await;

        let token = service
            .register(Credentials::new("alice", "password123"))
            .await
            .expect("Failed to register");

        let claims = tokens.verify(&token).expect("Token should verify");
        let stored = repo.get_by_id(claims.id).await.unwrap().expect("User stored");
        assert_eq!(stored.username, "alice");
        assert!(stored.home_location.is_none());
        assert_ne!(stored.password_hash, "password123");
        assert!(verify_password("password123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_username_keeps_original_hash() {
        let (repo, _tokens, service) = setup_test_service().await;

        service
            .register(Credentials::new("alice", "first-password"))
            .await
            .expect("Failed to register first user");
        let original_hash = repo
            .get_by_username("alice")
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        let result = service
            .register(Credentials::new("alice", "second-password"))
            .await;
        assert!(matches!(result, Err(AuthError::Conflict)));

        let after = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(after.password_hash, original_hash);
        assert!(verify_password("first-password", &after.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_username_case_sensitive() {
        let (_repo, _tokens, service) = setup_test_service().await;

        service.register(Credentials::new("Alice", "pw")).await.unwrap();
        service
            .register(Credentials::new("alice", "pw"))
            .await
            .expect("Different case is a different username");
    }

    #[tokio::test]
    async fn test_register_empty_fields_fail() {
        let (_repo, _tokens, service) = setup_test_service().await;

        let result = service.register(Credentials::new("  ", "password")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        let result = service.register(Credentials::new("bob", "")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_success_issues_fresh_token() {
        let (_repo, tokens, service) = setup_test_service().await;
        let registered = service
            .register(Credentials::new("alice", "password123"))
            .await
            .unwrap();

        let token = service
            .login(Credentials::new("alice", "password123"))
            .await
            .expect("Failed to login");

        let registered_claims = tokens.verify(&registered).unwrap();
        let login_claims = tokens.verify(&token).unwrap();
        assert_eq!(login_claims.id, registered_claims.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_repo, _tokens, service) = setup_test_service().await;
        service
            .register(Credentials::new("alice", "password123"))
            .await
            .unwrap();

        let wrong_password = service
            .login(Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        let unknown_user = service
            .login(Credentials::new("nobody", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_login_does_password_work() {
        let (_repo, _tokens, service) = setup_test_service().await;
        service
            .register(Credentials::new("alice", "password123"))
            .await
            .unwrap();

        let started = Instant::now();
        let _ = service.login(Credentials::new("alice", "wrong")).await;
        let wrong_password = started.elapsed();

        let started = Instant::now();
        let _ = service.login(Credentials::new("nobody", "wrong")).await;
        let unknown_user = started.elapsed();

        // Both paths run one Argon2 computation; a lookup alone is far cheaper.
        assert!(
            unknown_user >= wrong_password / 4 || unknown_user >= Duration::from_millis(5),
            "unknown user took {:?}, wrong password took {:?}",
            unknown_user,
            wrong_password
        );
    }
}
