//! Authentication for dashboard users
//!
//! Any stored user may log in; routes that need an administrator check
//! `User::is_admin` on each request.

pub mod password;
pub mod token;

pub use token::{Claims, TokenSigner, INVALID_CREDENTIALS, MAX_TOKEN_TTL_MINUTES};

use crate::config::AppConfig;
use crate::error::{FeedbackError, Result};
use crate::storage::ReportStorage;
use crate::types::{AccessToken, User, UserCreate};
use std::sync::Arc;
use tracing::{info, warn};

/// Password checks, user registration and token handling
pub struct Authenticator {
    storage: Arc<dyn ReportStorage>,
    signer: TokenSigner,
    bcrypt_cost: u32,
}

impl Authenticator {
    pub fn new(storage: Arc<dyn ReportStorage>, signer: TokenSigner, bcrypt_cost: u32) -> Self {
        Self {
            storage,
            signer,
            bcrypt_cost,
        }
    }

    pub fn from_config(storage: Arc<dyn ReportStorage>, config: &AppConfig) -> Result<Self> {
        let signer = TokenSigner::new(config.signing_key(), config.access_token_expire_minutes)?;
        Ok(Self::new(storage, signer, config.bcrypt_cost))
    }

    pub async fn hash_password(&self, plain: &str) -> Result<String> {
        password::hash_password(plain, self.bcrypt_cost).await
    }

    /// Check a username/password pair
    ///
    /// Unknown users and wrong passwords yield `Ok(None)`; a malformed stored
    /// hash is an error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.storage.get_user(username).await? else {
            warn!("Login failed: unknown user '{}'", username);
            return Ok(None);
        };

        if !password::verify_password(password, &user.password_hash).await? {
            warn!("Login failed: wrong password for user '{}'", username);
            return Ok(None);
        }

        info!("User '{}' authenticated", username);
        Ok(Some(user))
    }

    pub fn issue_token(&self, username: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            access_token: self.signer.issue(username)?,
            token_type: "bearer".to_string(),
        })
    }

    /// Validate a bearer token and return its subject
    pub fn verify_token(&self, token: &str) -> Result<String> {
        self.signer.verify(token).map(|claims| claims.sub)
    }

    /// Hash the password and store a new user
    pub async fn register(&self, user: &UserCreate) -> Result<User> {
        if user.username.trim().is_empty() {
            return Err(FeedbackError::Validation(
                "Username must not be empty".to_string(),
            ));
        }
        if user.password.is_empty() {
            return Err(FeedbackError::Validation(
                "Password must not be empty".to_string(),
            ));
        }

        let hash = self.hash_password(&user.password).await?;
        let created = self.storage.create_user(user, &hash).await?;
        info!(
            "Created user '{}' (admin: {})",
            created.username, created.is_admin
        );
        Ok(created)
    }
}
