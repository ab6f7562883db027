use crate::clock::SharedClock;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::User;
use crate::repositories::{ApiTokenRepository, UserRepository};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

const TOKEN_BYTES: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;

/// A freshly issued bearer token with its owner
///
/// The plaintext token exists only here; at rest the database holds its
/// SHA-256 digest.
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

/// Token-based authentication over argon2 password hashes
pub struct AuthService {
    users: Arc<UserRepository>,
    tokens: Arc<ApiTokenRepository>,
    clock: SharedClock,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<UserRepository>,
        tokens: Arc<ApiTokenRepository>,
        clock: SharedClock,
    ) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    /// Create a user account with a hashed password
    pub async fn register(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();

        if !email.contains('@') {
            return Err(AppError::Validation("A valid email is required.".to_string()));
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LENGTH
            )));
        }

        let hash = hash_password(password)?;
        let user = self
            .users
            .create(&email, &hash, self.clock.now().naive_utc())
            .await
            .map_err(|err| AppError::from(RepositoryError::from(err)))?;

        info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<IssuedToken> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
        };

        if !verify_password(password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
        }

        let token = generate_token();
        self.tokens
            .create(&user.id, &digest(&token), self.clock.now().naive_utc())
            .await?;

        info!(user = %user.id, "user logged in");
        Ok(IssuedToken { token, user })
    }

    /// Resolve a bearer token to its user, stamping last use
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let Some(record) = self.tokens.find_by_hash(&digest(token)).await? else {
            return Err(AppError::Unauthorized("Invalid token.".to_string()));
        };

        self.tokens
            .touch_last_used(&record.id, self.clock.now().naive_utc())
            .await?;

        self.users
            .find_by_id(&record.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token.".to_string()))
    }

    /// Revoke one of a user's tokens
    pub async fn revoke(&self, user_id: &str, token: &str) -> AppResult<bool> {
        Ok(self.tokens.revoke(user_id, &digest(token)).await?)
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Message(format!("Unable to hash password: {}", err)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
