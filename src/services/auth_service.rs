use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};

/// Checked against when the username is unknown, so a miss costs the same
/// Argon2 work as a wrong password. No password verifies against it.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$etn8XUemvOAJl4F3Cisrbw$47IFAFkYGQYkdy6+Gs7+kc4sSwH5yfTmUanXzQOVfbc";

/// Credential store: account creation and password checks.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Uuid> {
        // Fast path only; the unique index decides races.
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        let password_hash = hash_password(password.to_owned()).await?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_owned(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Unknown usernames and wrong passwords fail identically.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.users.find_by_username(username).await? else {
            verify_password(password.to_owned(), DUMMY_PASSWORD_HASH.to_owned()).await?;
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password.to_owned(), user.password_hash.clone()).await? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Argon2id with a random per-password salt, run on the blocking pool.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
}

pub async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Password verification failed: {}",
                e
            ))),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?
}
