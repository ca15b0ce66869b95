
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::database::sqlite::models::User;
use crate::{DocqaError, Result};

/// Access level of an account. Stored as lowercase TEXT in the credential
/// store; authorization checks go through [`Session::require`] rather than
/// ad-hoc comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl std::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Role::Admin => write!(f, "Admin"),
            Role::Employee => write!(f, "Employee"),
        }
    }
}

/// An authenticated session, created at login and dropped at the end of the
/// invocation. Passed explicitly into every operation that needs gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

impl Session {
    /// Check that this session is allowed to act at the given level.
    /// Admin satisfies every requirement.
    #[inline]
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == Role::Admin || self.role == role {
            Ok(())
        } else {
            warn!(
                "User {} ({}) denied access requiring {}",
                self.username, self.role, role
            );
            Err(DocqaError::Auth(format!(
                "Requires {} access, but {} is {}",
                role, self.username, self.role
            )))
        }
    }
}

/// Hash a password with argon2 and a per-user random salt, producing a
/// PHC-format string.
#[inline]
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DocqaError::Auth(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
#[inline]
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| DocqaError::Auth(format!("Stored password hash is invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Register a new account.
///
/// Bootstrap policy: the first account ever registered becomes Admin;
/// every later account is Employee. The role decision and the insert run
/// in one transaction, so concurrent registrations cannot both claim the
/// Admin slot.
#[inline]
pub async fn register(database: &Database, username: &str, password: &str) -> Result<User> {
    if username.trim().is_empty() {
        return Err(DocqaError::Auth("Username cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(DocqaError::Auth("Password cannot be empty".to_string()));
    }

    let existing = database
        .get_user_by_username(username)
        .await
        .map_err(|e| DocqaError::Database(e.to_string()))?;
    if existing.is_some() {
        return Err(DocqaError::Auth(format!(
            "Username '{}' is already taken",
            username
        )));
    }

    let password_hash = hash_password(password)?;
    let user = database
        .create_user(username, &password_hash)
        .await
        .map_err(|e| DocqaError::Database(e.to_string()))?;

    info!("Registered user {} with role {}", user.username, user.role);
    Ok(user)
}

/// Verify credentials and open a session.
///
/// An unknown username and a wrong password fail identically; both are
/// terminal for the attempt, never retried.
#[inline]
pub async fn authenticate(database: &Database, username: &str, password: &str) -> Result<Session> {
    let user = database
        .get_user_by_username(username)
        .await
        .map_err(|e| DocqaError::Database(e.to_string()))?;

    let Some(user) = user else {
        return Err(DocqaError::Auth(
            "Invalid username or password".to_string(),
        ));
    };

    if !verify_password(password, &user.password_hash)? {
        return Err(DocqaError::Auth(
            "Invalid username or password".to_string(),
        ));
    }

    info!("User {} logged in as {}", user.username, user.role);

    Ok(Session {
        id: Uuid::new_v4(),
        username: user.username,
        role: user.role,
        created_at: chrono::Utc::now().naive_utc(),
    })
}
