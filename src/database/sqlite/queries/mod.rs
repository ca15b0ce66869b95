#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{DocumentLogEntry, NewDocumentLogEntry, User};
use crate::auth::Role;

pub struct UserQueries;

impl UserQueries {
    /// Insert a user, assigning the role inside a single transaction:
    /// the first account ever created becomes Admin, every later account
    /// is Employee. The transaction serializes concurrent registrations.
    #[inline]
    pub async fn create_with_bootstrap_role(
        pool: &SqlitePool,
        username: &str,
        password_hash: &str,
    ) -> Result<User> {
        let mut tx = pool
            .begin()
            .await
            .context("Failed to begin registration transaction")?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count users")?;

        let role = if existing == 0 {
            Role::Admin
        } else {
            Role::Employee
        };

        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create user")?
        .last_insert_rowid();

        tx.commit()
            .await
            .context("Failed to commit registration transaction")?;

        debug!("Created user {} with role {}", username, role);

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

        Ok(result)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .context("Failed to count users")?;

        Ok(count)
    }
}

pub struct DocumentLogQueries;

impl DocumentLogQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, entry: NewDocumentLogEntry) -> Result<DocumentLogEntry> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO document_log (filename, username, role, logged_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.filename)
        .bind(&entry.username)
        .bind(entry.role)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create document log entry")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created log entry"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DocumentLogEntry>> {
        let result = sqlx::query_as::<_, DocumentLogEntry>(
            "SELECT id, filename, username, role, logged_at FROM document_log WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get log entry by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DocumentLogEntry>> {
        let result = sqlx::query_as::<_, DocumentLogEntry>(
            "SELECT id, filename, username, role, logged_at FROM document_log ORDER BY logged_at, id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list document log")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_by_role(pool: &SqlitePool, role: Role) -> Result<Vec<DocumentLogEntry>> {
        let result = sqlx::query_as::<_, DocumentLogEntry>(
            "SELECT id, filename, username, role, logged_at FROM document_log WHERE role = ? ORDER BY logged_at, id",
        )
        .bind(role)
        .fetch_all(pool)
        .await
        .context("Failed to list document log by role")?;

        Ok(result)
    }
}
