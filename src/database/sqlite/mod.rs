use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::auth::Role;
use crate::database::sqlite::models::{DocumentLogEntry, NewDocumentLogEntry, User};
use crate::database::sqlite::queries::{DocumentLogQueries, UserQueries};


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS document_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        username TEXT NOT NULL,
        role TEXT NOT NULL,
        logged_at TIMESTAMP NOT NULL
    )",
];

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options: SqliteConnectOptions = database_url
            .parse::<SqliteConnectOptions>()
            .context("Invalid database URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("metadata.db");

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_path.to_string_lossy().as_ref()).await
    }

    // User operations
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserQueries::get_by_username(&self.pool, username).await
    }

    /// Create a user, assigning Admin to the very first account and
    /// Employee to everyone after. Runs inside a transaction so concurrent
    /// registrations cannot both claim the bootstrap Admin slot.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        UserQueries::create_with_bootstrap_role(&self.pool, username, password_hash).await
    }

    pub async fn count_users(&self) -> Result<i64> {
        UserQueries::count(&self.pool).await
    }

    // Document log operations
    pub async fn insert_document_log(&self, entry: &NewDocumentLogEntry) -> Result<DocumentLogEntry> {
        DocumentLogQueries::create(&self.pool, entry.clone()).await
    }

    pub async fn list_document_log(&self) -> Result<Vec<DocumentLogEntry>> {
        DocumentLogQueries::list_all(&self.pool).await
    }

    pub async fn list_document_log_for_role(&self, role: Role) -> Result<Vec<DocumentLogEntry>> {
        DocumentLogQueries::list_by_role(&self.pool, role).await
    }
}
