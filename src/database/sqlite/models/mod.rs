
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::Role;

/// A credential-store row. `password_hash` is a PHC-format argon2 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

/// One row of the document history log, appended whenever a document is
/// summarized through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentLogEntry {
    pub id: i64,
    pub filename: String,
    pub username: String,
    pub role: Role,
    pub logged_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentLogEntry {
    pub filename: String,
    pub username: String,
    pub role: Role,
}
