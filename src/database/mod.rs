// Database module
// SQLite-backed credential store and document history log

pub mod sqlite;

pub use sqlite::Database;
