// Database module
// Local SQLite persistence: saved decisions, query logs and the single-table vector store

pub mod sqlite;

pub use sqlite::*;
