// Database module
// SQLite holds both portfolio content and the denormalized knowledge base

pub mod sqlite;

pub use sqlite::*;
