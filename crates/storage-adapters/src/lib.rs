//! # storage-adapters
//!
//! Persistence implementations of the `domains` repository ports.
//! The SQLite adapter is compiled with the `db-sqlite` feature (on by default).

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
