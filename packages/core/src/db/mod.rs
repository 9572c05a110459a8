//! Database Layer
//!
//! This module handles all database interactions using libsql/Turso:
//!
//! - Connection management and schema initialization
//! - The `EntityStore` trait abstracting persistence from business logic
//! - `SqliteStore`, the libsql-backed implementation
//!
//! # Architecture
//!
//! The dashboard uses an embedded SQLite-compatible database. WAL mode gives
//! multiple readers alongside a writer, foreign keys enforce the cascade
//! rules of the data model, and the whole mindmap graph is replaced inside a
//! single transaction on every synchronization pass.

mod database;
mod entity_store;
mod error;
mod sqlite_store;


pub use database::DatabaseService;
pub use entity_store::{EntityCounts, EntityStore};
pub use error::DatabaseError;
pub use sqlite_store::SqliteStore;
