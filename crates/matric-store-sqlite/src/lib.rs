//! SQLite backend for the matric admission store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Multi-row writes run inside
//! a single SQLite transaction; SQLite's single-writer discipline is what
//! serializes a freeze-time completeness check against concurrent uploads.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;
