//! SQLite backend for the szallitas transit store.
//!
//! Wraps a single [`rusqlite::Connection`]. The GTFS engine is synchronous,
//! so the store is too; callers on an async runtime run it on a blocking
//! thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
