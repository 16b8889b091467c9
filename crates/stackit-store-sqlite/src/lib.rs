//! SQLite backend for StackIt.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every statement goes through that one
//! connection, so writes are serialized; vote writes additionally carry a
//! per-row version check.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
