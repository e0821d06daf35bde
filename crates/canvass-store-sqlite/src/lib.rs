//! SQLite backend for the Canvass reconciliation engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-step operation — the
//! capture pipeline, rename cascades, soft deletion — executes inside a
//! single `rusqlite` transaction; a domain failure drops the transaction and
//! rolls everything back.

mod archive;
mod cascade;
mod encode;
mod recon;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
