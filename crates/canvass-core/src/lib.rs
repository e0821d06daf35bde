//! Core types and trait definitions for the Canvass reconciliation engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod assignment;
pub mod audit;
pub mod entity;
pub mod error;
pub mod incident;
pub mod report;
pub mod store;
pub mod variant;

pub use error::{Error, Result};
