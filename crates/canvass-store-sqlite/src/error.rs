//! Error type for `canvass-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level failure (not found, duplicate, conflict, …).
  #[error("core error: {0}")]
  Core(#[from] canvass_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored value that cannot be decoded (bad timestamp, unknown
  /// discriminant).
  #[error("decode error: {0}")]
  Decode(String),
}

/// Collapse into the core taxonomy for callers (the HTTP layer maps the core
/// variants onto status codes). Database-level failures become `Storage`.
impl From<Error> for canvass_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(c) => c,
      Error::Json(e) => canvass_core::Error::Serialization(e),
      other => canvass_core::Error::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
